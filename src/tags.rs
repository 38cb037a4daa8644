//! Tag management: per-note tag edits and the global tag vocabulary.
use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use crate::{normalize_tag, Note, NotePatch, NoteStore, Persistence};

impl<P: Persistence> NoteStore<P> {
    /// Appends a tag to a note. Blank tags, tags the note already carries
    /// (exact, case-sensitive match) and unknown ids are no-ops.
    pub fn add_tag(&mut self, id: &str, tag: &str) -> bool {
        let Some(tag) = normalize_tag(tag) else {
            debug!("Ignoring blank tag for note {}", id);
            return false;
        };
        let Some(note) = self.get(id) else {
            return false;
        };
        if note.tags.contains(&tag) {
            return false;
        }

        let mut tags = note.tags.clone();
        tags.push(tag);
        self.update(id, NotePatch::new().tags(tags))
    }

    /// Removes an exact tag from a note. No-op if the note does not carry it.
    pub fn remove_tag(&mut self, id: &str, tag: &str) -> bool {
        let Some(note) = self.get(id) else {
            return false;
        };
        if !note.tags.iter().any(|t| t == tag) {
            return false;
        }

        let tags: Vec<String> = note.tags.iter().filter(|t| *t != tag).cloned().collect();
        self.update(id, NotePatch::new().tags(tags))
    }

    pub fn vocabulary(&self) -> BTreeSet<String> {
        vocabulary(self.notes())
    }
}

/// Every tag used by any note, archived and trashed ones included, sorted and
/// without duplicates.
pub fn vocabulary(notes: &[Note]) -> BTreeSet<String> {
    notes
        .iter()
        .flat_map(|note| note.tags.iter().cloned())
        .collect()
}

/// How many notes carry each tag.
pub fn tag_counts(notes: &[Note]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for tag in notes.iter().flat_map(|note| note.tags.iter()) {
        *counts.entry(tag.clone()).or_insert(0) += 1;
    }
    counts
}
