//! The canonical note collection and every operation that mutates it.
//!
//! `NoteStore` exclusively owns the notes and the current selection. Edits
//! go through [`NoteStore::update`], which refreshes `updated_at` and arms
//! the autosave scheduler; structural changes (create, purge, replace-all)
//! are written through to the persistence slot immediately.
use std::collections::HashSet;

use chrono::Utc;
use log::{debug, error, info, trace, warn};
use tokio::time::Instant;

use crate::{
    derive_view, export_notes, import_notes, new_id, AutosaveScheduler, Config, ImportReport,
    Note, NotePatch, Persistence, Result, SaveStatus, ViewConfig,
};

pub struct NoteStore<P: Persistence> {
    /// The slot the collection is written to
    persistence: P,

    /// Canonical collection, most recently created first
    notes: Vec<Note>,

    /// Id of the note the caller is working on, if any
    selected: Option<String>,

    autosave: AutosaveScheduler,

    /// Color token for new notes
    default_color: String,
}

impl<P: Persistence> NoteStore<P> {
    /// Opens a store over `persistence`. An empty or unreadable slot gives an
    /// empty store.
    pub fn open(persistence: P, config: &Config) -> Self {
        let notes = dedupe_ids(persistence.load());
        let selected = notes.first().map(|note| note.id.clone());
        info!("Opened note store with {} notes", notes.len());

        Self {
            persistence,
            notes,
            selected,
            autosave: AutosaveScheduler::new(config.autosave_quiet()),
            default_color: config.default_color.clone(),
        }
    }

    /// Creates a blank note at the front of the collection, selects it and
    /// writes the collection immediately.
    pub fn create(&mut self) -> Note {
        let note = Note::new(self.default_color.clone(), Utc::now());
        info!("Creating note: {}", note.id);

        self.notes.insert(0, note.clone());
        self.selected = Some(note.id.clone());
        self.persist_now();
        note
    }

    /// Merges `patch` into the note with `id`. Returns `false`, changing
    /// nothing, when there is no such note.
    pub fn update(&mut self, id: &str, patch: NotePatch) -> bool {
        let Some(note) = self.notes.iter_mut().find(|note| note.id == id) else {
            debug!("Update skipped, note not found: {}", id);
            return false;
        };

        trace!("Updating note {} with {:?}", id, patch);
        note.apply(patch, Utc::now());
        self.autosave.note_edit(Instant::now());
        true
    }

    /// Moves a note to the trash. Clears the selection if it pointed there.
    pub fn soft_delete(&mut self, id: &str) -> bool {
        let found = self.update(id, NotePatch::new().deleted(true));
        if found {
            debug!("Note moved to trash: {}", id);
            self.clear_selection_of(id);
        }
        found
    }

    /// Takes a note back out of the trash.
    pub fn restore(&mut self, id: &str) -> bool {
        let found = self.update(id, NotePatch::new().deleted(false));
        if found {
            debug!("Note restored from trash: {}", id);
        }
        found
    }

    /// Removes a note for good and writes the collection immediately.
    pub fn purge(&mut self, id: &str) -> bool {
        let Some(index) = self.notes.iter().position(|note| note.id == id) else {
            debug!("Purge skipped, note not found: {}", id);
            return false;
        };

        self.notes.remove(index);
        self.clear_selection_of(id);
        info!("Purged note: {}", id);
        self.persist_now();
        true
    }

    /// Replaces the whole collection and writes it immediately. The
    /// selection moves to the first note, or to nothing.
    pub fn replace_all(&mut self, notes: Vec<Note>) {
        self.notes = dedupe_ids(notes);
        self.selected = self.notes.first().map(|note| note.id.clone());
        info!("Replaced collection with {} notes", self.notes.len());
        self.persist_now();
    }

    /// Imports a payload, replacing the collection. A payload that is not a
    /// list of notes is rejected and the store is left as it was.
    pub fn import(&mut self, payload: &str) -> Result<ImportReport> {
        let summary = import_notes(payload)?;
        let report = ImportReport {
            imported: summary.notes.len(),
            repaired: summary.repaired,
        };
        self.replace_all(summary.notes);
        Ok(report)
    }

    pub fn export(&self) -> Result<String> {
        export_notes(&self.notes)
    }

    /// Writes the collection now, cancelling any pending autosave.
    pub fn save_now(&mut self) -> Result<()> {
        self.autosave.cancel();
        self.write()
    }

    /// Performs the autosave if its deadline has passed. Returns whether a
    /// write was attempted.
    pub fn flush_if_due(&mut self, now: Instant) -> bool {
        if !self.autosave.take_due(now) {
            return false;
        }
        debug!("Autosave due, writing {} notes", self.notes.len());
        if let Err(e) = self.write() {
            error!("Autosave failed: {}", e);
        }
        true
    }

    pub fn view(&self, config: &ViewConfig) -> Vec<&Note> {
        derive_view(&self.notes, config)
    }

    pub fn get(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == id)
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Selects a note. Unknown ids leave the selection unchanged.
    pub fn select(&mut self, id: &str) -> bool {
        if self.get(id).is_none() {
            debug!("Select skipped, note not found: {}", id);
            return false;
        }
        self.selected = Some(id.to_string());
        true
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected(&self) -> Option<&Note> {
        self.selected.as_deref().and_then(|id| self.get(id))
    }

    pub fn status(&self) -> &SaveStatus {
        self.autosave.status()
    }

    pub fn autosave_deadline(&self) -> Option<Instant> {
        self.autosave.deadline()
    }

    fn clear_selection_of(&mut self, id: &str) {
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
    }

    /// Write-through for structural changes. A failure is logged and shown
    /// in the save status; the in-memory collection stays authoritative.
    fn persist_now(&mut self) {
        self.autosave.cancel();
        if let Err(e) = self.write() {
            error!("Failed to persist notes: {}", e);
        }
    }

    fn write(&mut self) -> Result<()> {
        let outcome = self.persistence.save(&self.notes);
        self.autosave.record_write(&outcome);
        if outcome.is_ok() {
            trace!("Persisted {} notes", self.notes.len());
        }
        outcome
    }
}

/// Gives any note whose id was already seen a fresh id.
fn dedupe_ids(mut notes: Vec<Note>) -> Vec<Note> {
    let mut seen = HashSet::with_capacity(notes.len());
    for note in &mut notes {
        if !seen.insert(note.id.clone()) {
            let fresh = new_id();
            warn!("Duplicate note id {} replaced with {}", note.id, fresh);
            note.id = fresh.clone();
            seen.insert(fresh);
        }
    }
    notes
}
