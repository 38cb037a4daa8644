//! Filter-sort engine: derives the visible list of notes.
//!
//! Everything here is a pure function of its inputs. The notes slice is only
//! read, and the output order depends on nothing but `(notes, config)`.
use std::cmp::Ordering;

use crate::{Note, SortMode, StatusCounts, StatusFilter, ViewConfig};

/// Applies status, tag and search filters, then sorts.
///
/// The sort is stable, so notes that tie on the sort key keep their order in
/// the collection.
pub fn derive_view<'a>(notes: &'a [Note], config: &ViewConfig) -> Vec<&'a Note> {
    let needle = config.search.to_lowercase();

    let mut view: Vec<&Note> = notes
        .iter()
        .filter(|note| config.status.matches(note))
        .filter(|note| match &config.tag {
            Some(tag) => note.tags.iter().any(|t| t == tag),
            None => true,
        })
        .filter(|note| needle.is_empty() || matches_search(note, &needle))
        .collect();

    view.sort_by(|a, b| compare_notes(a, b, config));
    view
}

/// Counts how many notes fall into each status partition.
pub fn status_counts(notes: &[Note]) -> StatusCounts {
    notes.iter().fold(StatusCounts::default(), |mut counts, note| {
        if StatusFilter::Trash.matches(note) {
            counts.trash += 1;
        } else if StatusFilter::Archived.matches(note) {
            counts.archived += 1;
        } else {
            counts.active += 1;
        }
        counts
    })
}

fn matches_search(note: &Note, needle: &str) -> bool {
    format!("{} {}", note.title, note.content)
        .to_lowercase()
        .contains(needle)
}

fn compare_notes(a: &Note, b: &Note, config: &ViewConfig) -> Ordering {
    let pinned = if config.pinned_first {
        b.pinned.cmp(&a.pinned)
    } else {
        Ordering::Equal
    };

    pinned.then_with(|| match config.sort {
        SortMode::UpdatedDesc => b.updated_at.cmp(&a.updated_at),
        SortMode::UpdatedAsc => a.updated_at.cmp(&b.updated_at),
        SortMode::TitleAsc => compare_titles(&a.title, &b.title),
        SortMode::TitleDesc => compare_titles(&b.title, &a.title),
    })
}

/// Case-insensitive comparison, falling back to the exact text so that
/// "apple" and "Apple" still have a fixed order.
fn compare_titles(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use super::*;
    use crate::DEFAULT_COLOR;

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
    }

    fn note(title: &str, minutes: i64) -> Note {
        let mut note = Note::new(DEFAULT_COLOR, base_time());
        note.title = title.to_string();
        note.updated_at = base_time() + Duration::minutes(minutes);
        note
    }

    fn titles(view: &[&Note]) -> Vec<String> {
        view.iter().map(|n| n.title.clone()).collect()
    }

    #[test]
    fn test_status_partitions() {
        let active = note("active", 0);
        let mut archived = note("archived", 1);
        archived.archived = true;
        let mut trashed = note("trashed", 2);
        trashed.deleted = true;
        let mut archived_trash = note("archived trash", 3);
        archived_trash.archived = true;
        archived_trash.deleted = true;
        let notes = vec![active, archived, trashed, archived_trash];

        let config = ViewConfig::default().with_sort(SortMode::TitleAsc);
        let pick = |status| titles(&derive_view(&notes, &config.clone().with_status(status)));

        assert_eq!(pick(StatusFilter::Active), vec!["active"]);
        assert_eq!(pick(StatusFilter::Archived), vec!["archived"]);
        assert_eq!(pick(StatusFilter::Trash), vec!["archived trash", "trashed"]);

        let counts = status_counts(&notes);
        assert_eq!(
            counts,
            StatusCounts {
                active: 1,
                archived: 1,
                trash: 2
            }
        );
        assert_eq!(counts.active + counts.archived + counts.trash, notes.len());
    }

    #[test]
    fn test_tag_filter_is_exact() {
        let mut work = note("work", 0);
        work.tags = vec!["Work".to_string()];
        let mut home = note("home", 1);
        home.tags = vec!["home".to_string(), "work".to_string()];
        let notes = vec![work, home];

        let view = derive_view(&notes, &ViewConfig::default().with_tag("work"));
        assert_eq!(titles(&view), vec!["home"]);
    }

    #[test]
    fn test_search_is_case_insensitive_over_title_and_content() {
        let mut a = note("Shopping List", 0);
        a.content = "eggs".to_string();
        let mut b = note("Ideas", 1);
        b.content = "Buy a LIST of books".to_string();
        let c = note("Other", 2);
        let notes = vec![a, b, c];

        let view = derive_view(&notes, &ViewConfig::default().with_search("list"));
        assert_eq!(titles(&view), vec!["Ideas", "Shopping List"]);

        // The joining space is searchable too.
        let view = derive_view(&notes, &ViewConfig::default().with_search("list eggs"));
        assert_eq!(titles(&view), vec!["Shopping List"]);
    }

    #[test]
    fn test_sort_modes() {
        let notes = vec![note("banana", 1), note("Apple", 2), note("cherry", 0)];
        let sorted = |mode| titles(&derive_view(&notes, &ViewConfig::default().with_sort(mode)));

        assert_eq!(sorted(SortMode::UpdatedDesc), vec!["Apple", "banana", "cherry"]);
        assert_eq!(sorted(SortMode::UpdatedAsc), vec!["cherry", "banana", "Apple"]);
        assert_eq!(sorted(SortMode::TitleAsc), vec!["Apple", "banana", "cherry"]);
        assert_eq!(sorted(SortMode::TitleDesc), vec!["cherry", "banana", "Apple"]);
    }

    #[test]
    fn test_pinned_first_beats_every_sort_mode() {
        let mut pinned = note("zzz pinned", 0);
        pinned.pinned = true;
        let notes = vec![note("aaa newer", 10), pinned];

        for mode in [
            SortMode::UpdatedDesc,
            SortMode::UpdatedAsc,
            SortMode::TitleAsc,
            SortMode::TitleDesc,
        ] {
            let view = derive_view(&notes, &ViewConfig::default().with_sort(mode));
            assert_eq!(view[0].title, "zzz pinned", "mode {}", mode);
        }

        let view = derive_view(&notes, &ViewConfig::default().with_pinned_first(false));
        assert_eq!(view[0].title, "aaa newer");
    }

    #[test]
    fn test_ties_keep_collection_order() {
        let notes = vec![note("first", 5), note("second", 5), note("third", 5)];
        let view = derive_view(&notes, &ViewConfig::default());
        assert_eq!(titles(&view), vec!["first", "second", "third"]);

        let notes = vec![note("same", 1), note("same", 9)];
        let view = derive_view(&notes, &ViewConfig::default().with_sort(SortMode::TitleAsc));
        assert_eq!(view[0].updated_at, notes[0].updated_at);
    }

    #[test]
    fn test_derive_view_is_pure() {
        let mut pinned = note("p", 3);
        pinned.pinned = true;
        let notes = vec![note("b", 1), pinned, note("a", 2)];
        let snapshot = notes.clone();
        let config = ViewConfig::default().with_sort(SortMode::TitleAsc);

        let first: Vec<Note> = derive_view(&notes, &config).into_iter().cloned().collect();
        let second: Vec<Note> = derive_view(&notes, &config).into_iter().cloned().collect();

        assert_eq!(first, second);
        assert_eq!(notes, snapshot);
    }
}
