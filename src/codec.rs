//! Import/export of the whole note collection.
//!
//! Export is a pretty-printed JSON array. Import validates the overall shape
//! (it must be an array) and then heals each entry field by field, so a
//! damaged entry costs at most the damaged fields, never the import.
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Local, NaiveDate, Utc};
use log::{debug, info, trace, warn};
use serde_json::{Map, Value};

use crate::{
    new_id, normalize_tags, write_atomic, ImportSummary, Note, NoteError, Result, DEFAULT_COLOR,
    DEFAULT_TITLE,
};

/// Serializes the collection as a human-readable JSON array.
pub fn export_notes(notes: &[Note]) -> Result<String> {
    Ok(serde_json::to_string_pretty(notes)?)
}

/// Parses an import payload, stamping defaulted timestamps with the current
/// time.
pub fn import_notes(payload: &str) -> Result<ImportSummary> {
    import_notes_at(payload, Utc::now())
}

/// Parses an import payload, using `now` for every defaulted timestamp.
pub fn import_notes_at(payload: &str, now: DateTime<Utc>) -> Result<ImportSummary> {
    let value: Value = serde_json::from_str(payload)
        .map_err(|e| NoteError::invalid_format(format!("payload is not JSON: {}", e)))?;

    let entries = match value {
        Value::Array(entries) => entries,
        other => {
            return Err(NoteError::invalid_format(format!(
                "expected an array of notes, found {}",
                kind_of(&other)
            )))
        }
    };

    let mut seen_ids = HashSet::with_capacity(entries.len());
    let mut repaired = 0;
    let mut notes = Vec::with_capacity(entries.len());

    for (index, entry) in entries.iter().enumerate() {
        let (note, healed) = heal_entry(entry, now, &mut seen_ids);
        if healed {
            trace!("Entry {} repaired as note {}", index, note.id);
            repaired += 1;
        }
        notes.push(note);
    }

    if repaired > 0 {
        warn!("{} of {} imported entries needed repair", repaired, notes.len());
    }
    debug!("Decoded {} notes from payload", notes.len());

    Ok(ImportSummary { notes, repaired })
}

/// File name for an export taken on `date`.
pub fn export_file_name(date: NaiveDate) -> String {
    format!("notes-export-{}.json", date.format("%Y-%m-%d"))
}

/// Writes an export of `notes` into `dir`, named with today's date.
pub fn write_export(dir: &Path, notes: &[Note]) -> Result<PathBuf> {
    let path = dir.join(export_file_name(Local::now().date_naive()));
    let payload = export_notes(notes)?;
    write_atomic(&path, payload.as_bytes())?;
    info!("Exported {} notes to {}", notes.len(), path.display());
    Ok(path)
}

/// Reads an import file without blocking the runtime.
pub async fn read_import_file(path: &Path) -> Result<String> {
    debug!("Reading import file {}", path.display());
    let payload = tokio::fs::read_to_string(path).await?;
    Ok(payload)
}

/// Builds a well-formed note from one payload entry. The flag reports whether
/// any field had to be defaulted.
fn heal_entry(entry: &Value, now: DateTime<Utc>, seen_ids: &mut HashSet<String>) -> (Note, bool) {
    let empty = Map::new();
    let (fields, mut healed) = match entry {
        Value::Object(fields) => (fields, false),
        _ => (&empty, true),
    };
    let mut heal = Healer::default();

    let id = heal
        .take(fields.get("id").and_then(scalar_text).filter(|id| {
            !id.trim().is_empty() && !seen_ids.contains(id)
        }))
        .unwrap_or_else(new_id);
    seen_ids.insert(id.clone());

    let title = heal
        .take(fields.get("title").and_then(scalar_text))
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());
    let content = heal
        .take(fields.get("content").and_then(scalar_text))
        .unwrap_or_default();
    let color = heal
        .take(fields.get("color").and_then(scalar_text))
        .unwrap_or_else(|| DEFAULT_COLOR.to_string());
    let tags = heal
        .take(fields.get("tags").and_then(tag_list))
        .unwrap_or_default();
    let pinned = heal.take(fields.get("pinned").and_then(flag)).unwrap_or(false);
    let archived = heal.take(fields.get("archived").and_then(flag)).unwrap_or(false);
    let deleted = heal.take(fields.get("deleted").and_then(flag)).unwrap_or(false);
    let created_at = heal
        .take(fields.get("createdAt").and_then(timestamp))
        .unwrap_or(now);
    let mut updated_at = heal
        .take(fields.get("updatedAt").and_then(timestamp))
        .unwrap_or(now);
    healed |= heal.healed;

    if updated_at < created_at {
        updated_at = created_at;
        healed = true;
    }

    let note = Note {
        id,
        title,
        content,
        tags,
        color,
        pinned,
        archived,
        deleted,
        created_at,
        updated_at,
    };
    (note, healed)
}

/// Records whether any field fell back to its default.
#[derive(Default)]
struct Healer {
    healed: bool,
}

impl Healer {
    fn take<T>(&mut self, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.healed = true;
        }
        value
    }
}

/// Strings are taken as-is; numbers and booleans become their text form.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn tag_list(value: &Value) -> Option<Vec<String>> {
    let items = value.as_array()?;
    Some(normalize_tags(items.iter().filter_map(scalar_text)))
}

fn flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|n| n != 0.0),
        Value::String(s) => match s.trim() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// RFC 3339 strings or epoch milliseconds.
fn timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    fn sample_note(title: &str) -> Note {
        let mut note = Note::new("green", Utc::now());
        note.title = title.to_string();
        note.content = "body".to_string();
        note.tags = vec!["a".to_string(), "b".to_string()];
        note.pinned = true;
        note
    }

    #[test]
    fn test_empty_array() {
        let summary = import_notes("[]").unwrap();
        assert!(summary.notes.is_empty());
        assert_eq!(summary.repaired, 0);
    }

    #[test]
    fn test_title_only_entry_is_defaulted() {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let summary = import_notes_at(r#"[{"title":"X"}]"#, now).unwrap();

        assert_eq!(summary.notes.len(), 1);
        assert_eq!(summary.repaired, 1);
        let note = &summary.notes[0];
        assert!(!note.id.is_empty());
        assert_eq!(note.title, "X");
        assert_eq!(note.content, "");
        assert!(note.tags.is_empty());
        assert_eq!(note.color, DEFAULT_COLOR);
        assert!(!note.deleted && !note.pinned && !note.archived);
        assert_eq!(note.created_at, now);
        assert_eq!(note.updated_at, now);
    }

    #[test]
    fn test_non_array_is_rejected() {
        for payload in [r#"{"a":1}"#, "42", r#""notes""#, "null", "not json at all"] {
            assert!(
                matches!(import_notes(payload), Err(NoteError::InvalidFormat { .. })),
                "payload {} should be rejected",
                payload
            );
        }
    }

    #[test]
    fn test_fields_are_coerced() {
        let now = Utc::now();
        let payload = json!([{
            "id": 17,
            "title": true,
            "content": 3.5,
            "tags": [" work ", "work", 7, null, {"x": 1}, ""],
            "color": 4,
            "pinned": 1,
            "archived": "true",
            "deleted": "maybe",
            "createdAt": 1_700_000_000_000_i64,
            "updatedAt": "2023-11-14T22:13:20Z"
        }])
        .to_string();

        let summary = import_notes_at(&payload, now).unwrap();
        let note = &summary.notes[0];
        assert_eq!(note.id, "17");
        assert_eq!(note.title, "true");
        assert_eq!(note.content, "3.5");
        assert_eq!(note.tags, vec!["work", "7"]);
        assert_eq!(note.color, "4");
        assert!(note.pinned);
        assert!(note.archived);
        assert!(!note.deleted);
        assert_eq!(note.created_at.timestamp_millis(), 1_700_000_000_000);
        assert_eq!(note.updated_at, note.created_at);
        assert_eq!(summary.repaired, 1);
    }

    #[test]
    fn test_tags_that_are_not_a_list_become_empty() {
        let summary = import_notes(r#"[{"title":"t","tags":"a,b"}]"#).unwrap();
        assert!(summary.notes[0].tags.is_empty());
    }

    #[test]
    fn test_non_object_entries_become_default_notes() {
        let summary = import_notes(r#"["loose text", 5]"#).unwrap();
        assert_eq!(summary.notes.len(), 2);
        assert_eq!(summary.repaired, 2);
        assert!(summary.notes.iter().all(|n| n.title == DEFAULT_TITLE));
        assert_ne!(summary.notes[0].id, summary.notes[1].id);
    }

    #[test]
    fn test_duplicate_ids_are_replaced() {
        let summary = import_notes(r#"[{"id":"same"},{"id":"same"}]"#).unwrap();
        assert_eq!(summary.notes[0].id, "same");
        assert_ne!(summary.notes[1].id, "same");
    }

    #[test]
    fn test_updated_before_created_is_clamped() {
        let payload = json!([{
            "createdAt": "2024-05-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z"
        }])
        .to_string();
        let note = &import_notes(&payload).unwrap().notes[0];
        assert_eq!(note.updated_at, note.created_at);
    }

    #[test]
    fn test_round_trip_preserves_notes() {
        let mut archived = sample_note("Second");
        archived.archived = true;
        archived.updated_at = archived.updated_at + chrono::Duration::microseconds(7);
        let notes = vec![sample_note("First"), archived];

        let payload = export_notes(&notes).unwrap();
        let summary = import_notes(&payload).unwrap();

        assert_eq!(summary.notes, notes);
        assert_eq!(summary.repaired, 0);
    }

    #[test]
    fn test_empty_text_fields_survive_round_trip() {
        let mut blank = sample_note("");
        blank.color = String::new();
        blank.content = String::new();
        let notes = vec![blank];

        let summary = import_notes(&export_notes(&notes).unwrap()).unwrap();
        assert_eq!(summary.notes, notes);
        assert_eq!(summary.repaired, 0);
    }

    #[test]
    fn test_missing_or_unusable_text_fields_are_defaulted() {
        let payload = json!([{"id": "n1", "title": null, "color": ["red"]}]).to_string();
        let summary = import_notes(&payload).unwrap();
        assert_eq!(summary.notes[0].title, DEFAULT_TITLE);
        assert_eq!(summary.notes[0].color, DEFAULT_COLOR);
        assert_eq!(summary.repaired, 1);
    }

    #[test]
    fn test_export_field_order() {
        let payload = export_notes(&[sample_note("Ordered")]).unwrap();
        let positions: Vec<usize> = [
            "\"id\"",
            "\"title\"",
            "\"content\"",
            "\"tags\"",
            "\"color\"",
            "\"pinned\"",
            "\"archived\"",
            "\"deleted\"",
            "\"createdAt\"",
            "\"updatedAt\"",
        ]
        .iter()
        .map(|key| payload.find(key).unwrap())
        .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_export_file_name() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 9).unwrap();
        assert_eq!(export_file_name(date), "notes-export-2024-02-09.json");
    }

    #[tokio::test]
    async fn test_write_export_then_read_back() {
        let temp = TempDir::new().unwrap();
        let notes = vec![sample_note("Kept")];

        let path = write_export(temp.path(), &notes).unwrap();
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("notes-export-"));

        let payload = read_import_file(&path).await.unwrap();
        assert_eq!(import_notes(&payload).unwrap().notes, notes);
    }
}
