//! The durable key-value slot the store is persisted to.
//!
//! `load` never fails: an absent or unreadable slot degrades to an empty
//! collection. `save` reports failure but the caller decides what to do.
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use log::{debug, info, warn};

use crate::{import_notes, write_atomic, Note, NoteError, Result};

pub trait Persistence {
    /// Reads the stored collection, or an empty one if there is none.
    fn load(&self) -> Vec<Note>;

    /// Replaces the stored collection.
    fn save(&self, notes: &[Note]) -> Result<()>;
}

/// A slot backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileSlot {
    path: PathBuf,
}

impl JsonFileSlot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Persistence for JsonFileSlot {
    fn load(&self) -> Vec<Note> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No slot at {}, starting empty", self.path.display());
                return Vec::new();
            }
            Err(e) => {
                warn!("Slot {} unreadable, starting empty: {}", self.path.display(), e);
                return Vec::new();
            }
        };

        // Stored data goes through the same healing as an import, so one
        // damaged note does not cost the whole collection.
        match import_notes(&raw) {
            Ok(summary) => {
                if summary.repaired > 0 {
                    warn!(
                        "Repaired {} damaged notes while loading {}",
                        summary.repaired,
                        self.path.display()
                    );
                }
                info!(
                    "Loaded {} notes from {}",
                    summary.notes.len(),
                    self.path.display()
                );
                summary.notes
            }
            Err(e) => {
                warn!("Slot {} is corrupt, starting empty: {}", self.path.display(), e);
                Vec::new()
            }
        }
    }

    fn save(&self, notes: &[Note]) -> Result<()> {
        debug!("Saving {} notes to {}", notes.len(), self.path.display());
        let json = serde_json::to_string(notes)?;
        write_atomic(&self.path, json.as_bytes()).map_err(|e| {
            NoteError::persistence(format!("{}: {}", self.path.display(), e))
        })
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    notes: Vec<Note>,
    saves: usize,
    fail: bool,
}

/// An in-memory slot. Clones share the same storage, so a caller can keep a
/// clone to observe what the store wrote.
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_notes(notes: Vec<Note>) -> Self {
        let slot = Self::default();
        if let Ok(mut inner) = slot.inner.lock() {
            inner.notes = notes;
        }
        slot
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.inner.lock().map(|inner| inner.saves).unwrap_or(0)
    }

    pub fn stored(&self) -> Vec<Note> {
        self.inner
            .lock()
            .map(|inner| inner.notes.clone())
            .unwrap_or_default()
    }

    /// Makes every following save fail until switched back.
    pub fn set_failing(&self, fail: bool) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.fail = fail;
        }
    }
}

impl Persistence for MemorySlot {
    fn load(&self) -> Vec<Note> {
        self.stored()
    }

    fn save(&self, notes: &[Note]) -> Result<()> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| NoteError::persistence("memory slot lock poisoned"))?;
        if inner.fail {
            return Err(NoteError::persistence("memory slot is unavailable"));
        }
        inner.notes = notes.to_vec();
        inner.saves += 1;
        Ok(())
    }
}
