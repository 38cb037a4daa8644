//! Core data structures for notebox.
//!
//! This module contains the `Note` entity and the partial update applied to it.
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{new_id, normalize_tags};

/// Title given to notes created without one.
pub const DEFAULT_TITLE: &str = "Untitled";

/// Color token given to notes created without one.
pub const DEFAULT_COLOR: &str = "default";

/// Represents a single note in our system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Unique identifier for the note
    pub id: String,
    /// Note title
    pub title: String,
    /// Free-form note body
    pub content: String,
    /// Tags for organization, in insertion order
    pub tags: Vec<String>,
    /// Color token used by whatever renders the note
    pub color: String,
    pub pinned: bool,
    pub archived: bool,
    /// Tombstone flag, recoverable until the note is purged
    pub deleted: bool,
    /// When the note was created
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// Creates a blank note with a fresh id, stamped with `now`.
    pub fn new(color: impl Into<String>, now: DateTime<Utc>) -> Self {
        let color = color.into();
        Note {
            id: new_id(),
            title: DEFAULT_TITLE.to_string(),
            content: String::new(),
            tags: Vec::new(),
            color: if color.trim().is_empty() {
                DEFAULT_COLOR.to_string()
            } else {
                color
            },
            pinned: false,
            archived: false,
            deleted: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies `patch` and refreshes `updated_at`.
    ///
    /// `updated_at` always moves forward, even when the clock has not
    /// advanced since the previous mutation.
    pub(crate) fn apply(&mut self, patch: NotePatch, now: DateTime<Utc>) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(tags) = patch.tags {
            self.tags = normalize_tags(tags);
        }
        if let Some(color) = patch.color {
            self.color = color;
        }
        if let Some(pinned) = patch.pinned {
            self.pinned = pinned;
        }
        if let Some(archived) = patch.archived {
            self.archived = archived;
        }
        if let Some(deleted) = patch.deleted {
            self.deleted = deleted;
        }
        self.touch(now);
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + Duration::microseconds(1)
        };
    }
}

/// A partial update to a note. Fields left as `None` are not changed.
///
/// `id` and `created_at` are deliberately absent: they cannot be patched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub color: Option<String>,
    pub pinned: Option<bool>,
    pub archived: Option<bool>,
    pub deleted: Option<bool>,
}

impl NotePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn pinned(mut self, pinned: bool) -> Self {
        self.pinned = Some(pinned);
        self
    }

    pub fn archived(mut self, archived: bool) -> Self {
        self.archived = Some(archived);
        self
    }

    pub fn deleted(mut self, deleted: bool) -> Self {
        self.deleted = Some(deleted);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
