//! Shared value types for notebox.
//!
//! View configuration, save status and import summaries live here so the
//! store, the view engine and the service can all refer to them.
use std::{fmt, str::FromStr};

use crate::{Note, NoteError};

/// A specialized Result type for notebox operations.
pub type Result<T> = std::result::Result<T, NoteError>;

/// Which partition of the collection a view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    /// Not archived and not deleted
    #[default]
    Active,
    /// Archived but not deleted
    Archived,
    /// Soft-deleted, regardless of the archived flag
    Trash,
}

impl StatusFilter {
    pub fn matches(self, note: &Note) -> bool {
        match self {
            StatusFilter::Active => !note.archived && !note.deleted,
            StatusFilter::Archived => note.archived && !note.deleted,
            StatusFilter::Trash => note.deleted,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StatusFilter::Active => "active",
            StatusFilter::Archived => "archived",
            StatusFilter::Trash => "trash",
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusFilter {
    type Err = NoteError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "active" => Ok(StatusFilter::Active),
            "archived" => Ok(StatusFilter::Archived),
            "trash" => Ok(StatusFilter::Trash),
            other => Err(NoteError::ConfigError {
                message: format!("Unknown status filter: {}", other),
            }),
        }
    }
}

/// Secondary sort key of a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    #[default]
    UpdatedDesc,
    UpdatedAsc,
    TitleAsc,
    TitleDesc,
}

impl SortMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SortMode::UpdatedDesc => "updated-desc",
            SortMode::UpdatedAsc => "updated-asc",
            SortMode::TitleAsc => "title-asc",
            SortMode::TitleDesc => "title-desc",
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortMode {
    type Err = NoteError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "updated-desc" => Ok(SortMode::UpdatedDesc),
            "updated-asc" => Ok(SortMode::UpdatedAsc),
            "title-asc" => Ok(SortMode::TitleAsc),
            "title-desc" => Ok(SortMode::TitleDesc),
            other => Err(NoteError::ConfigError {
                message: format!("Unknown sort mode: {}", other),
            }),
        }
    }
}

/// Filter and sort settings for deriving a view. Owned by the caller and
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewConfig {
    /// Substring to look for in title and content, case-insensitive
    pub search: String,
    /// Only show notes carrying this tag
    pub tag: Option<String>,
    pub status: StatusFilter,
    pub sort: SortMode,
    /// Put pinned notes ahead of everything else
    pub pinned_first: bool,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            search: String::new(),
            tag: None,
            status: StatusFilter::default(),
            sort: SortMode::default(),
            pinned_first: true,
        }
    }
}

impl ViewConfig {
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    pub fn with_sort(mut self, sort: SortMode) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_pinned_first(mut self, pinned_first: bool) -> Self {
        self.pinned_first = pinned_first;
        self
    }
}

/// Visible persistence status, driven by the autosave scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SaveStatus {
    /// Nothing has been edited since the store was opened
    #[default]
    Idle,
    /// Edits are waiting for the quiet interval to elapse
    Editing,
    /// The last write succeeded
    Saved,
    /// The last write failed; the in-memory state is still intact
    Failed(String),
}

/// Number of notes in each status partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusCounts {
    pub active: usize,
    pub archived: usize,
    pub trash: usize,
}

/// Result of decoding an import payload.
#[derive(Debug, Clone)]
pub struct ImportSummary {
    /// The well-formed notes, in payload order
    pub notes: Vec<Note>,
    /// How many entries had at least one field replaced by a default
    pub repaired: usize,
}

/// What an import did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    pub repaired: usize,
}
