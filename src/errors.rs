//! Error types for the notebox engine.
//!
//! Most failure modes inside the store are healed locally (unknown ids are
//! no-ops, malformed import entries are defaulted). The variants here cover
//! what is surfaced to callers.

use std::{io, path::PathBuf};

use thiserror::Error;

/// The main error type for notebox.
#[derive(Error, Debug)]
pub enum NoteError {
    /// Errors related to file I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors related to serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Note was not found when performing an operation.
    #[error("Note not found: {id}")]
    NotFound { id: String },

    /// An import payload whose overall structure is unusable.
    #[error("Invalid import format: {message}")]
    InvalidFormat { message: String },

    /// The persistence slot could not be read or written.
    #[error("Persistence unavailable: {message}")]
    PersistenceUnavailable { message: String },

    /// Errors related to configuration.
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Directory creation or access failed.
    #[error("Failed to create or access directory: {path}")]
    DirectoryError { path: PathBuf },

    /// The note service task is no longer running.
    #[error("Note service stopped: {message}")]
    ServiceStopped { message: String },
}

impl NoteError {
    pub fn invalid_format(message: impl Into<String>) -> Self {
        NoteError::InvalidFormat {
            message: message.into(),
        }
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        NoteError::PersistenceUnavailable {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = NoteError::NotFound {
            id: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "Note not found: abc");

        let err = NoteError::invalid_format("top level is an object");
        assert_eq!(
            err.to_string(),
            "Invalid import format: top level is an object"
        );
    }

    #[test]
    fn test_serde_error_converts() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: NoteError = parse.unwrap_err().into();
        assert!(matches!(err, NoteError::Serialization(_)));
    }
}
