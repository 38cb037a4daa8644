use std::{fs, io::Write, path::Path};

use log::{debug, error, trace};
use tempfile::NamedTempFile;

use crate::{NoteError, Result};

/// Trims a raw tag, returning `None` when nothing is left.
pub fn normalize_tag(tag: &str) -> Option<String> {
    let trimmed = tag.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Normalizes a tag list: trims each tag, drops empties and duplicates,
/// keeps first-seen order.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        if let Some(tag) = normalize_tag(tag.as_ref()) {
            if !out.contains(&tag) {
                out.push(tag);
            }
        }
    }
    out
}

/// Writes `contents` to `path` through a temporary file in the same
/// directory, then atomically renames it into place.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    if !dir.exists() {
        debug!("Creating parent directory: {}", dir.display());
        fs::create_dir_all(dir).map_err(|e| {
            error!("Failed to create directory {}: {}", dir.display(), e);
            NoteError::DirectoryError {
                path: dir.to_path_buf(),
            }
        })?;
    }

    let mut temp_file = NamedTempFile::new_in(dir).map_err(|e| {
        error!("Failed to create temporary file: {}", e);
        NoteError::Io(e)
    })?;

    trace!("Writing {} bytes to temporary file", contents.len());
    temp_file.write_all(contents)?;
    temp_file.flush()?;

    temp_file.persist(path).map_err(|e| {
        error!("Failed to persist file {}: {}", path.display(), e.error);
        NoteError::Io(e.error)
    })?;

    Ok(())
}
