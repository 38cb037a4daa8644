use std::{fs, path::Path, path::PathBuf, time::Duration};

use directories::ProjectDirs;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{write_atomic, NoteError, Result, DEFAULT_COLOR};

/// Application configuration settings.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Directory holding the persistence slot
    pub data_dir: PathBuf,

    /// Key of the slot; the file is `<data_dir>/<storage_key>.json`
    pub storage_key: String,

    /// Directory export files are written to
    pub export_dir: PathBuf,

    /// Quiet interval before an autosave fires, in milliseconds
    pub autosave_quiet_ms: u64,

    /// Color token for newly created notes
    pub default_color: String,
}

impl Default for Config {
    fn default() -> Self {
        let (data_dir, export_dir) = match ProjectDirs::from("", "", "notebox") {
            Some(dirs) => (
                dirs.data_dir().to_path_buf(),
                dirs.data_dir().join("exports"),
            ),
            None => (PathBuf::from(".notebox"), PathBuf::from(".notebox/exports")),
        };

        Self {
            data_dir,
            storage_key: "notes".to_string(),
            export_dir,
            autosave_quiet_ms: 500,
            default_color: DEFAULT_COLOR.to_string(),
        }
    }
}

impl Config {
    /// Config rooted at a single directory, handy for tests and portable
    /// installs.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            data_dir: dir.to_path_buf(),
            export_dir: dir.join("exports"),
            ..Self::default()
        }
    }

    /// Loads a JSON config file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let raw = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        write_atomic(path, json.as_bytes())
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage_key.trim().is_empty() {
            return Err(NoteError::ConfigError {
                message: "storage_key must not be empty".to_string(),
            });
        }
        if self.autosave_quiet_ms == 0 {
            return Err(NoteError::ConfigError {
                message: "autosave_quiet_ms must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn slot_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.json", self.storage_key))
    }

    pub fn autosave_quiet(&self) -> Duration {
        Duration::from_millis(self.autosave_quiet_ms)
    }
}
