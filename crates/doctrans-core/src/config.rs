//! Persisted default-configuration store.
//!
//! The settings builder decides *whether* a job's merged configuration
//! becomes the new default; this store is the only place that actually reads
//! and writes the file.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::defaults::{CONFIG_FILE, ENV_CONFIG_FILE};
use crate::error::{Error, Result};
use crate::settings::BaseSettings;

/// JSON-file-backed store for the process-wide default settings.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ConfigStore { path: path.into() }
    }

    /// Store at the path from `CONFIG_FILE`, or the default next to the
    /// process working directory.
    pub fn from_env() -> Self {
        let path = std::env::var(ENV_CONFIG_FILE).unwrap_or_else(|_| CONFIG_FILE.to_string());
        ConfigStore::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted defaults. A missing file means the built-in
    /// defaults, not an error; a malformed file is an error, never silently
    /// replaced.
    pub fn load(&self) -> Result<BaseSettings> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| {
                Error::Config(format!(
                    "malformed config file {}: {e}",
                    self.path.display()
                ))
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no config file, using built-in defaults");
                Ok(BaseSettings::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Persist `settings` as the new defaults, creating parent directories
    /// as needed.
    pub fn save(&self, settings: &BaseSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let raw = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, raw)?;
        debug!(path = %self.path.display(), "persisted default settings");
        Ok(())
    }
}
