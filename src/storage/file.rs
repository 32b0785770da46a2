use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

use super::{decode, encode, PersistedState, StateStorage, StorageError};
use crate::config::Config;

/// Persists the state blob as `<namespace>.json` on disk
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Storage under the platform data directory, e.g.
    /// `~/.local/share/tidylist/todo-storage.json`
    pub fn in_data_dir(namespace: &str) -> Result<Self> {
        let dir = Config::get_data_dir()?;
        Ok(Self::new(dir.join(format!("{}.json", namespace))))
    }

    /// Storage at the location a configuration points to: the explicit
    /// `[storage] path`, else the namespaced file in the data directory
    pub fn from_config(config: &Config) -> Result<Self> {
        match &config.storage.path {
            Some(path) => Ok(Self::new(path)),
            None => Self::in_data_dir(&config.storage.namespace),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Atomic write: Write to .tmp file then rename
    fn atomic_write(path: &Path, contents: &str) -> std::io::Result<()> {
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, contents)?;
        fs::rename(tmp_path, path)
    }
}

impl StateStorage for JsonFileStorage {
    fn load(&self) -> Result<Option<PersistedState>, StorageError> {
        if !self.path.exists() {
            debug!("No persisted state at {}", self.path.display());
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)?;
        decode(&raw).map(Some)
    }

    fn save(&self, state: &PersistedState) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = encode(state)?;
        Self::atomic_write(&self.path, &raw)?;
        Ok(())
    }
}

/// Read a state file, attaching the path to any error
pub fn read_state_file(path: impl AsRef<Path>) -> Result<Option<PersistedState>> {
    let path = path.as_ref();
    JsonFileStorage::new(path)
        .load()
        .with_context(|| format!("Failed to read state file: {}", path.display()))
}
