//! Local persistence of the store state
//!
//! The whole store state is written as one namespaced JSON blob wrapped in a
//! versioned envelope:
//!
//! ```json
//! { "version": 1, "state": { "tasks": [...], "darkMode": false, ... } }
//! ```
//!
//! - [`file`] - JSON file backend with atomic writes
//! - [`memory`] - In-process backend
//! - [`migrate`] - Upgrades older blobs to the current schema

pub mod file;
pub mod memory;
pub mod migrate;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::STATE_SCHEMA_VERSION;
use crate::entities::{Task, User};

pub use file::JsonFileStorage;
pub use memory::MemoryStorage;

/// Error types for state persistence
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("State serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unsupported state version {found} (this build reads up to {supported})")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("Invalid persisted state: {0}")]
    InvalidState(String),
}

/// Snapshot of everything the store persists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub dark_mode: bool,
    #[serde(default = "default_auto_delete")]
    pub auto_delete_enabled: bool,
    #[serde(default)]
    pub google_calendar_sync: bool,
    #[serde(default)]
    pub user: Option<User>,
}

fn default_auto_delete() -> bool {
    true
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            dark_mode: false,
            auto_delete_enabled: default_auto_delete(),
            google_calendar_sync: false,
            user: None,
        }
    }
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u32,
    state: &'a PersistedState,
}

/// Backend holding the persisted blob.
pub trait StateStorage: Send {
    /// Read the persisted state; `Ok(None)` when nothing was saved yet
    fn load(&self) -> Result<Option<PersistedState>, StorageError>;

    /// Replace the persisted state
    fn save(&self, state: &PersistedState) -> Result<(), StorageError>;
}

/// Serialize a state into the current envelope format
pub fn encode(state: &PersistedState) -> Result<String, StorageError> {
    let envelope = EnvelopeRef {
        version: STATE_SCHEMA_VERSION,
        state,
    };
    Ok(serde_json::to_string_pretty(&envelope)?)
}

/// Parse a persisted blob of any known version
pub fn decode(raw: &str) -> Result<PersistedState, StorageError> {
    let value: Value = serde_json::from_str(raw)?;
    let (version, state) = migrate::split_envelope(value)?;
    let state = migrate::upgrade(version, state)?;
    Ok(serde_json::from_value(state)?)
}
