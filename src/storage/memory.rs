use std::sync::{Arc, Mutex};

use super::{decode, encode, PersistedState, StateStorage, StorageError};

/// Keeps the encoded state blob in memory.
///
/// Clones share the same blob, so a store can be "restarted" on a clone to
/// observe exactly what was persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    blob: Arc<Mutex<Option<String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing raw blob
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self {
            blob: Arc::new(Mutex::new(Some(raw.into()))),
        }
    }

    /// The raw blob as last written
    pub fn raw(&self) -> Option<String> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.blob.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl StateStorage for MemoryStorage {
    fn load(&self) -> Result<Option<PersistedState>, StorageError> {
        match self.lock().as_deref() {
            Some(raw) => decode(raw).map(Some),
            None => Ok(None),
        }
    }

    fn save(&self, state: &PersistedState) -> Result<(), StorageError> {
        let raw = encode(state)?;
        *self.lock() = Some(raw);
        Ok(())
    }
}
