//! In-memory document store.
//!
//! Behaves like a schemaless document database: documents are JSON objects,
//! partial updates merge top-level fields and require the document to exist.
//! Useful for embedding without a cloud account and for tests.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::{document_path, RemoteError, RemoteStore};
use crate::entities::{Task, TaskPatch};

#[derive(Default)]
pub struct MemoryRemote {
    documents: Mutex<BTreeMap<String, Map<String, Value>>>,
    offline: AtomicBool,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate losing connectivity; every call fails with a network error
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Snapshot of a stored document
    pub fn document(&self, uid: &str, task_id: &str) -> Option<Value> {
        self.lock()
            .get(&document_path(uid, task_id))
            .map(|doc| Value::Object(doc.clone()))
    }

    /// Number of documents across all users
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Map<String, Value>>> {
        // A poisoned map is still a consistent map of documents
        self.documents.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn ensure_online(&self) -> Result<(), RemoteError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(RemoteError::Network("remote store is unreachable".to_string()));
        }
        Ok(())
    }
}

fn to_object(value: Value) -> Result<Map<String, Value>, RemoteError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(RemoteError::Other(format!("expected a JSON object, got {}", other))),
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn create_task(&self, uid: &str, task: &Task) -> Result<(), RemoteError> {
        self.ensure_online()?;
        let doc = to_object(serde_json::to_value(task)?)?;
        self.lock().insert(document_path(uid, &task.id), doc);
        Ok(())
    }

    async fn update_task(&self, uid: &str, task_id: &str, patch: &TaskPatch) -> Result<(), RemoteError> {
        self.ensure_online()?;
        let fields = to_object(serde_json::to_value(patch)?)?;
        let path = document_path(uid, task_id);

        let mut documents = self.lock();
        let doc = documents.get_mut(&path).ok_or_else(|| RemoteError::NotFound(path.clone()))?;
        for (key, value) in fields {
            doc.insert(key, value);
        }
        Ok(())
    }

    async fn delete_task(&self, uid: &str, task_id: &str) -> Result<(), RemoteError> {
        self.ensure_online()?;
        // Deleting a missing document succeeds, like most document stores
        self.lock().remove(&document_path(uid, task_id));
        Ok(())
    }
}
