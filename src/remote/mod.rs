//! Remote document store abstraction.
//!
//! Tasks are mirrored as documents in a per-user collection, one document per
//! task keyed by the task id (`users/{uid}/tasks/{id}`). Implementations may
//! fail for any network or permission reason; callers treat all failures alike.

use async_trait::async_trait;

use crate::constants::{REMOTE_TASKS_COLLECTION, REMOTE_USERS_COLLECTION};
use crate::entities::{Task, TaskPatch};

pub mod memory;

pub use memory::MemoryRemote;

/// Error types for remote document operations
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Invalid data: {0}")]
    InvalidData(#[from] serde_json::Error),

    #[error("Remote error: {0}")]
    Other(String),
}

/// Path of a user's task collection
pub fn collection_path(uid: &str) -> String {
    format!("{}/{}/{}", REMOTE_USERS_COLLECTION, uid, REMOTE_TASKS_COLLECTION)
}

/// Path of a single task document
pub fn document_path(uid: &str, task_id: &str) -> String {
    format!("{}/{}", collection_path(uid), task_id)
}

/// Per-user task document collection.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Write the full task document
    async fn create_task(&self, uid: &str, task: &Task) -> Result<(), RemoteError>;

    /// Merge the present patch fields into an existing document
    async fn update_task(&self, uid: &str, task_id: &str, patch: &TaskPatch) -> Result<(), RemoteError>;

    /// Remove the task document
    async fn delete_task(&self, uid: &str, task_id: &str) -> Result<(), RemoteError>;
}
