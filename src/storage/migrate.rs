//! Schema upgrades for persisted state blobs.
//!
//! Version 0 is the blob written by the web client's persistence middleware:
//! `{"state": {...}, "version": 0}`, or a bare state object. Its dates may be
//! empty strings, tasks may lack a priority and the user is a full provider
//! profile of which only `uid` and `email` are kept.

use log::{info, warn};
use serde_json::{Map, Value};

use super::StorageError;
use crate::constants::STATE_SCHEMA_VERSION;
use crate::utils::datetime::parse_optional_timestamp;

const DATE_FIELDS: [&str; 3] = ["dueDate", "createdAt", "completedAt"];

/// Split a raw blob into its version and state object
pub fn split_envelope(value: Value) -> Result<(u32, Value), StorageError> {
    let Value::Object(mut root) = value else {
        return Err(StorageError::InvalidState("top level is not an object".to_string()));
    };

    if let Some(state) = root.remove("state") {
        let version = match root.get("version") {
            None | Some(Value::Null) => 0,
            Some(v) => v
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| StorageError::InvalidState(format!("bad version field: {}", v)))?,
        };
        return Ok((version, state));
    }

    // Bare state without an envelope
    Ok((0, Value::Object(root)))
}

/// Bring a state object from `version` up to the current schema
pub fn upgrade(version: u32, state: Value) -> Result<Value, StorageError> {
    if version > STATE_SCHEMA_VERSION {
        return Err(StorageError::UnsupportedVersion {
            found: version,
            supported: STATE_SCHEMA_VERSION,
        });
    }

    let mut state = state;
    if version == 0 {
        info!("Migrating persisted state from version 0");
        state = upgrade_v0(state)?;
    }
    Ok(state)
}

fn upgrade_v0(state: Value) -> Result<Value, StorageError> {
    let Value::Object(mut state) = state else {
        return Err(StorageError::InvalidState("state is not an object".to_string()));
    };

    if let Some(Value::Array(tasks)) = state.get_mut("tasks") {
        for task in tasks.iter_mut() {
            if let Value::Object(task) = task {
                normalize_v0_task(task);
            }
        }
    }

    // Anything but a profile object means signed out
    if let Some(Value::Object(profile)) = state.remove("user") {
        let mut user = Map::new();
        if let Some(uid) = profile.get("uid") {
            user.insert("uid".to_string(), uid.clone());
        }
        if let Some(email) = profile.get("email").filter(|e| e.is_string()) {
            user.insert("email".to_string(), email.clone());
        }
        if user.contains_key("uid") {
            state.insert("user".to_string(), Value::Object(user));
        }
    }

    Ok(Value::Object(state))
}

fn normalize_v0_task(task: &mut Map<String, Value>) {
    for field in DATE_FIELDS {
        let parsed = match task.get(field) {
            Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => parse_optional_timestamp(s),
            _ => continue,
        };
        match parsed {
            Ok(Some(at)) => {
                task.insert(field.to_string(), Value::String(at.to_rfc3339()));
            }
            Ok(None) => {
                task.remove(field);
            }
            Err(e) => {
                warn!("Dropping unreadable {} in legacy task: {}", field, e);
                task.remove(field);
            }
        }
    }

    // Ids were millisecond timestamps and sometimes stored as numbers
    let numeric_id = match task.get("id") {
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };
    if let Some(id) = numeric_id {
        task.insert("id".to_string(), Value::String(id));
    }

    if matches!(task.get("priority"), Some(Value::String(p)) if p.is_empty()) {
        task.remove("priority");
    }
}
