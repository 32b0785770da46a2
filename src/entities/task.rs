use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::utils::datetime::format_due_date;

/// Task priority as shown in the list and used by the priority filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => anyhow::bail!("Unknown priority '{}'", other),
        }
    }
}

/// A single to-do item.
///
/// Field names serialize in camelCase so persisted blobs and remote documents
/// keep the shape the web client has always written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Build a task from creation input, assigning a fresh id and `created_at`.
    ///
    /// Returns `None` when the title is empty after trimming.
    pub fn from_new(input: NewTask, now: DateTime<Utc>) -> Option<Self> {
        let title = input.title.trim();
        if title.is_empty() {
            return None;
        }

        Some(Self {
            id: generate_task_id(),
            title: title.to_string(),
            priority: input.priority,
            completed: input.completed,
            due_date: input.due_date,
            created_at: now,
            // Only a completion transition stamps this, never creation
            completed_at: None,
        })
    }

    /// Merge a patch into this task.
    ///
    /// `completed_at` is stamped with `now` only on a false → true transition
    /// and is left untouched when a task is reopened.
    pub fn apply(&mut self, patch: &TaskPatch, now: DateTime<Utc>) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(completed) = patch.completed {
            if completed && !self.completed {
                self.completed_at = Some(now);
            }
            self.completed = completed;
        }
    }

    /// Due date as shown in the list, e.g. "Oct 18, 2026"
    pub fn due_label(&self) -> Option<String> {
        self.due_date.map(format_due_date)
    }
}

/// Generate a task id.
///
/// UUIDv7 ids are time-ordered and stay unique for calls issued within the
/// same millisecond.
pub fn generate_task_id() -> String {
    Uuid::now_v7().to_string()
}

/// Input for creating a task.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub priority: Priority,
    pub completed: bool,
    pub due_date: Option<DateTime<Utc>>,
}

impl NewTask {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    pub fn due(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }
}

/// Partial update of a task's mutable fields.
///
/// Only the fields that are set are serialized, which makes the patch itself
/// the payload of a remote partial update. `due_date: Some(None)` clears the
/// due date and serializes as `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<DateTime<Utc>>>,
}

impl TaskPatch {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    pub fn due(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(Some(due_date));
        self
    }

    pub fn clear_due(mut self) -> Self {
        self.due_date = Some(None);
        self
    }

    /// Drop fields that would violate task invariants.
    ///
    /// A title that is empty after trimming is removed; a kept title is trimmed.
    pub fn sanitized(mut self) -> Self {
        self.title = self
            .title
            .map(|title| title.trim().to_string())
            .filter(|title| !title.is_empty());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.priority.is_none() && self.completed.is_none() && self.due_date.is_none()
    }

    /// Whether this patch sets a new due date (as opposed to clearing it).
    pub fn sets_due_date(&self) -> bool {
        matches!(self.due_date, Some(Some(_)))
    }

    pub fn clears_due_date(&self) -> bool {
        matches!(self.due_date, Some(None))
    }

    pub fn marks_completed(&self) -> bool {
        self.completed == Some(true)
    }

    pub fn reopens(&self) -> bool {
        self.completed == Some(false)
    }
}
