//! Retention policy for completed tasks.
//!
//! Incomplete tasks are always kept. A completed task is kept while fewer
//! than `window` whole days have elapsed since its `completed_at`; a completed
//! task without a stamp counts as completed at `now` and is kept.

use chrono::{DateTime, Duration, Utc};

use crate::constants::default_retention_window;
use crate::entities::Task;
use crate::utils::datetime::whole_days_between;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    window: Duration,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            window: default_retention_window(),
        }
    }
}

impl RetentionPolicy {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    pub fn from_days(days: i64) -> Self {
        Self::new(Duration::days(days))
    }

    pub fn window_days(&self) -> i64 {
        self.window.num_days()
    }

    /// Whether a single task survives at `now`
    pub fn keeps(&self, task: &Task, now: DateTime<Utc>) -> bool {
        if !task.completed {
            return true;
        }
        let completed_at = task.completed_at.unwrap_or(now);
        whole_days_between(now, completed_at) < self.window_days()
    }

    /// Return the tasks that survive at `now`, preserving order.
    pub fn retain(&self, tasks: Vec<Task>, now: DateTime<Utc>) -> Vec<Task> {
        self.partition(tasks, now).0
    }

    /// Split tasks into survivors and the ids of purged tasks, preserving order.
    pub fn partition(&self, tasks: Vec<Task>, now: DateTime<Utc>) -> (Vec<Task>, Vec<String>) {
        let mut kept = Vec::with_capacity(tasks.len());
        let mut purged = Vec::new();
        for task in tasks {
            if self.keeps(&task, now) {
                kept.push(task);
            } else {
                purged.push(task.id);
            }
        }
        (kept, purged)
    }
}

/// Apply the default seven-day policy.
pub fn retain(tasks: Vec<Task>, now: DateTime<Utc>) -> Vec<Task> {
    RetentionPolicy::default().retain(tasks, now)
}
