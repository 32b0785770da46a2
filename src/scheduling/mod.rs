//! Scheduling sink for platform side effects.
//!
//! The store hands tasks to the [`SchedulingSink`], which turns due dates into
//! one-shot reminders on a [`NotificationHost`] and completions into events on
//! an optional [`CalendarHost`]. Both hosts are fire-and-forget: their failures
//! are logged and never reach the caller.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::constants::{NOTIFICATION_ICON, NOTIFICATION_TITLE};
use crate::entities::Task;

pub mod sink;

pub use sink::{SchedulingOptions, SchedulingSink};

/// Notification permission as reported by the host environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
    /// The user has not been asked yet
    Default,
    /// The host has no notification support at all
    Unsupported,
}

impl Permission {
    /// Whether a reminder may still end up being shown
    pub fn may_notify(&self) -> bool {
        matches!(self, Permission::Granted | Permission::Default)
    }
}

/// A notification shown by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub task_id: String,
    pub title: String,
    pub body: String,
    pub icon: String,
}

impl Notification {
    /// Reminder for a task due within `lead`
    pub fn due_soon(task: &Task, lead: Duration) -> Self {
        Self {
            task_id: task.id.clone(),
            title: NOTIFICATION_TITLE.to_string(),
            body: format!("The task \"{}\" is due in {}", task.title, describe_lead(lead)),
            icon: NOTIFICATION_ICON.to_string(),
        }
    }
}

fn describe_lead(lead: Duration) -> String {
    let minutes = lead.num_minutes();
    match minutes {
        60 => "1 hour".to_string(),
        m if m > 60 && m % 60 == 0 => format!("{} hours", m / 60),
        1 => "1 minute".to_string(),
        m => format!("{} minutes", m),
    }
}

/// Start or end of a calendar event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    pub date_time: DateTime<Utc>,
    pub time_zone: String,
}

/// Calendar event recorded when a task is completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarEvent {
    pub summary: String,
    pub description: String,
    pub start: EventTime,
    pub end: EventTime,
}

impl CalendarEvent {
    /// Event for a completed task, anchored at the moment of sync
    pub fn for_completed_task(task: &Task, now: DateTime<Utc>, duration: Duration, time_zone: &str) -> Self {
        Self {
            summary: format!("Completed: {}", task.title),
            description: format!("Task completed on {}", now.format("%-m/%-d/%Y")),
            start: EventTime {
                date_time: now,
                time_zone: time_zone.to_string(),
            },
            end: EventTime {
                date_time: now + duration,
                time_zone: time_zone.to_string(),
            },
        }
    }
}

/// Platform notification capability.
#[async_trait]
pub trait NotificationHost: Send + Sync {
    /// Current permission, without prompting
    fn permission(&self) -> Permission;

    /// Prompt for permission and return the outcome
    async fn request_permission(&self) -> Permission;

    /// Show a notification now
    fn notify(&self, notification: &Notification) -> Result<()>;
}

/// Connected calendar capability. Absence is a normal configuration.
#[async_trait]
pub trait CalendarHost: Send + Sync {
    async fn insert_event(&self, calendar_id: &str, event: &CalendarEvent) -> Result<()>;
}
