//! Constants used throughout the crate
//!
//! This module centralizes magic strings, default windows and log text
//! so the store and its collaborators agree on them.

use chrono::Duration;

// Persistence
/// Namespace of the persisted state blob
pub const STORAGE_NAMESPACE: &str = "todo-storage";
/// Application directory name under the platform data/config directories
pub const APP_DIR_NAME: &str = "tidylist";
/// Current schema version of the persisted state envelope
pub const STATE_SCHEMA_VERSION: u32 = 1;

// Retention
/// Days a completed task survives before the retention sweep removes it
pub const TASK_AUTO_DELETE_DAYS: i64 = 7;
/// Upper bound accepted for a configured retention window
pub const MAX_RETENTION_DAYS: i64 = 365;

// Reminders
/// Default lead time between a reminder and the task's due date
pub const REMINDER_LEAD_MINUTES: i64 = 60;
pub const NOTIFICATION_TITLE: &str = "Task Due Soon";
pub const NOTIFICATION_ICON: &str = "/favicon.ico";

// Calendar
pub const DEFAULT_CALENDAR_ID: &str = "primary";
pub const DEFAULT_TIME_ZONE: &str = "UTC";
/// Duration of the calendar event recorded for a completed task
pub const CALENDAR_EVENT_MINUTES: i64 = 30;

// Remote documents
pub const REMOTE_USERS_COLLECTION: &str = "users";
pub const REMOTE_TASKS_COLLECTION: &str = "tasks";

// Logging
/// Maximum number of lines kept in the in-memory diagnostic buffer
pub const MAX_LOG_ENTRIES: usize = 500;
pub const LOG_FILE_NAME: &str = "tidylist.log";

// Log Messages
pub const LOG_ERROR_REMOTE_CREATE: &str = "❌ Error adding task to remote store";
pub const LOG_ERROR_REMOTE_UPDATE: &str = "❌ Error updating task in remote store";
pub const LOG_ERROR_REMOTE_DELETE: &str = "❌ Error deleting task from remote store";
pub const LOG_ERROR_CALENDAR_SYNC: &str = "❌ Error syncing with calendar";
pub const LOG_ERROR_NOTIFICATION: &str = "❌ Error showing due-date notification";
pub const LOG_ERROR_PERSIST: &str = "❌ Failed to persist task state";

// UI Messages
pub const CONFIG_GENERATED: &str = "✅ Generated default configuration file";

/// Retention window as a duration
pub fn default_retention_window() -> Duration {
    Duration::days(TASK_AUTO_DELETE_DAYS)
}

/// Reminder lead time as a duration
pub fn default_reminder_lead() -> Duration {
    Duration::minutes(REMINDER_LEAD_MINUTES)
}
