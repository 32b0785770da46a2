use chrono::{DateTime, Duration, Utc};
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use super::{CalendarEvent, CalendarHost, Notification, NotificationHost, Permission};
use crate::constants::{
    default_reminder_lead, CALENDAR_EVENT_MINUTES, DEFAULT_CALENDAR_ID, DEFAULT_TIME_ZONE, LOG_ERROR_CALENDAR_SYNC,
    LOG_ERROR_NOTIFICATION,
};
use crate::entities::Task;

/// Timing and calendar settings for the sink
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulingOptions {
    /// How long before the due date the reminder fires
    pub reminder_lead: Duration,
    pub calendar_id: String,
    pub time_zone: String,
    pub event_duration: Duration,
}

impl Default for SchedulingOptions {
    fn default() -> Self {
        Self {
            reminder_lead: default_reminder_lead(),
            calendar_id: DEFAULT_CALENDAR_ID.to_string(),
            time_zone: DEFAULT_TIME_ZONE.to_string(),
            event_duration: Duration::minutes(CALENDAR_EVENT_MINUTES),
        }
    }
}

struct Reminder {
    fire_at: DateTime<Utc>,
    handle: JoinHandle<()>,
}

/// Owns due-date reminders and dispatches calendar events.
///
/// At most one reminder is live per task id: scheduling again cancels the
/// previous timer first. Timers run on the ambient tokio runtime; without one
/// nothing is scheduled.
pub struct SchedulingSink {
    notifications: Option<Arc<dyn NotificationHost>>,
    calendar: Option<Arc<dyn CalendarHost>>,
    options: SchedulingOptions,
    reminders: HashMap<String, Reminder>,
}

impl Default for SchedulingSink {
    fn default() -> Self {
        Self::new(SchedulingOptions::default())
    }
}

impl SchedulingSink {
    /// Create a sink with no hosts attached; every call is a no-op until one is.
    pub fn new(options: SchedulingOptions) -> Self {
        Self {
            notifications: None,
            calendar: None,
            options,
            reminders: HashMap::new(),
        }
    }

    pub fn with_notifications(mut self, host: Arc<dyn NotificationHost>) -> Self {
        self.notifications = Some(host);
        self
    }

    pub fn with_calendar(mut self, host: Arc<dyn CalendarHost>) -> Self {
        self.calendar = Some(host);
        self
    }

    pub fn options(&self) -> &SchedulingOptions {
        &self.options
    }

    pub fn has_calendar(&self) -> bool {
        self.calendar.is_some()
    }

    /// Schedule the due-date reminder for `task`, replacing any earlier one.
    ///
    /// Completed tasks never get a reminder.
    ///
    /// # Returns
    /// `true` if a reminder timer was started
    pub fn schedule_due_notification(&mut self, task: &Task) -> bool {
        self.cancel(&task.id);

        if task.completed {
            return false;
        }
        let Some(due) = task.due_date else {
            return false;
        };
        let Some(host) = self.notifications.clone() else {
            return false;
        };

        let permission = host.permission();
        if !permission.may_notify() {
            debug!("Notifications unavailable ({:?}), no reminder for task {}", permission, task.id);
            return false;
        }

        let now = Utc::now();
        let time_until_due = due - now;
        if time_until_due <= Duration::zero() {
            return false;
        }

        // Due within the lead time: no catch-up reminder
        let delay = time_until_due - self.options.reminder_lead;
        if delay <= Duration::zero() {
            debug!("Task {} is due within the reminder lead time, skipping", task.id);
            return false;
        }

        let Ok(runtime) = Handle::try_current() else {
            warn!("No async runtime available, reminder for task {} not scheduled", task.id);
            return false;
        };

        let sleep_for = delay.to_std().unwrap_or_default();
        let notification = Notification::due_soon(task, self.options.reminder_lead);
        let handle = runtime.spawn(async move {
            if permission == Permission::Default && host.request_permission().await != Permission::Granted {
                debug!("Notification permission refused, dropping reminder for task {}", notification.task_id);
                return;
            }

            tokio::time::sleep(sleep_for).await;

            if let Err(e) = host.notify(&notification) {
                error!("{}: {:#}", LOG_ERROR_NOTIFICATION, e);
            }
        });

        info!("⏰ Reminder for task {} scheduled at {}", task.id, now + delay);
        self.reminders.insert(
            task.id.clone(),
            Reminder {
                fire_at: now + delay,
                handle,
            },
        );
        true
    }

    /// Cancel the reminder for a task, if one is pending
    pub fn cancel(&mut self, task_id: &str) -> bool {
        match self.reminders.remove(task_id) {
            Some(reminder) => {
                let was_pending = !reminder.handle.is_finished();
                reminder.handle.abort();
                was_pending
            }
            None => false,
        }
    }

    pub fn cancel_all(&mut self) {
        for (_, reminder) in self.reminders.drain() {
            reminder.handle.abort();
        }
    }

    /// Number of reminders that have not fired yet.
    ///
    /// A reminder waiting on a permission prompt counts until the prompt is
    /// refused; its timer then ends without firing and it stops counting.
    pub fn active_reminders(&self) -> usize {
        self.reminders.values().filter(|r| !r.handle.is_finished()).count()
    }

    /// Fire time of the pending reminder for a task
    pub fn reminder_for(&self, task_id: &str) -> Option<DateTime<Utc>> {
        self.reminders
            .get(task_id)
            .filter(|r| !r.handle.is_finished())
            .map(|r| r.fire_at)
    }

    /// Record a completed task on the connected calendar.
    ///
    /// The event is stamped with the time of this call, not the task's
    /// `completed_at`.
    ///
    /// # Returns
    /// `true` if an insert was dispatched
    pub fn sync_completion_to_calendar(&self, task: &Task) -> bool {
        if !task.completed {
            return false;
        }
        let Some(calendar) = self.calendar.clone() else {
            return false;
        };
        let Ok(runtime) = Handle::try_current() else {
            warn!("No async runtime available, calendar sync for task {} skipped", task.id);
            return false;
        };

        let event =
            CalendarEvent::for_completed_task(task, Utc::now(), self.options.event_duration, &self.options.time_zone);
        let calendar_id = self.options.calendar_id.clone();
        let task_id = task.id.clone();
        runtime.spawn(async move {
            match calendar.insert_event(&calendar_id, &event).await {
                Ok(()) => info!("📅 Completion of task {} added to calendar '{}'", task_id, calendar_id),
                Err(e) => error!("{}: {:#}", LOG_ERROR_CALENDAR_SYNC, e),
            }
        });
        true
    }
}

impl Drop for SchedulingSink {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
