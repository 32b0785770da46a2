#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tidylist::scheduling::{
    CalendarEvent, CalendarHost, Notification, NotificationHost, Permission, SchedulingOptions, SchedulingSink,
};
use tidylist::storage::MemoryStorage;
use tidylist::{StoreOptions, TaskStore};

/// Notification host that records what it shows
pub struct FakeNotifications {
    permission: Mutex<Permission>,
    grant_on_request: bool,
    pub requests: AtomicUsize,
    pub shown: Mutex<Vec<Notification>>,
}

impl FakeNotifications {
    pub fn with_permission(permission: Permission) -> Arc<Self> {
        Arc::new(Self {
            permission: Mutex::new(permission),
            grant_on_request: true,
            requests: AtomicUsize::new(0),
            shown: Mutex::new(Vec::new()),
        })
    }

    pub fn granted() -> Arc<Self> {
        Self::with_permission(Permission::Granted)
    }

    pub fn refusing() -> Arc<Self> {
        Arc::new(Self {
            permission: Mutex::new(Permission::Default),
            grant_on_request: false,
            requests: AtomicUsize::new(0),
            shown: Mutex::new(Vec::new()),
        })
    }

    pub fn shown(&self) -> Vec<Notification> {
        self.shown.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationHost for FakeNotifications {
    fn permission(&self) -> Permission {
        *self.permission.lock().unwrap()
    }

    async fn request_permission(&self) -> Permission {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let outcome = if self.grant_on_request {
            Permission::Granted
        } else {
            Permission::Denied
        };
        *self.permission.lock().unwrap() = outcome;
        outcome
    }

    fn notify(&self, notification: &Notification) -> Result<()> {
        self.shown.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

/// Calendar host that records inserted events, optionally failing
#[derive(Default)]
pub struct FakeCalendar {
    pub fail: AtomicBool,
    pub events: Mutex<Vec<(String, CalendarEvent)>>,
}

impl FakeCalendar {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        let calendar = Self::default();
        calendar.fail.store(true, Ordering::SeqCst);
        Arc::new(calendar)
    }

    pub fn events(&self) -> Vec<(String, CalendarEvent)> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl CalendarHost for FakeCalendar {
    async fn insert_event(&self, calendar_id: &str, event: &CalendarEvent) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("calendar API unavailable");
        }
        self.events.lock().unwrap().push((calendar_id.to_string(), event.clone()));
        Ok(())
    }
}

pub fn memory_store() -> TaskStore {
    TaskStore::open(MemoryStorage::new(), StoreOptions::default()).unwrap()
}

pub fn store_on(storage: MemoryStorage) -> TaskStore {
    TaskStore::open(storage, StoreOptions::default()).unwrap()
}

pub fn sink_with(notifications: Arc<FakeNotifications>) -> SchedulingSink {
    SchedulingSink::new(SchedulingOptions::default()).with_notifications(notifications)
}

/// Let detached tasks on the current runtime make progress
pub async fn settle() {
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }
    tokio::time::sleep(Duration::from_millis(5)).await;
}
