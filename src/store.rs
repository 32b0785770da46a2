//! The task store.
//!
//! [`TaskStore`] owns the ordered task list and the user/session flags. Every
//! mutation is applied to local state and persisted before it returns; the
//! remote mirror is recorded in the [`Outbox`] afterwards and reminders and
//! calendar events go through the [`SchedulingSink`]. Nothing that happens
//! downstream of a commit can roll it back.
//!
//! The store is a plain value owned by the application root. Share it the way
//! the application needs (`Arc<Mutex<TaskStore>>`, a UI context, ...); it holds
//! no global state.

use anyhow::{Context, Result};
use chrono::Utc;
use log::{debug, error, info, warn};
use std::collections::HashSet;
use tokio::sync::watch;

use crate::config::Config;
use crate::constants::LOG_ERROR_PERSIST;
use crate::entities::{NewTask, Task, TaskPatch, User};
use crate::query::{filter_tasks, Progress, TaskFilter};
use crate::retention::RetentionPolicy;
use crate::scheduling::SchedulingSink;
use crate::storage::{JsonFileStorage, PersistedState, StateStorage};
use crate::sync::{Outbox, SyncOpKind};

/// Settings applied when opening a store
#[derive(Debug, Clone, PartialEq)]
pub struct StoreOptions {
    /// State used when nothing has been persisted yet
    pub initial: PersistedState,
    pub retention: RetentionPolicy,
    /// Whether due dates produce reminders at all
    pub reminders_enabled: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            initial: PersistedState::default(),
            retention: RetentionPolicy::default(),
            reminders_enabled: true,
        }
    }
}

pub struct TaskStore {
    tasks: Vec<Task>,
    dark_mode: bool,
    auto_delete_enabled: bool,
    google_calendar_sync: bool,
    user: Option<User>,
    storage: Box<dyn StateStorage>,
    scheduler: SchedulingSink,
    outbox: Option<Outbox>,
    retention: RetentionPolicy,
    reminders_enabled: bool,
}

impl TaskStore {
    /// Open a store, reading the persisted state once.
    ///
    /// Without persisted state the store starts from `options.initial`.
    ///
    /// # Errors
    /// Returns an error if the persisted blob cannot be read or decoded
    pub fn open(storage: impl StateStorage + 'static, options: StoreOptions) -> Result<Self> {
        let persisted = storage.load().context("Failed to load persisted task state")?;
        let restored = persisted.is_some();
        let state = persisted.unwrap_or(options.initial);

        if restored {
            info!("📂 Restored {} tasks from local storage", state.tasks.len());
        } else {
            info!("📂 No persisted state, starting fresh");
        }

        Ok(Self {
            tasks: state.tasks,
            dark_mode: state.dark_mode,
            auto_delete_enabled: state.auto_delete_enabled,
            google_calendar_sync: state.google_calendar_sync,
            user: state.user,
            storage: Box::new(storage),
            scheduler: SchedulingSink::default(),
            outbox: None,
            retention: options.retention,
            reminders_enabled: options.reminders_enabled,
        })
    }

    /// Open the JSON file store a configuration points to
    pub fn from_config(config: &Config) -> Result<Self> {
        let storage = JsonFileStorage::from_config(config)?;
        debug!("Opening task state at {}", storage.path().display());
        Self::open(storage, config.store_options())
    }

    /// Attach the scheduling sink and re-arm reminders for open tasks with a due date.
    pub fn with_scheduler(mut self, scheduler: SchedulingSink) -> Self {
        self.scheduler = scheduler;
        self.restore_reminders();
        self
    }

    /// Attach the outbox used to mirror mutations remotely
    pub fn with_outbox(mut self, outbox: Outbox) -> Self {
        self.outbox = Some(outbox);
        self
    }

    // ---- read side ----

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn filtered(&self, filter: &TaskFilter) -> Vec<&Task> {
        filter_tasks(&self.tasks, filter)
    }

    pub fn progress(&self) -> Progress {
        Progress::of(&self.tasks)
    }

    pub fn dark_mode(&self) -> bool {
        self.dark_mode
    }

    pub fn auto_delete_enabled(&self) -> bool {
        self.auto_delete_enabled
    }

    pub fn google_calendar_sync(&self) -> bool {
        self.google_calendar_sync
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn scheduler(&self) -> &SchedulingSink {
        &self.scheduler
    }

    pub fn outbox(&self) -> Option<&Outbox> {
        self.outbox.as_ref()
    }

    /// Current state in its persisted form
    pub fn snapshot(&self) -> PersistedState {
        PersistedState {
            tasks: self.tasks.clone(),
            dark_mode: self.dark_mode,
            auto_delete_enabled: self.auto_delete_enabled,
            google_calendar_sync: self.google_calendar_sync,
            user: self.user.clone(),
        }
    }

    // ---- mutations ----

    /// Append a new task.
    ///
    /// # Returns
    /// The new task id, or `None` if the title is blank
    pub fn add_task(&mut self, input: NewTask) -> Option<String> {
        let Some(task) = Task::from_new(input, Utc::now()) else {
            debug!("Ignoring task with a blank title");
            return None;
        };

        let id = task.id.clone();
        self.tasks.push(task.clone());
        self.persist();

        if task.due_date.is_some() {
            self.schedule_reminder(&task);
        }
        self.mirror(&id, SyncOpKind::Create(task));

        debug!("➕ Added task {}", id);
        Some(id)
    }

    /// Merge `patch` into the task with `id`.
    ///
    /// Completing a task stamps `completed_at`. When auto-delete is on, the
    /// retention sweep then runs over the whole list, so other completed
    /// tasks past the window are purged too. Purges are not mirrored remotely.
    ///
    /// # Returns
    /// `false` if no task has this id; nothing changes in that case
    pub fn update_task(&mut self, id: &str, patch: TaskPatch) -> bool {
        let patch = patch.sanitized();
        let now = Utc::now();

        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            debug!("Ignoring update for unknown task {}", id);
            return false;
        };
        task.apply(&patch, now);
        let updated = task.clone();

        // Only open tasks with a due date hold a reminder
        if patch.clears_due_date() || patch.marks_completed() {
            self.scheduler.cancel(id);
        } else if patch.sets_due_date() || (patch.reopens() && updated.due_date.is_some()) {
            self.schedule_reminder(&updated);
        }

        if patch.marks_completed() && self.google_calendar_sync {
            self.scheduler.sync_completion_to_calendar(&updated);
        }

        if self.auto_delete_enabled {
            self.sweep_completed(now);
        }

        self.persist();

        if !patch.is_empty() {
            self.mirror(id, SyncOpKind::Update(patch));
        }
        true
    }

    /// Remove the task with `id`.
    ///
    /// # Returns
    /// `false` if no task has this id
    pub fn delete_task(&mut self, id: &str) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        if self.tasks.len() == before {
            debug!("Ignoring delete for unknown task {}", id);
            return false;
        }

        self.scheduler.cancel(id);
        self.persist();
        self.mirror(id, SyncOpKind::Delete);
        true
    }

    /// Replace the list with `new_order` verbatim.
    ///
    /// The caller is trusted to pass a permutation of the current tasks; a
    /// mismatch is logged, and reminders of tasks that disappeared are cancelled.
    pub fn reorder_tasks(&mut self, new_order: Vec<Task>) {
        let incoming: HashSet<&str> = new_order.iter().map(|t| t.id.as_str()).collect();
        let dropped: Vec<String> = self
            .tasks
            .iter()
            .filter(|t| !incoming.contains(t.id.as_str()))
            .map(|t| t.id.clone())
            .collect();

        if !dropped.is_empty() || new_order.len() != self.tasks.len() {
            warn!(
                "Reorder is not a permutation: {} tasks before, {} after, {} dropped",
                self.tasks.len(),
                new_order.len(),
                dropped.len()
            );
        }
        for id in &dropped {
            self.scheduler.cancel(id);
        }

        self.tasks = new_order;
        self.persist();
    }

    /// Move the task at `from` to position `to`, as a drag-and-drop does.
    ///
    /// # Returns
    /// `false` if either index is out of range
    pub fn move_task(&mut self, from: usize, to: usize) -> bool {
        let len = self.tasks.len();
        if from >= len || to >= len {
            return false;
        }

        let mut items = self.tasks.clone();
        let item = items.remove(from);
        items.insert(to, item);
        self.reorder_tasks(items);
        true
    }

    pub fn toggle_dark_mode(&mut self) -> bool {
        self.dark_mode = !self.dark_mode;
        self.persist();
        self.dark_mode
    }

    pub fn toggle_auto_delete(&mut self) -> bool {
        self.auto_delete_enabled = !self.auto_delete_enabled;
        self.persist();
        self.auto_delete_enabled
    }

    pub fn toggle_google_calendar_sync(&mut self) -> bool {
        self.google_calendar_sync = !self.google_calendar_sync;
        self.persist();
        self.google_calendar_sync
    }

    /// Replace the signed-in identity.
    ///
    /// Existing local tasks are not pushed to the new identity's collection.
    pub fn set_user(&mut self, user: Option<User>) {
        match &user {
            Some(u) => info!("👤 Store now syncing as {}", u.uid),
            None => info!("👤 Store is local-only"),
        }
        self.user = user;
        self.persist();
    }

    /// Apply the identity currently published by an auth session, if it differs.
    ///
    /// # Returns
    /// `true` if the stored identity changed
    pub fn follow_auth(&mut self, auth: &mut watch::Receiver<Option<User>>) -> bool {
        let current = auth.borrow_and_update().clone();
        if current == self.user {
            return false;
        }
        self.set_user(current);
        true
    }

    // ---- internals ----

    fn schedule_reminder(&mut self, task: &Task) {
        if self.reminders_enabled {
            self.scheduler.schedule_due_notification(task);
        }
    }

    fn restore_reminders(&mut self) {
        if !self.reminders_enabled {
            return;
        }
        let open: Vec<Task> = self
            .tasks
            .iter()
            .filter(|t| !t.completed && t.due_date.is_some())
            .cloned()
            .collect();
        for task in &open {
            self.scheduler.schedule_due_notification(task);
        }
    }

    fn sweep_completed(&mut self, now: chrono::DateTime<Utc>) {
        let tasks = std::mem::take(&mut self.tasks);
        let (kept, purged) = self.retention.partition(tasks, now);
        self.tasks = kept;

        if !purged.is_empty() {
            info!("🧹 Auto-deleted {} completed tasks", purged.len());
        }
        for id in &purged {
            self.scheduler.cancel(id);
        }
    }

    fn mirror(&self, task_id: &str, kind: SyncOpKind) {
        let (Some(outbox), Some(user)) = (&self.outbox, &self.user) else {
            return;
        };
        outbox.record(&user.uid, task_id, kind);
    }

    fn persist(&self) {
        if let Err(e) = self.storage.save(&self.snapshot()) {
            error!("{}: {}", LOG_ERROR_PERSIST, e);
        }
    }
}
