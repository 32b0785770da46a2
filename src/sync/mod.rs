//! Outbox for mirroring local mutations to the remote store.
//!
//! The store never talks to the remote directly. After each local commit it
//! records a [`SyncOp`] in the [`Outbox`]; a single [`SyncWorker`] drains the
//! outbox in order against a [`RemoteStore`](crate::remote::RemoteStore).
//!
//! Because one worker applies operations one at a time, remote calls for a
//! task land in the order the local mutations were committed. Each attempt is
//! made once: failures are logged, counted in the [`SyncReport`] and dropped.

pub mod worker;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};

use crate::entities::{Task, TaskPatch};
use crate::remote::RemoteStore;

pub use worker::SyncWorker;

/// Remote mutation carried by a [`SyncOp`]
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOpKind {
    Create(Task),
    Update(TaskPatch),
    Delete,
}

impl SyncOpKind {
    pub fn name(&self) -> &'static str {
        match self {
            SyncOpKind::Create(_) => "create",
            SyncOpKind::Update(_) => "update",
            SyncOpKind::Delete => "delete",
        }
    }
}

/// One recorded remote mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncOp {
    /// Monotonic per-outbox sequence number, in local commit order
    pub seq: u64,
    pub uid: String,
    pub task_id: String,
    pub kind: SyncOpKind,
}

pub(crate) enum OutboxMessage {
    Op(SyncOp),
    Flush(oneshot::Sender<()>),
}

/// Non-blocking view of how remote mirroring is going.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    pub dispatched: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub last_error: Option<String>,
    pub last_success: Option<DateTime<Utc>>,
}

/// Coarse status derived from a [`SyncReport`], suitable for an indicator.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncStatus {
    /// Nothing waiting and the last attempt succeeded (or nothing was attempted)
    Idle,
    /// Operations recorded but not attempted yet
    InProgress { pending: u64 },
    /// The most recent attempt failed
    Error { message: String },
}

impl SyncReport {
    pub fn pending(&self) -> u64 {
        self.dispatched.saturating_sub(self.succeeded + self.failed)
    }

    pub fn status(&self) -> SyncStatus {
        let pending = self.pending();
        if pending > 0 {
            return SyncStatus::InProgress { pending };
        }
        match &self.last_error {
            Some(message) => SyncStatus::Error {
                message: message.clone(),
            },
            None => SyncStatus::Idle,
        }
    }

    pub(crate) fn record_success(&mut self) {
        self.succeeded += 1;
        self.last_error = None;
        self.last_success = Some(Utc::now());
    }

    pub(crate) fn record_failure(&mut self, message: String) {
        self.failed += 1;
        self.last_error = Some(message);
    }
}

pub(crate) type SharedReport = Arc<Mutex<SyncReport>>;

pub(crate) fn lock_report(report: &SharedReport) -> std::sync::MutexGuard<'_, SyncReport> {
    report.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Handle for recording remote mutations. Cheap to clone.
#[derive(Clone)]
pub struct Outbox {
    tx: mpsc::UnboundedSender<OutboxMessage>,
    next_seq: Arc<AtomicU64>,
    report: SharedReport,
}

impl Outbox {
    /// Create an outbox and the worker that drains it into `remote`.
    ///
    /// The worker must be driven (`tokio::spawn(worker.run())` or
    /// [`SyncWorker::spawn`]) for anything to reach the remote.
    pub fn channel(remote: Arc<dyn RemoteStore>) -> (Outbox, SyncWorker) {
        let (tx, rx) = mpsc::unbounded_channel();
        let report: SharedReport = Arc::default();
        let outbox = Outbox {
            tx,
            next_seq: Arc::new(AtomicU64::new(1)),
            report: Arc::clone(&report),
        };
        (outbox, SyncWorker::new(remote, rx, report))
    }

    /// Record a mutation for `task_id` in the collection of `uid`.
    ///
    /// # Returns
    /// The sequence number assigned, or `None` if the worker has shut down
    pub fn record(&self, uid: &str, task_id: &str, kind: SyncOpKind) -> Option<u64> {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let op = SyncOp {
            seq,
            uid: uid.to_string(),
            task_id: task_id.to_string(),
            kind,
        };
        debug!("Outbox #{}: {} task {} for user {}", seq, op.kind.name(), op.task_id, op.uid);

        // Count before sending so the worker can never observe more results than dispatches
        lock_report(&self.report).dispatched += 1;
        if self.tx.send(OutboxMessage::Op(op)).is_err() {
            warn!("Sync worker is not running, dropping outbox entry #{}", seq);
            let mut report = lock_report(&self.report);
            report.record_failure("sync worker is not running".to_string());
            return None;
        }
        Some(seq)
    }

    /// Wait until every operation recorded before this call has been attempted.
    ///
    /// Returns immediately if the worker has shut down.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.tx.send(OutboxMessage::Flush(done_tx)).is_err() {
            return;
        }
        let _ = done_rx.await;
    }

    pub fn report(&self) -> SyncReport {
        lock_report(&self.report).clone()
    }

    pub fn status(&self) -> SyncStatus {
        self.report().status()
    }
}
