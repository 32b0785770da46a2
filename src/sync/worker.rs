use log::{debug, error, info};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{lock_report, OutboxMessage, SharedReport, SyncOp, SyncOpKind};
use crate::constants::{LOG_ERROR_REMOTE_CREATE, LOG_ERROR_REMOTE_DELETE, LOG_ERROR_REMOTE_UPDATE};
use crate::remote::{RemoteError, RemoteStore};

/// Drains the outbox against a remote store, one operation at a time.
pub struct SyncWorker {
    remote: Arc<dyn RemoteStore>,
    rx: mpsc::UnboundedReceiver<OutboxMessage>,
    report: SharedReport,
}

impl SyncWorker {
    pub(crate) fn new(
        remote: Arc<dyn RemoteStore>,
        rx: mpsc::UnboundedReceiver<OutboxMessage>,
        report: SharedReport,
    ) -> Self {
        Self { remote, rx, report }
    }

    /// Run the worker on the current tokio runtime
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Process outbox messages until every [`Outbox`](super::Outbox) handle is dropped.
    pub async fn run(mut self) {
        info!("🔄 Sync worker started");

        while let Some(message) = self.rx.recv().await {
            match message {
                OutboxMessage::Op(op) => self.apply(op).await,
                OutboxMessage::Flush(done) => {
                    let _ = done.send(());
                }
            }
        }

        info!("Sync worker stopped");
    }

    async fn apply(&self, op: SyncOp) {
        let result = match &op.kind {
            SyncOpKind::Create(task) => self.remote.create_task(&op.uid, task).await,
            SyncOpKind::Update(patch) => self.remote.update_task(&op.uid, &op.task_id, patch).await,
            SyncOpKind::Delete => self.remote.delete_task(&op.uid, &op.task_id).await,
        };

        match result {
            Ok(()) => {
                debug!("✅ Outbox #{} {} task {} mirrored", op.seq, op.kind.name(), op.task_id);
                lock_report(&self.report).record_success();
            }
            Err(e) => {
                log_failure(&op, &e);
                lock_report(&self.report).record_failure(e.to_string());
            }
        }
    }
}

fn log_failure(op: &SyncOp, e: &RemoteError) {
    let prefix = match op.kind {
        SyncOpKind::Create(_) => LOG_ERROR_REMOTE_CREATE,
        SyncOpKind::Update(_) => LOG_ERROR_REMOTE_UPDATE,
        SyncOpKind::Delete => LOG_ERROR_REMOTE_DELETE,
    };
    error!("{} (task {}, outbox #{}): {}", prefix, op.task_id, op.seq, e);
}
