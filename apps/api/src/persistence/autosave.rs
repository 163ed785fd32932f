//! Debounced autosave.
//!
//! Each change restarts a quiet-period timer; only the latest document is saved
//! once the timer elapses, so a burst of edits becomes a single write. Failed
//! saves are not retried: the status flips to `Error` and the next change or an
//! explicit `flush` tries again. The in-memory document is never rolled back.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::editor::document::Document;
use crate::persistence::{DocumentStore, PersistError};

/// Default quiet period between the last change and the write.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(2000);

/// Save indicator shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SaveStatus {
    /// Durable copy matches the last applied change.
    Saved,
    /// Changes are waiting for the quiet period to elapse.
    Pending,
    Saving,
    Error { message: String },
}

enum Command {
    Changed(Arc<Document>),
    Flush(oneshot::Sender<Result<(), PersistError>>),
    Discard,
}

/// Handle to the per-document autosave task. Dropping it saves any pending
/// change and stops the task.
pub struct Autosaver {
    document_id: Uuid,
    tx: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<SaveStatus>,
}

impl Autosaver {
    /// Starts the autosave task. `current` is assumed to be already persisted.
    pub fn spawn(store: Arc<dyn DocumentStore>, quiet: Duration, current: Arc<Document>) -> Self {
        let document_id = current.id;
        let (tx, rx) = mpsc::unbounded_channel();
        let (status_tx, status) = watch::channel(SaveStatus::Saved);

        let worker = Worker {
            store,
            quiet,
            status: status_tx,
        };
        tokio::spawn(worker.run(rx, current));

        Self {
            document_id,
            tx,
            status,
        }
    }

    /// Records a new document state and restarts the quiet period.
    pub fn notify(&self, document: Arc<Document>) {
        if self.tx.send(Command::Changed(document)).is_err() {
            warn!("Autosave task has stopped; change not scheduled");
        }
    }

    /// Saves the latest state now, cancelling any pending timer.
    pub async fn flush(&self) -> Result<(), PersistError> {
        let unavailable = || PersistError::Unavailable(self.document_id);
        let (reply, response) = oneshot::channel();
        self.tx
            .send(Command::Flush(reply))
            .map_err(|_| unavailable())?;
        response.await.map_err(|_| unavailable())?
    }

    /// Stops the task without writing pending changes (document deleted).
    pub fn discard(&self) {
        let _ = self.tx.send(Command::Discard);
    }

    pub fn status(&self) -> SaveStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SaveStatus> {
        self.status.clone()
    }
}

struct Worker {
    store: Arc<dyn DocumentStore>,
    quiet: Duration,
    status: watch::Sender<SaveStatus>,
}

impl Worker {
    async fn run(self, mut rx: mpsc::UnboundedReceiver<Command>, mut latest: Arc<Document>) {
        let mut deadline: Option<Instant> = None;

        loop {
            let command = match deadline {
                Some(at) => tokio::select! {
                    command = rx.recv() => command,
                    _ = sleep_until(at) => {
                        deadline = None;
                        let _ = self.save(&latest).await;
                        continue;
                    }
                },
                None => rx.recv().await,
            };

            match command {
                Some(Command::Changed(document)) => {
                    latest = document;
                    deadline = Some(Instant::now() + self.quiet);
                    self.status.send_replace(SaveStatus::Pending);
                }
                Some(Command::Flush(reply)) => {
                    deadline = None;
                    let result = self.save(&latest).await;
                    let _ = reply.send(result);
                }
                Some(Command::Discard) => {
                    debug!("Autosave for {} discarded", latest.id);
                    break;
                }
                None => {
                    if deadline.is_some() {
                        let _ = self.save(&latest).await;
                    }
                    break;
                }
            }
        }
    }

    async fn save(&self, document: &Document) -> Result<(), PersistError> {
        self.status.send_replace(SaveStatus::Saving);
        match self.store.save(document.id, document).await {
            Ok(()) => {
                info!("Autosaved document {}", document.id);
                self.status.send_replace(SaveStatus::Saved);
                Ok(())
            }
            Err(e) => {
                warn!("Autosave of document {} failed: {e}", document.id);
                self.status.send_replace(SaveStatus::Error {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
