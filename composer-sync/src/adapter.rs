//! The persistence worker.
//!
//! Editor changes are handed to a background task through a
//! [`PersistenceHandle`]. The task debounces them per scene, merges bursts
//! into one patch and writes each scene with the configured [`SceneSink`].
//! Sending never blocks and never fails because of the sink: write outcomes
//! are only reported on the status channel.

use composer_core::{SceneChange, SceneId};
use serde::Serialize;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::metrics;
use crate::queue::{Enqueued, PendingWrite, PendingWrites};
use crate::{SceneSink, SyncConfig, SyncError, SyncResult};

/// Outcome of one write, broadcast to subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SyncStatus {
    /// The scene's patch was stored.
    Written {
        /// Scene that was written.
        scene_id: SceneId,
        /// Newest revision included in the write.
        revision: u64,
    },
    /// The sink rejected the patch. It is kept until a retry is requested.
    Failed {
        /// Scene that failed.
        scene_id: SceneId,
        /// Newest revision included in the failed write.
        revision: u64,
        /// Sink error message.
        error: String,
    },
}

enum Request {
    Change(SceneChange),
    Retry(SceneId),
    Flush(oneshot::Sender<()>),
    Parked(oneshot::Sender<Vec<(SceneId, String)>>),
    Shutdown(oneshot::Sender<()>),
}

/// Handle to a running persistence task.
///
/// Dropping every clone of the sender side (including notifiers) lets the
/// task write what is scheduled and exit.
#[derive(Debug)]
pub struct PersistenceHandle {
    tx: mpsc::UnboundedSender<Request>,
    status: broadcast::Sender<SyncStatus>,
    task: JoinHandle<()>,
}

/// Spawn the persistence task on the current tokio runtime.
///
/// # Panics
///
/// Panics if called outside a tokio runtime.
#[must_use]
pub fn spawn_persistence<S: SceneSink>(sink: S, config: &SyncConfig) -> PersistenceHandle {
    let (tx, rx) = mpsc::unbounded_channel();
    let (status, _) = broadcast::channel(config.status_capacity.max(1));
    let worker = Worker {
        sink,
        queue: PendingWrites::new(config.debounce()),
        status: status.clone(),
    };
    let task = tokio::spawn(worker.run(rx));
    tracing::debug!("Persistence task started (debounce {}ms)", config.debounce_ms);
    PersistenceHandle { tx, status, task }
}

impl PersistenceHandle {
    /// Queue a change for writing.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Closed`] if the task has stopped.
    pub fn notify(&self, change: SceneChange) -> SyncResult<()> {
        self.send(Request::Change(change))
    }

    /// Closure suitable for [`Editor::set_on_change`](composer_core::Editor::set_on_change).
    #[must_use]
    pub fn notifier(&self) -> impl Fn(&SceneChange) + Send + Sync + 'static {
        let tx = self.tx.clone();
        move |change: &SceneChange| {
            if tx.send(Request::Change(change.clone())).is_err() {
                tracing::warn!(
                    "Dropping change for scene {}: persistence task closed",
                    change.scene_id
                );
            }
        }
    }

    /// Subscribe to write outcomes.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    /// Schedule a parked scene for an immediate write.
    ///
    /// Does nothing if the scene is not parked.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Closed`] if the task has stopped.
    pub fn retry(&self, scene_id: SceneId) -> SyncResult<()> {
        self.send(Request::Retry(scene_id))
    }

    /// Write everything scheduled without waiting for the debounce.
    ///
    /// Parked scenes stay parked.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Closed`] if the task has stopped.
    pub async fn flush(&self) -> SyncResult<()> {
        let (done_tx, done_rx) = oneshot::channel();
        self.send(Request::Flush(done_tx))?;
        done_rx.await.map_err(|_| SyncError::Closed)
    }

    /// Scenes whose last write failed, with the error.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Closed`] if the task has stopped.
    pub async fn parked(&self) -> SyncResult<Vec<(SceneId, String)>> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(Request::Parked(reply_tx))?;
        reply_rx.await.map_err(|_| SyncError::Closed)
    }

    /// Write everything scheduled, then stop the task.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Closed`] if the task had already stopped.
    pub async fn shutdown(self) -> SyncResult<()> {
        let (done_tx, done_rx) = oneshot::channel();
        self.send(Request::Shutdown(done_tx))?;
        let result = done_rx.await.map_err(|_| SyncError::Closed);
        if let Err(e) = self.task.await {
            tracing::warn!("Persistence task ended abnormally: {e}");
        }
        result
    }

    fn send(&self, request: Request) -> SyncResult<()> {
        self.tx.send(request).map_err(|_| SyncError::Closed)
    }
}

struct Worker<S> {
    sink: S,
    queue: PendingWrites,
    status: broadcast::Sender<SyncStatus>,
}

impl<S: SceneSink> Worker<S> {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Request>) {
        loop {
            let deadline = self.queue.next_due();
            tokio::select! {
                request = rx.recv() => match request {
                    Some(Request::Change(change)) => {
                        let outcome = match self.queue.enqueue(change, Instant::now()) {
                            Enqueued::Scheduled => "scheduled",
                            Enqueued::Coalesced => "coalesced",
                            Enqueued::Parked => "parked",
                        };
                        metrics::record_change(outcome);
                    }
                    Some(Request::Retry(scene_id)) => {
                        if self.queue.unpark(scene_id, Instant::now()) {
                            tracing::info!("Retrying write for scene {scene_id}");
                        }
                    }
                    Some(Request::Flush(done)) => {
                        let writes = self.queue.take_all();
                        self.write_all(writes).await;
                        let _ = done.send(());
                    }
                    Some(Request::Parked(reply)) => {
                        let _ = reply.send(self.queue.parked());
                    }
                    Some(Request::Shutdown(done)) => {
                        let writes = self.queue.take_all();
                        self.write_all(writes).await;
                        let _ = done.send(());
                        break;
                    }
                    None => {
                        let writes = self.queue.take_all();
                        self.write_all(writes).await;
                        break;
                    }
                },
                () = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    let writes = self.queue.take_due(Instant::now());
                    self.write_all(writes).await;
                }
            }
            metrics::set_queue_depth(self.queue.len(), self.queue.parked_len());
        }
        tracing::debug!("Persistence task stopped");
    }

    async fn write_all(&mut self, writes: Vec<PendingWrite>) {
        for write in writes {
            self.write_one(write).await;
        }
    }

    async fn write_one(&mut self, write: PendingWrite) {
        let scene_id = write.scene_id;
        let revision = write.revision;
        match self.sink.write(scene_id, &write.patch).await {
            Ok(()) => {
                metrics::record_write();
                tracing::debug!("Wrote scene {scene_id} at revision {revision}");
                let _ = self.status.send(SyncStatus::Written { scene_id, revision });
            }
            Err(err) => {
                let error = err.to_string();
                metrics::record_write_failure();
                tracing::warn!("Failed to write scene {scene_id} (revision {revision}): {error}");
                self.queue.park(write, error.clone());
                let _ = self.status.send(SyncStatus::Failed {
                    scene_id,
                    revision,
                    error,
                });
            }
        }
    }
}
