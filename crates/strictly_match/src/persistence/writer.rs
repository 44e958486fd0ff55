//! Background task that performs saves in order without blocking gameplay.

use std::sync::Arc;

use strictly_chess::{SessionMeta, StoredPly};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use crate::persistence::PersistenceGateway;

#[derive(Debug)]
struct SaveRequest {
    session_id: String,
    meta: SessionMeta,
    plies: Vec<StoredPly>,
}

/// Handle to the writer task. Saves are queued and applied in order.
#[derive(Debug)]
pub struct PersistenceWriter {
    tx: mpsc::UnboundedSender<SaveRequest>,
    task: JoinHandle<()>,
}

impl PersistenceWriter {
    /// Spawns the writer task over `gateway`.
    #[instrument(skip(gateway))]
    pub fn spawn(gateway: Arc<dyn PersistenceGateway>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<SaveRequest>();
        let task = tokio::spawn(async move {
            while let Some(request) = rx.recv().await {
                let gateway = Arc::clone(&gateway);
                let session_id = request.session_id.clone();
                let outcome = tokio::task::spawn_blocking(move || {
                    gateway.save_meta(&request.session_id, &request.meta)?;
                    gateway.save(&request.session_id, &request.plies)
                })
                .await;
                match outcome {
                    Ok(Ok(())) => debug!(session_id = %session_id, "Session saved"),
                    Ok(Err(e)) => warn!(session_id = %session_id, error = %e, "Save failed, continuing in memory"),
                    Err(e) => error!(session_id = %session_id, error = %e, "Save task panicked"),
                }
            }
            debug!("Persistence writer stopped");
        });
        Self { tx, task }
    }

    /// Queues a save of the session's settings and plies. Never blocks; a
    /// stopped writer only logs.
    pub fn save(&self, session_id: &str, meta: SessionMeta, plies: Vec<StoredPly>) {
        let request = SaveRequest {
            session_id: session_id.to_string(),
            meta,
            plies,
        };
        if self.tx.send(request).is_err() {
            warn!(session_id = %session_id, "Persistence writer is gone, save dropped");
        }
    }

    /// Waits for every queued save to finish, then stops the task.
    #[instrument(skip(self))]
    pub async fn flush(self) {
        let Self { tx, task } = self;
        drop(tx);
        if let Err(e) = task.await {
            error!(error = %e, "Persistence writer failed");
        }
    }
}
