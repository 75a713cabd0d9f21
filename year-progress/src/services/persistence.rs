//! Background persistence writer
//!
//! All settings writes go through one queue drained by one task, so they
//! land in the order the mutations happened. Callers never wait on a write
//! and never see its errors; failures are logged and dropped, and the next
//! mutation writes the full record again.

use crate::config::SETTINGS_KEY;
use crate::error::Result;
use crate::services::sync_bridge::SyncBridge;
use crate::settings::DotSettings;
use crate::storage::KeyValueStore;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

enum PersistJob {
    /// Write the record to the app store, then mirror it
    Save(DotSettings),
    /// Mirror only
    Mirror(DotSettings),
    /// Remove the record from the app store and empty the shared namespace
    Clear,
    Flush(oneshot::Sender<()>),
}

/// Handle for enqueueing writes
#[derive(Clone)]
pub struct PersistenceQueue {
    tx: mpsc::UnboundedSender<PersistJob>,
}

impl PersistenceQueue {
    /// Start the writer task on the current tokio runtime.
    ///
    /// The task exits once every handle is dropped and the queue is drained.
    pub fn spawn(app_store: Arc<dyn KeyValueStore>, bridge: SyncBridge) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = PersistenceWorker { app_store, bridge };
        tokio::spawn(worker.run(rx));
        Self { tx }
    }

    pub fn save(&self, settings: DotSettings) {
        self.enqueue(PersistJob::Save(settings));
    }

    pub fn mirror(&self, settings: DotSettings) {
        self.enqueue(PersistJob::Mirror(settings));
    }

    pub fn clear(&self) {
        self.enqueue(PersistJob::Clear);
    }

    /// Wait until every job enqueued before this call has run
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        self.enqueue(PersistJob::Flush(done_tx));
        // A closed channel means the writer is gone; nothing left to wait for
        let _ = done_rx.await;
    }

    fn enqueue(&self, job: PersistJob) {
        if self.tx.send(job).is_err() {
            tracing::error!("Settings writer has stopped, dropping persistence job");
        }
    }
}

struct PersistenceWorker {
    app_store: Arc<dyn KeyValueStore>,
    bridge: SyncBridge,
}

impl PersistenceWorker {
    async fn run(self, mut rx: mpsc::UnboundedReceiver<PersistJob>) {
        tracing::debug!("Settings writer started");

        while let Some(job) = rx.recv().await {
            self.handle(job).await;
        }

        tracing::debug!("Settings writer stopped");
    }

    async fn handle(&self, job: PersistJob) {
        match job {
            PersistJob::Save(settings) => {
                // The mirror still runs if the app store write fails
                if let Err(e) = self.write_app_store(&settings).await {
                    tracing::error!("Failed to save settings: {}", e);
                }
                self.mirror(&settings).await;
            }
            PersistJob::Mirror(settings) => self.mirror(&settings).await,
            PersistJob::Clear => {
                if let Err(e) = self.app_store.remove_item(SETTINGS_KEY).await {
                    tracing::error!("Failed to clear stored settings: {}", e);
                } else {
                    tracing::info!("Stored settings cleared");
                }
                if let Err(e) = self.bridge.clear().await {
                    tracing::error!(
                        "Failed to clear shared namespace {}: {}",
                        self.bridge.namespace(),
                        e
                    );
                }
            }
            PersistJob::Flush(done) => {
                let _ = done.send(());
            }
        }
    }

    async fn write_app_store(&self, settings: &DotSettings) -> Result<()> {
        let content = serde_json::to_string(settings)?;
        self.app_store.set_item(SETTINGS_KEY, &content).await?;
        tracing::debug!("Settings saved to app store");
        Ok(())
    }

    async fn mirror(&self, settings: &DotSettings) {
        if let Err(e) = self.bridge.mirror(settings).await {
            tracing::error!(
                "Failed to mirror settings to namespace {}: {}",
                self.bridge.namespace(),
                e
            );
        }
    }
}
