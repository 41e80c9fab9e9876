//! The lease/process/acknowledge loop.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info, warn};

use vup_models::{BlobMetadata, UploadJob};
use vup_queue::{JobQueue, LeasedMessage};
use vup_storage::ObjectStore;

use crate::config::WorkerConfig;
use crate::error::WorkerResult;

/// One job in flight at a time; intra-instance races on a metadata key
/// are impossible with a batch of one.
const LEASE_BATCH: usize = 1;

/// Result of a single poll iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// No message was available
    Idle,
    /// A job was processed and acknowledged
    Processed,
    /// A malformed message was acknowledged without producing metadata
    Dropped,
    /// Processing failed; the lease was left to expire for redelivery
    Deferred,
}

/// Sequential worker deriving metadata for uploaded blobs.
pub struct ProcessingWorker {
    store: Arc<dyn ObjectStore>,
    queue: Arc<dyn JobQueue>,
    config: WorkerConfig,
    shutdown: watch::Sender<bool>,
}

impl ProcessingWorker {
    /// Create a new worker over the shared store and queue clients.
    pub fn new(
        store: Arc<dyn ObjectStore>,
        queue: Arc<dyn JobQueue>,
        config: WorkerConfig,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            store,
            queue,
            config,
            shutdown,
        }
    }

    /// Signal shutdown. Interrupts the idle wait and any in-flight
    /// suspension point; a leased but unacknowledged message is
    /// abandoned and redelivered after the visibility timeout.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Run the loop until shutdown is signalled.
    pub async fn run(&self) {
        info!("Processing worker started");
        let mut shutdown_rx = self.shutdown.subscribe();

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                }
                result = self.poll_once() => {
                    let backoff = match result {
                        Ok(PollOutcome::Processed | PollOutcome::Dropped) => false,
                        Ok(PollOutcome::Idle | PollOutcome::Deferred) => true,
                        Err(e) => {
                            warn!("Lease attempt failed: {}", e);
                            true
                        }
                    };
                    if backoff {
                        tokio::select! {
                            _ = shutdown_rx.changed() => {
                                if *shutdown_rx.borrow() {
                                    break;
                                }
                            }
                            _ = tokio::time::sleep(self.config.poll_backoff) => {}
                        }
                    }
                }
            }
        }

        info!("Processing worker stopped");
    }

    /// Lease at most one message and handle it.
    ///
    /// Acknowledgment of the handled message always completes before
    /// this returns, so no two leases are ever held concurrently by one
    /// worker instance.
    pub async fn poll_once(&self) -> WorkerResult<PollOutcome> {
        let mut leased = self.queue.lease(LEASE_BATCH).await?;
        match leased.pop() {
            Some(message) => Ok(self.handle_message(message).await),
            None => Ok(PollOutcome::Idle),
        }
    }

    async fn handle_message(&self, message: LeasedMessage) -> PollOutcome {
        let job: UploadJob = match serde_json::from_str(&message.body) {
            Ok(job) => job,
            Err(e) => {
                // Unparseable bodies are acknowledged without metadata so
                // they cannot wedge the queue.
                warn!(
                    message_id = %message.id,
                    "Dropping malformed job body: {}", e
                );
                self.acknowledge(&message).await;
                return PollOutcome::Dropped;
            }
        };

        info!(blob_name = %job.blob_name, "Processing blob");

        let metadata = BlobMetadata::new(&job.blob_name);
        let payload = match serde_json::to_vec(&metadata) {
            Ok(p) => p,
            Err(e) => {
                error!(blob_name = %job.blob_name, "Failed to serialize metadata: {}", e);
                return PollOutcome::Deferred;
            }
        };

        if let Err(e) = self
            .store
            .write(&metadata.key(), payload, "application/json")
            .await
        {
            // Leave the lease outstanding; the message becomes visible
            // again after the visibility timeout.
            error!(
                blob_name = %job.blob_name,
                "Metadata write failed, job will be redelivered: {}", e
            );
            return PollOutcome::Deferred;
        }

        self.acknowledge(&message).await;
        PollOutcome::Processed
    }

    async fn acknowledge(&self, message: &LeasedMessage) {
        if let Err(e) = self
            .queue
            .acknowledge(&message.id, &message.lease_token)
            .await
        {
            // Unable to confirm; redelivery is safe because the metadata
            // write is idempotent.
            warn!(
                message_id = %message.id,
                "Failed to acknowledge message: {}", e
            );
        }
    }
}
