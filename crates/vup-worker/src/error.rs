//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Storage error: {0}")]
    Storage(#[from] vup_storage::StorageError),

    #[error("Queue error: {0}")]
    Queue(#[from] vup_queue::QueueError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
