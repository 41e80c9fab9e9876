//! Queue error types.

use thiserror::Error;

pub type QueueResult<T> = Result<T, QueueError>;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Publish failed: {0}")]
    PublishFailed(String),

    #[error("Lease failed: {0}")]
    LeaseFailed(String),

    #[error("Stale lease for message {0}: token expired or superseded")]
    StaleLease(String),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

impl QueueError {
    pub fn connection_failed(msg: impl Into<String>) -> Self {
        Self::ConnectionFailed(msg.into())
    }

    pub fn publish_failed(msg: impl Into<String>) -> Self {
        Self::PublishFailed(msg.into())
    }

    pub fn lease_failed(msg: impl Into<String>) -> Self {
        Self::LeaseFailed(msg.into())
    }

    /// Whether this error means the lease token no longer confirms the
    /// message. Callers rely on natural redelivery in that case.
    pub fn is_stale_lease(&self) -> bool {
        matches!(self, Self::StaleLease(_))
    }
}
