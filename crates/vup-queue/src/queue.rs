//! The job queue contract.

use std::time::Instant;

use async_trait::async_trait;

use crate::error::QueueResult;

/// A message held under a lease.
///
/// Valid until `visibility_deadline`; after that the queue makes the
/// underlying message visible to any leaser again and the token stops
/// confirming acknowledgments.
#[derive(Debug, Clone)]
pub struct LeasedMessage {
    /// Queue-assigned message id
    pub id: String,
    /// Token proving ownership of the current lease
    pub lease_token: String,
    /// Raw message body
    pub body: String,
    /// When the lease expires
    pub visibility_deadline: Instant,
}

/// Durable at-least-once message queue with lease-based delivery.
///
/// Acknowledgment requires both the message id and the lease token
/// handed out at lease time; a stale token is rejected with
/// `QueueError::StaleLease`.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Publish a message body. Returns the queue-assigned message id.
    async fn publish(&self, body: &str) -> QueueResult<String>;

    /// Lease up to `max` messages under the configured visibility
    /// timeout. May return an empty list; never blocks waiting for
    /// messages to arrive.
    async fn lease(&self, max: usize) -> QueueResult<Vec<LeasedMessage>>;

    /// Acknowledge a leased message, removing it from the queue.
    async fn acknowledge(&self, id: &str, lease_token: &str) -> QueueResult<()>;

    /// Number of messages currently in the queue (leased or not).
    async fn len(&self) -> QueueResult<u64>;
}
