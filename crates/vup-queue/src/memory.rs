//! In-memory job queue for tests and local development.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::{QueueError, QueueResult};
use crate::queue::{JobQueue, LeasedMessage};

#[derive(Debug, Clone)]
struct Lease {
    token: String,
    deadline: Instant,
}

#[derive(Debug)]
struct QueuedMessage {
    id: String,
    body: String,
    lease: Option<Lease>,
}

#[derive(Debug, Default)]
struct QueueState {
    messages: Vec<QueuedMessage>,
    next_id: u64,
}

/// Job queue backed by a process-local list.
///
/// Lease deadlines are enforced against `Instant::now()`, so redelivery
/// and stale-token behavior match the Redis implementation.
#[derive(Debug)]
pub struct MemoryJobQueue {
    state: Mutex<QueueState>,
    visibility_timeout: Duration,
}

impl Default for MemoryJobQueue {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl MemoryJobQueue {
    pub fn new(visibility_timeout: Duration) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            visibility_timeout,
        }
    }
}

#[async_trait]
impl JobQueue for MemoryJobQueue {
    async fn publish(&self, body: &str) -> QueueResult<String> {
        let mut state = self.state.lock().await;
        state.next_id += 1;
        let id = format!("{}-0", state.next_id);
        state.messages.push(QueuedMessage {
            id: id.clone(),
            body: body.to_string(),
            lease: None,
        });
        Ok(id)
    }

    async fn lease(&self, max: usize) -> QueueResult<Vec<LeasedMessage>> {
        let mut state = self.state.lock().await;
        let now = Instant::now();
        let mut leased = Vec::new();

        for message in state.messages.iter_mut() {
            if leased.len() >= max {
                break;
            }
            let leasable = match &message.lease {
                None => true,
                Some(lease) => lease.deadline <= now,
            };
            if !leasable {
                continue;
            }

            let lease = Lease {
                token: Uuid::new_v4().to_string(),
                deadline: now + self.visibility_timeout,
            };
            leased.push(LeasedMessage {
                id: message.id.clone(),
                lease_token: lease.token.clone(),
                body: message.body.clone(),
                visibility_deadline: lease.deadline,
            });
            message.lease = Some(lease);
        }

        Ok(leased)
    }

    async fn acknowledge(&self, id: &str, lease_token: &str) -> QueueResult<()> {
        let mut state = self.state.lock().await;
        let now = Instant::now();

        let index = state
            .messages
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| QueueError::StaleLease(id.to_string()))?;

        let valid = match &state.messages[index].lease {
            Some(lease) => lease.token == lease_token && lease.deadline > now,
            None => false,
        };
        if !valid {
            return Err(QueueError::StaleLease(id.to_string()));
        }

        state.messages.remove(index);
        Ok(())
    }

    async fn len(&self) -> QueueResult<u64> {
        let state = self.state.lock().await;
        Ok(state.messages.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_lease_ack_cycle() {
        let queue = MemoryJobQueue::default();
        let id = queue.publish("payload").await.unwrap();

        let leased = queue.lease(1).await.unwrap();
        assert_eq!(leased.len(), 1);
        assert_eq!(leased[0].id, id);
        assert_eq!(leased[0].body, "payload");

        queue
            .acknowledge(&leased[0].id, &leased[0].lease_token)
            .await
            .unwrap();
        assert_eq!(queue.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_empty_queue_lease_returns_empty() {
        let queue = MemoryJobQueue::default();
        assert!(queue.lease(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_leased_message_is_invisible_until_deadline() {
        let queue = MemoryJobQueue::default();
        queue.publish("payload").await.unwrap();

        let first = queue.lease(1).await.unwrap();
        assert_eq!(first.len(), 1);

        // Still under lease: a second lease call sees nothing.
        assert!(queue.lease(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_redelivery_after_visibility_timeout() {
        let queue = MemoryJobQueue::new(Duration::from_millis(20));
        queue.publish("payload").await.unwrap();

        let first = queue.lease(1).await.unwrap();
        assert_eq!(first.len(), 1);

        tokio::time::sleep(Duration::from_millis(40)).await;

        let second = queue.lease(1).await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].id, first[0].id);
        assert_ne!(second[0].lease_token, first[0].lease_token);
    }

    #[tokio::test]
    async fn test_stale_token_rejected() {
        let queue = MemoryJobQueue::new(Duration::from_millis(20));
        queue.publish("payload").await.unwrap();

        let first = queue.lease(1).await.unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        let second = queue.lease(1).await.unwrap();

        // The original token no longer confirms the message.
        let err = queue
            .acknowledge(&first[0].id, &first[0].lease_token)
            .await
            .unwrap_err();
        assert!(err.is_stale_lease());

        // The fresh token does.
        queue
            .acknowledge(&second[0].id, &second[0].lease_token)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_distinct_messages_are_independent() {
        let queue = MemoryJobQueue::default();
        let a = queue.publish("a").await.unwrap();
        let b = queue.publish("b").await.unwrap();
        assert_ne!(a, b);

        let leased = queue.lease(10).await.unwrap();
        assert_eq!(leased.len(), 2);
        let bodies: Vec<&str> = leased.iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, vec!["a", "b"]);
    }
}
