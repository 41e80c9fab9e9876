//! Job queue using Redis Streams.
//!
//! Lease semantics are mapped onto a consumer group: a fresh lease is an
//! XREADGROUP delivery, redelivery of an expired lease is an XCLAIM of a
//! pending entry idle longer than the visibility timeout. Each lease gets
//! a per-message token stored with an expiry equal to the visibility
//! timeout; acknowledgment verifies the token before XACK, which is what
//! rejects acks from leases that have already lapsed.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use redis::streams::{StreamClaimReply, StreamId, StreamPendingReply, StreamReadReply};
use redis::AsyncCommands;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{QueueError, QueueResult};
use crate::queue::{JobQueue, LeasedMessage};

/// Queue configuration.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Redis URL
    pub redis_url: String,
    /// Stream name for upload jobs
    pub stream_name: String,
    /// Consumer group name
    pub consumer_group: String,
    /// Lease duration; after this elapses an unacknowledged message
    /// becomes eligible for redelivery
    pub visibility_timeout: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            stream_name: "vup:uploads".to_string(),
            consumer_group: "vup:workers".to_string(),
            visibility_timeout: Duration::from_secs(30),
        }
    }
}

impl QueueConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            stream_name: std::env::var("QUEUE_STREAM")
                .unwrap_or_else(|_| "vup:uploads".to_string()),
            consumer_group: std::env::var("QUEUE_CONSUMER_GROUP")
                .unwrap_or_else(|_| "vup:workers".to_string()),
            visibility_timeout: Duration::from_secs(
                std::env::var("QUEUE_VISIBILITY_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }
}

/// Job queue client backed by Redis Streams.
pub struct RedisJobQueue {
    client: redis::Client,
    config: QueueConfig,
    consumer_name: String,
}

impl RedisJobQueue {
    /// Create a new job queue.
    pub fn new(config: QueueConfig) -> QueueResult<Self> {
        let client = redis::Client::open(config.redis_url.as_str())?;
        let consumer_name = format!("consumer-{}", Uuid::new_v4());
        Ok(Self {
            client,
            config,
            consumer_name,
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> QueueResult<Self> {
        Self::new(QueueConfig::from_env())
    }

    /// Initialize the queue (create consumer group if not exists).
    pub async fn init(&self) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let result: Result<(), redis::RedisError> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg("$")
            .arg("MKSTREAM")
            .query_async(&mut conn)
            .await;

        match result {
            Ok(_) => info!("Created consumer group: {}", self.config.consumer_group),
            Err(e) if e.to_string().contains("BUSYGROUP") => {
                debug!("Consumer group already exists: {}", self.config.consumer_group);
            }
            Err(e) => return Err(QueueError::Redis(e)),
        }

        Ok(())
    }

    fn lease_key(&self, message_id: &str) -> String {
        format!("vup:lease:{message_id}")
    }

    /// Issue a lease token for a delivered entry and convert it into a
    /// `LeasedMessage`. Entries without a `body` field are skipped.
    async fn issue_lease(
        &self,
        conn: &mut redis::aio::MultiplexedConnection,
        entry: &StreamId,
    ) -> QueueResult<Option<LeasedMessage>> {
        let body = match entry.map.get("body") {
            Some(redis::Value::BulkString(payload)) => {
                String::from_utf8_lossy(payload).into_owned()
            }
            _ => return Ok(None),
        };

        let token = Uuid::new_v4().to_string();
        let ttl_ms = self.config.visibility_timeout.as_millis() as u64;

        redis::cmd("SET")
            .arg(self.lease_key(&entry.id))
            .arg(&token)
            .arg("PX")
            .arg(ttl_ms)
            .query_async::<()>(conn)
            .await?;

        Ok(Some(LeasedMessage {
            id: entry.id.clone(),
            lease_token: token,
            body,
            visibility_deadline: Instant::now() + self.config.visibility_timeout,
        }))
    }

    /// Reclaim entries whose previous lease has lapsed (pending longer
    /// than the visibility timeout).
    async fn claim_expired(
        &self,
        conn: &mut redis::aio::MultiplexedConnection,
        max: usize,
    ) -> QueueResult<Vec<StreamId>> {
        let pending: StreamPendingReply = redis::cmd("XPENDING")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .query_async(conn)
            .await?;

        if pending.count() == 0 {
            return Ok(Vec::new());
        }

        let min_idle_ms = self.config.visibility_timeout.as_millis() as u64;
        let claimed: StreamClaimReply = redis::cmd("XCLAIM")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg(&self.consumer_name)
            .arg(min_idle_ms)
            .arg("0-0")
            .arg("COUNT")
            .arg(max)
            .query_async(conn)
            .await?;

        Ok(claimed.ids)
    }
}

#[async_trait]
impl JobQueue for RedisJobQueue {
    async fn publish(&self, body: &str) -> QueueResult<String> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let message_id: String = redis::cmd("XADD")
            .arg(&self.config.stream_name)
            .arg("*")
            .arg("body")
            .arg(body)
            .query_async(&mut conn)
            .await?;

        debug!("Published message {}", message_id);
        Ok(message_id)
    }

    async fn lease(&self, max: usize) -> QueueResult<Vec<LeasedMessage>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        // Expired leases take priority over new deliveries.
        let mut entries = self.claim_expired(&mut conn, max).await?;

        if entries.len() < max {
            let result: StreamReadReply = redis::cmd("XREADGROUP")
                .arg("GROUP")
                .arg(&self.config.consumer_group)
                .arg(&self.consumer_name)
                .arg("COUNT")
                .arg(max - entries.len())
                .arg("STREAMS")
                .arg(&self.config.stream_name)
                .arg(">")
                .query_async(&mut conn)
                .await?;

            for stream_key in result.keys {
                entries.extend(stream_key.ids);
            }
        }

        let mut leased = Vec::with_capacity(entries.len());
        for entry in &entries {
            if let Some(message) = self.issue_lease(&mut conn, entry).await? {
                debug!("Leased message {}", message.id);
                leased.push(message);
            }
        }

        Ok(leased)
    }

    async fn acknowledge(&self, id: &str, lease_token: &str) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let current: Option<String> = conn.get(self.lease_key(id)).await?;
        match current {
            Some(token) if token == lease_token => {}
            _ => return Err(QueueError::StaleLease(id.to_string())),
        }

        redis::cmd("XACK")
            .arg(&self.config.stream_name)
            .arg(&self.config.consumer_group)
            .arg(id)
            .query_async::<()>(&mut conn)
            .await?;

        redis::cmd("XDEL")
            .arg(&self.config.stream_name)
            .arg(id)
            .query_async::<()>(&mut conn)
            .await?;

        conn.del::<_, ()>(self.lease_key(id)).await?;

        debug!("Acknowledged message {}", id);
        Ok(())
    }

    async fn len(&self) -> QueueResult<u64> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let len: u64 = conn.xlen(&self.config.stream_name).await?;
        Ok(len)
    }
}
