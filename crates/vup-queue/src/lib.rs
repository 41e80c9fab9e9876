//! Lease-based job queue for upload processing.
//!
//! This crate provides:
//! - The `JobQueue` contract: publish, lease with a visibility timeout,
//!   acknowledge by message id + lease token
//! - A Redis Streams implementation with consumer-group redelivery
//! - An in-memory implementation for tests and local development

pub mod error;
pub mod memory;
pub mod queue;
pub mod redis_queue;

pub use error::{QueueError, QueueResult};
pub use memory::MemoryJobQueue;
pub use queue::{JobQueue, LeasedMessage};
pub use redis_queue::{QueueConfig, RedisJobQueue};
