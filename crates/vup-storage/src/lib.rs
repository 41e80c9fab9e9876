//! Object storage for uploaded blobs and derived metadata.
//!
//! This crate provides:
//! - The `ObjectStore` contract used by the upload gateway and worker
//! - An S3-compatible production client
//! - An in-memory store for tests and local development

pub mod client;
pub mod error;
pub mod memory;
pub mod store;

pub use client::{S3Config, S3ObjectStore};
pub use error::{StorageError, StorageResult};
pub use memory::MemoryObjectStore;
pub use store::{ObjectStore, StoredObject};
