//! Shared data models for the Vup backend.
//!
//! This crate provides Serde-serializable types for:
//! - Upload jobs published to the processing queue
//! - Derived blob metadata written back to storage

pub mod job;
pub mod metadata;

pub use job::UploadJob;
pub use metadata::BlobMetadata;

/// Content type used when an upload does not declare one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
