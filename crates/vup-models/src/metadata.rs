//! Derived blob metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata stub derived for a processed blob.
///
/// Written to `"{blob_name}.metadata.json"` and overwritten on every
/// successful processing run, so reprocessing after redelivery converges
/// to the same object with a newer `processed_utc`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobMetadata {
    /// Object key of the processed blob
    pub blob_name: String,
    /// When processing completed
    pub processed_utc: DateTime<Utc>,
}

impl BlobMetadata {
    /// Create metadata for a blob stamped with the current time.
    pub fn new(blob_name: impl Into<String>) -> Self {
        Self {
            blob_name: blob_name.into(),
            processed_utc: Utc::now(),
        }
    }

    /// Storage key where metadata for `blob_name` lives.
    pub fn key_for(blob_name: &str) -> String {
        format!("{blob_name}.metadata.json")
    }

    /// Storage key for this metadata object.
    pub fn key(&self) -> String {
        Self::key_for(&self.blob_name)
    }
}
