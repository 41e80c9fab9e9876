//! The object store contract.

use async_trait::async_trait;

use crate::error::StorageResult;

/// An object read back from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Raw object bytes
    pub bytes: Vec<u8>,
    /// Content type recorded at write time
    pub content_type: String,
}

/// Durable key/bytes store with content-type metadata.
///
/// Assumed strongly consistent for read-after-write on the same key.
/// `write` overwrites any existing object under the key.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `bytes` under `key`, overwriting any existing object.
    async fn write(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> StorageResult<()>;

    /// Read the object at `key`, or `StorageError::NotFound`.
    async fn read(&self, key: &str) -> StorageResult<StoredObject>;

    /// Check whether an object exists at `key`.
    async fn exists(&self, key: &str) -> StorageResult<bool>;
}
