//! In-memory object store for tests and local development.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{StorageError, StorageResult};
use crate::store::{ObjectStore, StoredObject};

/// Object store backed by a process-local map.
///
/// Overwrite and read-after-write semantics match the production client.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, StoredObject>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects.
    pub async fn len(&self) -> usize {
        self.objects.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.lock().await.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn write(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> StorageResult<()> {
        let mut objects = self.objects.lock().await;
        objects.insert(
            key.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn read(&self, key: &str) -> StorageResult<StoredObject> {
        let objects = self.objects.lock().await;
        objects
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::not_found(key))
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let objects = self.objects.lock().await;
        Ok(objects.contains_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_read_round_trip() {
        let store = MemoryObjectStore::new();
        store
            .write("clip1.mp4", b"content".to_vec(), "video/mp4")
            .await
            .unwrap();

        let obj = store.read("clip1.mp4").await.unwrap();
        assert_eq!(obj.bytes, b"content");
        assert_eq!(obj.content_type, "video/mp4");
        assert!(store.exists("clip1.mp4").await.unwrap());
    }

    #[tokio::test]
    async fn test_read_missing_is_not_found() {
        let store = MemoryObjectStore::new();
        let err = store.read("nope").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(!store.exists("nope").await.unwrap());
    }

    #[tokio::test]
    async fn test_write_overwrites() {
        let store = MemoryObjectStore::new();
        store
            .write("a", b"v1".to_vec(), "text/plain")
            .await
            .unwrap();
        store
            .write("a", b"v2".to_vec(), "text/plain")
            .await
            .unwrap();

        assert_eq!(store.read("a").await.unwrap().bytes, b"v2");
        assert_eq!(store.len().await, 1);
    }
}
