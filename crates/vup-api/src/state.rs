//! Application state.

use std::sync::Arc;

use vup_queue::{JobQueue, RedisJobQueue};
use vup_storage::{ObjectStore, S3ObjectStore};

use crate::config::ApiConfig;
use crate::service::VideoService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub store: Arc<dyn ObjectStore>,
    pub queue: Arc<dyn JobQueue>,
    pub videos: VideoService,
}

impl AppState {
    /// Create state wired to the production store and queue clients.
    pub async fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let store: Arc<dyn ObjectStore> = Arc::new(S3ObjectStore::from_env()?);

        let queue = RedisJobQueue::from_env()?;
        queue.init().await?;
        let queue: Arc<dyn JobQueue> = Arc::new(queue);

        Ok(Self::with_clients(config, store, queue))
    }

    /// Create state over externally supplied clients. The store and
    /// queue are process-wide singletons shared with the worker wiring.
    pub fn with_clients(
        config: ApiConfig,
        store: Arc<dyn ObjectStore>,
        queue: Arc<dyn JobQueue>,
    ) -> Self {
        let videos = VideoService::new(
            Arc::clone(&store),
            Arc::clone(&queue),
            config.container.clone(),
        );
        Self {
            config,
            store,
            queue,
            videos,
        }
    }
}
