//! The upload gateway.

use std::sync::Arc;

use tracing::info;

use vup_models::{UploadJob, DEFAULT_CONTENT_TYPE};
use vup_queue::JobQueue;
use vup_storage::{ObjectStore, StoredObject};

use crate::error::{ApiError, ApiResult};

/// Writes uploads to the object store and publishes processing jobs.
///
/// The blob write always precedes the publish, so a published job never
/// references a missing blob. The converse is not guaranteed: a publish
/// failure leaves a stored blob with no job, which is surfaced to the
/// caller rather than remediated here.
#[derive(Clone)]
pub struct VideoService {
    store: Arc<dyn ObjectStore>,
    queue: Arc<dyn JobQueue>,
    container: String,
}

impl VideoService {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        queue: Arc<dyn JobQueue>,
        container: impl Into<String>,
    ) -> Self {
        Self {
            store,
            queue,
            container: container.into(),
        }
    }

    /// Store an upload and publish its processing job.
    ///
    /// Returns the retrieval path for the stored blob.
    pub async fn upload(
        &self,
        name: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> ApiResult<String> {
        let content_type = content_type.unwrap_or(DEFAULT_CONTENT_TYPE);

        self.store.write(name, bytes, content_type).await?;

        let job = UploadJob::new(name, &self.container);
        let body = serde_json::to_string(&job)
            .map_err(|e| ApiError::internal(format!("Failed to serialize job: {e}")))?;
        self.queue.publish(&body).await?;

        info!(blob_name = %name, "Stored upload and published job");
        Ok(format!("/videos/{name}"))
    }

    /// Fetch a stored blob. No processing-status check: a blob is
    /// downloadable before its metadata exists.
    pub async fn download(&self, name: &str) -> ApiResult<StoredObject> {
        self.store.read(name).await.map_err(|e| {
            if e.is_not_found() {
                ApiError::not_found(format!("Video not found: {name}"))
            } else {
                ApiError::Storage(e)
            }
        })
    }
}
