//! End-to-end pipeline tests: gateway and worker over shared clients.

use std::sync::Arc;
use std::time::Duration;

use vup_api::VideoService;
use vup_models::BlobMetadata;
use vup_queue::{JobQueue, MemoryJobQueue};
use vup_storage::{MemoryObjectStore, ObjectStore};
use vup_worker::{PollOutcome, ProcessingWorker, WorkerConfig};

fn pipeline(
    visibility_timeout: Duration,
) -> (
    VideoService,
    ProcessingWorker,
    Arc<MemoryObjectStore>,
    Arc<MemoryJobQueue>,
) {
    let store = Arc::new(MemoryObjectStore::new());
    let queue = Arc::new(MemoryJobQueue::new(visibility_timeout));
    let service = VideoService::new(
        Arc::clone(&store) as Arc<dyn ObjectStore>,
        Arc::clone(&queue) as Arc<dyn JobQueue>,
        "videos",
    );
    let worker = ProcessingWorker::new(
        Arc::clone(&store) as Arc<dyn ObjectStore>,
        Arc::clone(&queue) as Arc<dyn JobQueue>,
        WorkerConfig::default(),
    );
    (service, worker, store, queue)
}

#[tokio::test]
async fn test_upload_is_processed_into_metadata() {
    let (service, worker, store, queue) = pipeline(Duration::from_secs(30));

    let before = chrono::Utc::now();
    service
        .upload("clip1.mp4", b"bytes".to_vec(), Some("video/mp4"))
        .await
        .unwrap();

    assert_eq!(worker.poll_once().await.unwrap(), PollOutcome::Processed);

    let meta: BlobMetadata = serde_json::from_slice(
        &store
            .read("clip1.mp4.metadata.json")
            .await
            .unwrap()
            .bytes,
    )
    .unwrap();
    assert_eq!(meta.blob_name, "clip1.mp4");
    assert!(meta.processed_utc >= before);

    // Exactly one metadata object plus the blob itself
    assert_eq!(store.len().await, 2);
    assert_eq!(queue.len().await.unwrap(), 0);
}

#[tokio::test]
async fn test_blob_downloadable_before_processing() {
    let (service, _worker, _store, _queue) = pipeline(Duration::from_secs(30));

    service
        .upload("early.mp4", b"bytes".to_vec(), None)
        .await
        .unwrap();

    // No worker has run; the blob is still retrievable.
    let obj = service.download("early.mp4").await.unwrap();
    assert_eq!(obj.bytes, b"bytes");
}

#[tokio::test]
async fn test_two_uploads_two_jobs_two_metadata_objects() {
    let (service, worker, store, queue) = pipeline(Duration::from_secs(30));

    service
        .upload("a.mp4", b"aaa".to_vec(), Some("video/mp4"))
        .await
        .unwrap();
    service
        .upload("b.mp4", b"bbb".to_vec(), Some("video/mp4"))
        .await
        .unwrap();
    assert_eq!(queue.len().await.unwrap(), 2);

    assert_eq!(worker.poll_once().await.unwrap(), PollOutcome::Processed);
    assert_eq!(worker.poll_once().await.unwrap(), PollOutcome::Processed);
    assert_eq!(worker.poll_once().await.unwrap(), PollOutcome::Idle);

    assert!(store.exists("a.mp4.metadata.json").await.unwrap());
    assert!(store.exists("b.mp4.metadata.json").await.unwrap());
}

#[tokio::test]
async fn test_abandoned_lease_is_redelivered_and_processed() {
    let (service, worker, store, queue) = pipeline(Duration::from_millis(20));

    service
        .upload("clip2.mp4", b"bytes".to_vec(), None)
        .await
        .unwrap();

    // Simulate a consumer that leased the job and then crashed before
    // acknowledging: lease directly, drop the handle.
    let leased = queue.lease(1).await.unwrap();
    assert_eq!(leased.len(), 1);
    drop(leased);

    // Before the visibility timeout elapses the worker sees nothing.
    assert_eq!(worker.poll_once().await.unwrap(), PollOutcome::Idle);

    tokio::time::sleep(Duration::from_millis(40)).await;
    assert_eq!(worker.poll_once().await.unwrap(), PollOutcome::Processed);
    assert!(store.exists("clip2.mp4.metadata.json").await.unwrap());
}
