//! Upload processing worker binary.

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vup_queue::RedisJobQueue;
use vup_storage::S3ObjectStore;
use vup_worker::{ProcessingWorker, WorkerConfig};

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("vup=info".parse().unwrap());

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting vup-worker");

    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    let store = match S3ObjectStore::from_env() {
        Ok(s) => Arc::new(s),
        Err(e) => {
            error!("Failed to create object store: {}", e);
            std::process::exit(1);
        }
    };

    let queue = match RedisJobQueue::from_env() {
        Ok(q) => Arc::new(q),
        Err(e) => {
            error!("Failed to create job queue: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = queue.init().await {
        error!("Failed to initialize queue: {}", e);
        std::process::exit(1);
    }

    let worker = Arc::new(ProcessingWorker::new(store, queue, config));

    // Stop the loop on Ctrl+C; a leased but unacknowledged message is
    // abandoned and redelivered after the visibility timeout.
    let shutdown_worker = Arc::clone(&worker);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        shutdown_worker.shutdown();
    });

    worker.run().await;

    info!("Worker shutdown complete");
}
