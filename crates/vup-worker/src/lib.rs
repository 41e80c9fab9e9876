//! Upload processing worker.
//!
//! Leases upload jobs from the queue one at a time, derives a metadata
//! stub for each uploaded blob, and acknowledges the job. Failures are
//! never fatal to the loop; unacknowledged messages return via the
//! queue's visibility timeout.

pub mod config;
pub mod error;
pub mod worker;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use worker::{PollOutcome, ProcessingWorker};
