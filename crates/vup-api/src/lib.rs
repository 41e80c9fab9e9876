//! Upload API server.
//!
//! Thin HTTP shim over the upload gateway: multipart upload, range-capable
//! download, and health probes. The gateway itself (`VideoService`) writes
//! the blob first and publishes the processing job second, so a job never
//! references a blob that does not exist.

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod service;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use service::VideoService;
pub use state::AppState;
