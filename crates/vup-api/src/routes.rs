//! API routes.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{health, ready, stream_video, upload_video};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let max_body_size = state.config.max_body_size;

    Router::new()
        .route("/videos", post(upload_video))
        .route("/videos/:name", get(stream_video))
        .route("/health", get(health))
        .route("/ready", get(ready))
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(RequestBodyLimitLayer::new(max_body_size))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
