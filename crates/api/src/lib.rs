//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - REST API routes for uploads, metadata and downloads
//! - Direct object upload for providers without presigning
//! - JSON error responses

pub mod error;
pub mod routes;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use vanish_core::FileService;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Access path for file records and blobs.
    pub files: Arc<FileService>,
}

impl AppState {
    /// Create state around a file service.
    #[must_use]
    pub fn new(files: Arc<FileService>) -> Self {
        Self { files }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    let body_limit = usize::try_from(state.files.max_file_size()).unwrap_or(usize::MAX);

    Router::new()
        .merge(routes::api_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
