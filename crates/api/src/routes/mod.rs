//! API route definitions.

use axum::Router;

use crate::AppState;

pub mod files;
pub mod health;
pub mod objects;

/// Creates the router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(files::routes())
        .merge(objects::routes())
}
