//! Upload handles and file metadata routes.

use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;
use vanish_core::expiry::ExpiryOption;
use vanish_core::file::{CreateFileInput, FileError, FileRecord};
use vanish_shared::AppError;

/// Creates the file routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/upload", post(request_upload))
        .route("/api/files", post(create_file))
        .route("/api/files/{id}", get(get_file))
        .route("/api/expiry-options", get(expiry_options))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Response for an upload handle request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// URL to write the blob to.
    pub upload_url: String,
    /// HTTP method to use (PUT).
    pub upload_method: String,
    /// Required headers for the upload.
    pub upload_headers: HashMap<String, String>,
    /// Canonical object path to register with `POST /api/files`.
    pub object_path: String,
    /// When the upload URL expires (RFC 3339).
    pub expires_at: String,
}

/// Response for a live file.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileResponse {
    /// The record.
    #[serde(flatten)]
    pub record: FileRecord,
    /// Human-readable remaining lifetime.
    pub expires_in: String,
}

/// One allowed lifetime.
#[derive(Debug, Serialize)]
pub struct ExpiryOptionResponse {
    /// Display label.
    pub label: &'static str,
    /// Lifetime in minutes.
    pub minutes: u32,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/api/upload`
/// Issue a write handle for a new blob.
async fn request_upload(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let handle = state.files.request_upload().await?;

    Ok(Json(UploadResponse {
        upload_url: handle.url,
        upload_method: handle.method,
        upload_headers: handle.headers,
        object_path: handle.object_path,
        expires_at: handle.expires_at.to_rfc3339(),
    }))
}

/// POST `/api/files`
/// Register an uploaded blob.
async fn create_file(
    State(state): State<AppState>,
    payload: Result<Json<CreateFileInput>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(input) = payload.map_err(|e| AppError::Validation(e.body_text()))?;

    let record = state.files.create(input, Utc::now()).await?;
    info!(file_id = %record.id, "file created");

    Ok((StatusCode::CREATED, Json(record)))
}

/// GET `/api/files/{id}`
/// Fetch metadata for a live file. Does not count as a download.
async fn get_file(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = Uuid::parse_str(&id).map_err(|_| FileError::not_found(&id))?;
    let now = Utc::now();
    let record = state.files.get_metadata(id, now).await?;

    Ok(Json(FileResponse {
        expires_in: record.expires_in(now),
        record,
    }))
}

/// GET `/api/expiry-options`
/// List the lifetimes clients may choose.
async fn expiry_options() -> Json<Vec<ExpiryOptionResponse>> {
    Json(
        ExpiryOption::ALL
            .into_iter()
            .map(|option| ExpiryOptionResponse {
                label: option.label(),
                minutes: option.minutes(),
            })
            .collect(),
    )
}
