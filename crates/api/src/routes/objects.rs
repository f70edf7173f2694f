//! Blob download and direct upload routes.

use std::fmt::Write as _;

use axum::{
    Json, Router,
    body::{Body, Bytes},
    extract::{Path, State, rejection::BytesRejection},
    http::{HeaderValue, StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;
use serde_json::json;

use crate::AppState;
use crate::error::ApiError;
use vanish_core::storage::OBJECT_PATH_PREFIX;
use vanish_shared::AppError;

/// Creates the object routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/objects/{*path}", get(download_object).put(upload_object))
}

/// GET `/objects/{*path}`
/// Stream a live blob and count the download.
async fn download_object(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let download = state
        .files
        .open_download(&format!("{OBJECT_PATH_PREFIX}{path}"), Utc::now())
        .await?;

    let content_type = HeaderValue::from_str(&download.record.mime_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

    let headers = [
        (header::CONTENT_TYPE, content_type),
        (
            header::CONTENT_LENGTH,
            HeaderValue::from(download.content_length),
        ),
        (
            header::CONTENT_DISPOSITION,
            content_disposition(&download.record.original_filename),
        ),
        (header::CACHE_CONTROL, HeaderValue::from_static("no-store")),
    ];

    Ok((headers, Body::from_stream(download.body)))
}

/// PUT `/objects/{*path}`
/// Store a blob sent straight to this service. A path already in use
/// answers 409.
async fn upload_object(
    State(state): State<AppState>,
    Path(path): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let data = body.map_err(|e| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(e.body_text())
        } else {
            AppError::Validation(e.body_text())
        }
    })?;

    let object_path = state
        .files
        .upload_direct(&format!("{OBJECT_PATH_PREFIX}{path}"), data)
        .await?;

    Ok(Json(json!({ "objectPath": object_path })))
}

/// `attachment` disposition carrying the original filename.
///
/// The quoted form is an ASCII fallback; `filename*` carries the exact name.
fn content_disposition(filename: &str) -> HeaderValue {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if c == ' ' || (c.is_ascii_graphic() && c != '"' && c != '\\') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let mut encoded = String::with_capacity(filename.len());
    for byte in filename.bytes() {
        if byte.is_ascii_alphanumeric() || b"-._~".contains(&byte) {
            encoded.push(char::from(byte));
        } else {
            let _ = write!(encoded, "%{byte:02X}");
        }
    }

    HeaderValue::from_str(&format!(
        "attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}"
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}
