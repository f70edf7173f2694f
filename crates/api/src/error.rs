//! Error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;
use vanish_core::FileError;
use vanish_shared::AppError;

/// Handler error rendered as `{ "error": code, "message": text }`.
#[derive(Debug)]
pub struct ApiError(AppError);

impl ApiError {
    /// Wrap an application error.
    #[must_use]
    pub fn new(err: AppError) -> Self {
        Self(err)
    }

    /// The wrapped application error.
    #[must_use]
    pub fn inner(&self) -> &AppError {
        &self.0
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<FileError> for ApiError {
    fn from(err: FileError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let message = if self.0.is_client_error() {
            self.0.to_string()
        } else {
            error!(error = %self.0, "request failed");
            match &self.0 {
                AppError::ExternalService(_) => "Storage operation failed".to_string(),
                _ => "An error occurred".to_string(),
            }
        };

        (
            status,
            Json(json!({
                "error": self.0.error_code(),
                "message": message
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::body_json;
    use rstest::rstest;

    #[rstest]
    #[case(AppError::NotFound("file".into()), StatusCode::NOT_FOUND, "not_found")]
    #[case(AppError::Gone("file".into()), StatusCode::GONE, "gone")]
    #[case(AppError::Validation("bad".into()), StatusCode::BAD_REQUEST, "validation_error")]
    #[case(AppError::Conflict("taken".into()), StatusCode::CONFLICT, "conflict")]
    #[case(
        AppError::PayloadTooLarge("big".into()),
        StatusCode::PAYLOAD_TOO_LARGE,
        "payload_too_large"
    )]
    #[case(
        AppError::ExternalService("s3 down".into()),
        StatusCode::BAD_GATEWAY,
        "storage_error"
    )]
    #[tokio::test]
    async fn test_error_response(
        #[case] err: AppError,
        #[case] status: StatusCode,
        #[case] code: &str,
    ) {
        let response = ApiError::from(err).into_response();
        assert_eq!(response.status(), status);
        let body = body_json(response).await;
        assert_eq!(body["error"], code);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn test_server_errors_hide_details() {
        let response = ApiError::from(AppError::Database("password=hunter2".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["message"], "An error occurred");
    }
}
