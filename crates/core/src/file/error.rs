//! File lifecycle error types.

use thiserror::Error;
use uuid::Uuid;
use vanish_shared::AppError;

use crate::expiry::ExpiryError;
use crate::storage::StorageError;

/// File operation errors.
#[derive(Debug, Error)]
pub enum FileError {
    /// No record matches, or it has already been reclaimed.
    #[error("file not found: {0}")]
    NotFound(String),

    /// The record exists but has expired.
    #[error("file {0} has expired")]
    Gone(Uuid),

    /// Client input rejected.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The object path is already bound to a record or already written.
    #[error("object path already in use: {0}")]
    Conflict(String),

    /// Object store operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Metadata store operation failed.
    #[error("repository error: {0}")]
    Repository(String),
}

impl FileError {
    /// Create a not found error.
    #[must_use]
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        Self::NotFound(what.to_string())
    }

    /// Create a validation error.
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a conflict error.
    #[must_use]
    pub fn conflict(path: impl Into<String>) -> Self {
        Self::Conflict(path.into())
    }

    /// Create a repository error.
    #[must_use]
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }
}

impl From<ExpiryError> for FileError {
    fn from(err: ExpiryError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<FileError> for AppError {
    fn from(err: FileError) -> Self {
        match err {
            FileError::NotFound(_) => Self::NotFound(err.to_string()),
            FileError::Gone(_) => Self::Gone(err.to_string()),
            FileError::Validation(msg) => Self::Validation(msg),
            FileError::Conflict(_) => Self::Conflict(err.to_string()),
            FileError::Storage(storage) => match storage {
                StorageError::NotFound { .. } => Self::NotFound(storage.to_string()),
                StorageError::FileTooLarge { .. } => Self::PayloadTooLarge(storage.to_string()),
                StorageError::InvalidKey(_) => Self::Validation(storage.to_string()),
                StorageError::Configuration(_) => Self::Internal(storage.to_string()),
                StorageError::PresignNotSupported | StorageError::Operation(_) => {
                    Self::ExternalService(storage.to_string())
                }
            },
            FileError::Repository(msg) => Self::Database(msg),
        }
    }
}
