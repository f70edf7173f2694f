//! Object gateway contract consumed by the access path and the reaper.

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;

use super::error::StorageError;

/// Stream of blob content.
pub type ByteStream = BoxStream<'static, Result<Bytes, StorageError>>;

/// Time-limited write capability for one new object.
#[derive(Debug, Clone)]
pub struct UploadHandle {
    /// URL the client writes the blob to.
    pub url: String,
    /// HTTP method to use (PUT).
    pub method: String,
    /// Headers the client must send with the write.
    pub headers: HashMap<String, String>,
    /// When the write capability lapses.
    pub expires_at: DateTime<Utc>,
    /// Canonical path the object resolves to once written.
    pub object_path: String,
}

/// An opened blob.
pub struct BlobStream {
    /// Size reported by the backend.
    pub content_length: u64,
    /// Content type reported by the backend, if any.
    pub content_type: Option<String>,
    /// Blob content.
    pub body: ByteStream,
}

impl std::fmt::Debug for BlobStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobStream")
            .field("content_length", &self.content_length)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Blob store operations addressed by canonical object path.
///
/// Implementations must keep `delete_object` idempotent: deleting a missing
/// object succeeds.
#[async_trait]
pub trait ObjectGateway: Send + Sync {
    /// Issue a write handle for a fresh object.
    async fn issue_upload_handle(&self) -> Result<UploadHandle, StorageError>;

    /// Collapse a raw upload URL or key to its canonical path.
    fn normalize_path(&self, raw: &str) -> Result<String, StorageError>;

    /// Open an object for streaming. Missing objects yield
    /// [`StorageError::NotFound`].
    async fn read_stream(&self, path: &str) -> Result<BlobStream, StorageError>;

    /// Whether an object is already written at `path`.
    async fn object_exists(&self, path: &str) -> Result<bool, StorageError>;

    /// Write a whole object.
    async fn write_object(&self, path: &str, data: Bytes) -> Result<(), StorageError>;

    /// Delete an object; succeeds if it is already gone.
    async fn delete_object(&self, path: &str) -> Result<(), StorageError>;
}
