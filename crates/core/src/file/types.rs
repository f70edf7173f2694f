//! File record types and data structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::expiry;
use crate::storage::ByteStream;

/// Metadata for one uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// Unique identifier.
    pub id: Uuid,
    /// Stored filename.
    pub filename: String,
    /// Filename as uploaded by the client.
    pub original_filename: String,
    /// MIME type served on download.
    pub mime_type: String,
    /// Size in bytes.
    pub size: u64,
    /// Canonical object path (`/objects/<key>`).
    pub object_path: String,
    /// When the record was created.
    pub upload_time: DateTime<Utc>,
    /// When the file stops being served.
    pub expiration_time: DateTime<Utc>,
    /// Successful downloads so far.
    pub download_count: u32,
}

impl FileRecord {
    /// Whether the record is expired at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        expiry::is_expired(self.expiration_time, now)
    }

    /// Human-readable remaining lifetime.
    #[must_use]
    pub fn expires_in(&self, now: DateTime<Utc>) -> String {
        expiry::format_remaining(self.expiration_time, now)
    }
}

/// Validated input for inserting a record.
#[derive(Debug, Clone)]
pub struct NewFile {
    /// Stored filename.
    pub filename: String,
    /// Filename as uploaded by the client.
    pub original_filename: String,
    /// MIME type.
    pub mime_type: String,
    /// Size in bytes.
    pub size: u64,
    /// Canonical object path.
    pub object_path: String,
    /// Absolute expiration.
    pub expiration_time: DateTime<Utc>,
}

/// Client input for registering an uploaded file.
///
/// Exactly one of `expires_in_minutes` and `expiration_time` must be set.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFileInput {
    /// Stored filename.
    pub filename: String,
    /// Filename as uploaded by the client.
    pub original_filename: String,
    /// MIME type.
    pub mime_type: String,
    /// Size in bytes.
    pub size: u64,
    /// Upload URL, key or canonical path of the blob.
    pub object_path: String,
    /// Absolute expiration computed by the client.
    #[serde(default)]
    pub expiration_time: Option<DateTime<Utc>>,
    /// Requested lifetime from the allow-list.
    #[serde(default)]
    pub expires_in_minutes: Option<u32>,
}

/// A download ready to be streamed.
pub struct Download {
    /// Record as resolved before the count was incremented.
    pub record: FileRecord,
    /// Blob size reported by the object store.
    pub content_length: u64,
    /// Blob content.
    pub body: ByteStream,
}

impl std::fmt::Debug for Download {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Download")
            .field("record", &self.record)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}
