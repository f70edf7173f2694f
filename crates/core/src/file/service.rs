//! Access path for expiring files.

use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::error::FileError;
use super::store::FileStore;
use super::types::{CreateFileInput, Download, FileRecord, NewFile};
use crate::expiry::{compute_expiration, validate_expiration};
use crate::storage::{ObjectGateway, StorageError, UploadHandle};

/// File service gating every read on expiry.
pub struct FileService {
    store: Arc<dyn FileStore>,
    gateway: Arc<dyn ObjectGateway>,
    max_file_size: u64,
}

impl FileService {
    /// Create a new file service.
    #[must_use]
    pub fn new(
        store: Arc<dyn FileStore>,
        gateway: Arc<dyn ObjectGateway>,
        max_file_size: u64,
    ) -> Self {
        Self {
            store,
            gateway,
            max_file_size,
        }
    }

    /// Maximum accepted blob size in bytes.
    #[must_use]
    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Issue a write handle for a new blob.
    ///
    /// # Errors
    ///
    /// Returns an error if the object store cannot issue a handle.
    pub async fn request_upload(&self) -> Result<UploadHandle, FileError> {
        let handle = self.gateway.issue_upload_handle().await?;
        debug!(object_path = %handle.object_path, "upload handle issued");
        Ok(handle)
    }

    /// Register an uploaded blob with its expiration.
    ///
    /// # Errors
    ///
    /// Returns [`FileError::Validation`] for empty names, an oversized file,
    /// a missing or ambiguous expiry, or a malformed object path, and
    /// [`FileError::Conflict`] if the path is already bound to a record.
    pub async fn create(
        &self,
        input: CreateFileInput,
        now: DateTime<Utc>,
    ) -> Result<FileRecord, FileError> {
        for (field, value) in [
            ("filename", &input.filename),
            ("originalFilename", &input.original_filename),
            ("mimeType", &input.mime_type),
        ] {
            if value.trim().is_empty() {
                return Err(FileError::validation(format!("{field} must not be empty")));
            }
        }

        if input.size > self.max_file_size {
            return Err(FileError::validation(format!(
                "size {} exceeds maximum {} bytes",
                input.size, self.max_file_size
            )));
        }

        let expiration_time = match (input.expires_in_minutes, input.expiration_time) {
            (Some(minutes), None) => compute_expiration(now, minutes)?,
            (None, Some(at)) => validate_expiration(at, now)?,
            _ => {
                return Err(FileError::validation(
                    "exactly one of expiresInMinutes and expirationTime is required",
                ));
            }
        };

        let object_path = self
            .gateway
            .normalize_path(&input.object_path)
            .map_err(|e| FileError::validation(e.to_string()))?;

        if self.store.get_by_object_path(&object_path).await?.is_some() {
            return Err(FileError::conflict(object_path));
        }

        let record = self
            .store
            .create(NewFile {
                filename: input.filename,
                original_filename: input.original_filename,
                mime_type: input.mime_type,
                size: input.size,
                object_path,
                expiration_time,
            })
            .await?;

        info!(
            file_id = %record.id,
            object_path = %record.object_path,
            expires_at = %record.expiration_time,
            "file registered"
        );
        Ok(record)
    }

    /// Fetch metadata for a live record.
    ///
    /// # Errors
    ///
    /// Returns [`FileError::NotFound`] or [`FileError::Gone`].
    pub async fn get_metadata(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<FileRecord, FileError> {
        let record = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| FileError::not_found(id))?;

        if record.is_expired(now) {
            return Err(FileError::Gone(record.id));
        }
        Ok(record)
    }

    /// Open a live blob for download and count the download.
    ///
    /// The first chunk is read before the download is counted, so a blob
    /// reclaimed between metadata lookup and read surfaces as not found
    /// rather than a truncated body.
    ///
    /// # Errors
    ///
    /// Returns [`FileError::NotFound`], [`FileError::Gone`], or
    /// [`FileError::Storage`] for object store faults.
    pub async fn open_download(
        &self,
        raw_path: &str,
        now: DateTime<Utc>,
    ) -> Result<Download, FileError> {
        let path = self
            .gateway
            .normalize_path(raw_path)
            .map_err(|_| FileError::not_found(raw_path))?;

        let record = self
            .store
            .get_by_object_path(&path)
            .await?
            .ok_or_else(|| FileError::not_found(&path))?;

        if record.is_expired(now) {
            return Err(FileError::Gone(record.id));
        }

        let blob_error = |e: StorageError| {
            if e.is_not_found() {
                FileError::not_found(&path)
            } else {
                FileError::Storage(e)
            }
        };

        let mut blob = self.gateway.read_stream(&path).await.map_err(blob_error)?;
        let first = match blob.body.next().await {
            Some(Ok(chunk)) => Some(chunk),
            Some(Err(e)) => return Err(blob_error(e)),
            None => None,
        };
        let body = futures::stream::iter(first.map(Ok)).chain(blob.body).boxed();

        if let Err(e) = self.store.increment_download_count(record.id).await {
            warn!(file_id = %record.id, error = %e, "failed to record download");
        }

        debug!(file_id = %record.id, object_path = %path, "download started");
        Ok(Download {
            record,
            content_length: blob.content_length,
            body,
        })
    }

    /// Write a blob through this service (providers without presigning).
    ///
    /// Only a fresh path is writable: a path bound to a record or already
    /// holding a blob is never overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::FileTooLarge`] (wrapped) for oversized bodies,
    /// [`FileError::Validation`] for a malformed path,
    /// [`FileError::Conflict`] for a path already in use, or a storage error.
    pub async fn upload_direct(&self, raw_path: &str, data: Bytes) -> Result<String, FileError> {
        let path = self
            .gateway
            .normalize_path(raw_path)
            .map_err(|e| FileError::validation(e.to_string()))?;

        let size = data.len() as u64;
        if size > self.max_file_size {
            return Err(StorageError::file_too_large(size, self.max_file_size).into());
        }

        if self.store.get_by_object_path(&path).await?.is_some()
            || self.gateway.object_exists(&path).await?
        {
            warn!(object_path = %path, "direct upload to a path already in use");
            return Err(FileError::conflict(path));
        }

        self.gateway.write_object(&path, data).await?;
        info!(object_path = %path, size, "direct upload stored");
        Ok(path)
    }
}
