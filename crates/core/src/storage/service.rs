//! Storage service implementation using Apache OpenDAL.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use futures::StreamExt;
use opendal::{ErrorKind, Operator, services};
use tracing::debug;

use super::config::{StorageConfig, StorageProvider};
use super::error::StorageError;
use super::gateway::{BlobStream, ObjectGateway, UploadHandle};
use super::path::{canonical_path, generate_object_key, normalize_object_path, object_key};

/// Storage service for uploaded blobs.
pub struct StorageService {
    operator: Operator,
    config: StorageConfig,
}

impl StorageService {
    /// Create a new storage service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&config.provider)?;
        Ok(Self { operator, config })
    }

    /// Create OpenDAL operator from provider config.
    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        match provider {
            StorageProvider::Memory => Operator::new(services::Memory::default())
                .map_err(|e| StorageError::configuration(e.to_string()))?
                .finish()
                .pipe(Ok),
            StorageProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
                    .pipe(Ok)
            }
            StorageProvider::AzureBlob {
                account,
                access_key,
                container,
            } => {
                let builder = services::Azblob::default()
                    .account_name(account)
                    .account_key(access_key)
                    .container(container);

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
                    .pipe(Ok)
            }
            StorageProvider::LocalFs { root } => {
                let builder = services::Fs::default().root(
                    root.to_str()
                        .ok_or_else(|| StorageError::configuration("invalid path"))?,
                );

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
                    .pipe(Ok)
            }
        }
    }

    /// Reject sizes above the configured maximum.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::FileTooLarge`].
    pub fn validate_size(&self, size: u64) -> Result<(), StorageError> {
        if size > self.config.max_file_size {
            return Err(StorageError::file_too_large(
                size,
                self.config.max_file_size,
            ));
        }
        Ok(())
    }

    /// Check if an object exists in storage.
    pub async fn exists(&self, path: &str) -> bool {
        let Ok(key) = object_key(path) else {
            return false;
        };
        self.operator.stat(key).await.is_ok()
    }

    /// Direct-upload handle served by this service itself.
    fn direct_upload_handle(&self, key: &str) -> UploadHandle {
        let object_path = canonical_path(key);
        UploadHandle {
            url: format!(
                "{}{}",
                self.config.public_url.trim_end_matches('/'),
                object_path
            ),
            method: "PUT".to_string(),
            headers: HashMap::new(),
            expires_at: Utc::now() + self.upload_ttl_chrono(),
            object_path,
        }
    }

    fn upload_ttl_chrono(&self) -> chrono::Duration {
        chrono::Duration::seconds(
            i64::try_from(self.config.presign_upload_ttl_secs).unwrap_or(i64::MAX),
        )
    }

    /// Get the storage provider name.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.config.provider.name()
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }
}

#[async_trait]
impl ObjectGateway for StorageService {
    async fn issue_upload_handle(&self) -> Result<UploadHandle, StorageError> {
        let key = generate_object_key();
        let ttl = Duration::from_secs(self.config.presign_upload_ttl_secs);

        match self.operator.presign_write(&key, ttl).await {
            Ok(presigned) => {
                let headers = presigned
                    .header()
                    .iter()
                    .filter_map(|(name, value)| {
                        value
                            .to_str()
                            .ok()
                            .map(|v| (name.to_string(), v.to_string()))
                    })
                    .collect();

                Ok(UploadHandle {
                    url: presigned.uri().to_string(),
                    method: presigned.method().to_string(),
                    headers,
                    expires_at: Utc::now() + self.upload_ttl_chrono(),
                    object_path: canonical_path(&key),
                })
            }
            Err(e) if e.kind() == ErrorKind::Unsupported => {
                debug!(
                    provider = self.provider_name(),
                    "presign unsupported, issuing direct upload handle"
                );
                Ok(self.direct_upload_handle(&key))
            }
            Err(e) => Err(StorageError::from_opendal(&e, &key)),
        }
    }

    fn normalize_path(&self, raw: &str) -> Result<String, StorageError> {
        normalize_object_path(raw, self.config.provider.bucket())
    }

    async fn read_stream(&self, path: &str) -> Result<BlobStream, StorageError> {
        let key = object_key(path)?.to_string();

        let meta = self
            .operator
            .stat(&key)
            .await
            .map_err(|e| StorageError::from_opendal(&e, &key))?;

        let reader = self
            .operator
            .reader(&key)
            .await
            .map_err(|e| StorageError::from_opendal(&e, &key))?;
        let stream = reader
            .into_bytes_stream(..)
            .await
            .map_err(|e| StorageError::from_opendal(&e, &key))?;

        let body = stream
            .map(move |chunk| chunk.map_err(|e| StorageError::from_io(&e, &key)))
            .boxed();

        Ok(BlobStream {
            content_length: meta.content_length(),
            content_type: meta.content_type().map(String::from),
            body,
        })
    }

    async fn object_exists(&self, path: &str) -> Result<bool, StorageError> {
        let key = object_key(path)?;
        match self.operator.stat(key).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::from_opendal(&e, key)),
        }
    }

    async fn write_object(&self, path: &str, data: Bytes) -> Result<(), StorageError> {
        let key = object_key(path)?;
        self.validate_size(data.len() as u64)?;

        self.operator
            .write(key, data)
            .await
            .map_err(|e| StorageError::from_opendal(&e, key))?;
        Ok(())
    }

    async fn delete_object(&self, path: &str) -> Result<(), StorageError> {
        let key = object_key(path)?;
        match self.operator.delete(key).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::from_opendal(&e, key)),
        }
    }
}

/// Extension trait for pipe operator.
trait Pipe: Sized {
    fn pipe<F, R>(self, f: F) -> R
    where
        F: FnOnce(Self) -> R,
    {
        f(self)
    }
}

impl<T> Pipe for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    fn memory_service() -> StorageService {
        StorageService::from_config(
            StorageConfig::new(StorageProvider::Memory).with_public_url("http://files.test/"),
        )
        .expect("memory operator")
    }

    async fn read_all(service: &StorageService, path: &str) -> Result<Vec<u8>, StorageError> {
        let blob = service.read_stream(path).await?;
        let chunks: Vec<Bytes> = blob.body.try_collect().await?;
        Ok(chunks.concat())
    }

    #[tokio::test]
    async fn test_memory_upload_handle_is_direct() {
        let service = memory_service();
        let handle = service.issue_upload_handle().await.expect("handle");

        assert_eq!(handle.method, "PUT");
        assert!(handle.object_path.starts_with("/objects/uploads/"));
        assert_eq!(
            handle.url,
            format!("http://files.test{}", handle.object_path)
        );
        assert!(handle.expires_at > Utc::now());
        assert_eq!(
            service.normalize_path(&handle.url).expect("normalizes"),
            handle.object_path
        );
    }

    #[tokio::test]
    async fn test_write_read_delete() {
        let service = memory_service();
        let path = canonical_path(&generate_object_key());

        service
            .write_object(&path, Bytes::from_static(b"hello vanish"))
            .await
            .expect("write");
        assert!(service.exists(&path).await);
        assert!(service.object_exists(&path).await.expect("stat"));

        let blob = service.read_stream(&path).await.expect("open");
        assert_eq!(blob.content_length, 12);
        assert_eq!(read_all(&service, &path).await.expect("read"), b"hello vanish");

        service.delete_object(&path).await.expect("delete");
        assert!(!service.exists(&path).await);
        assert!(!service.object_exists(&path).await.expect("stat"));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let service = memory_service();
        let path = canonical_path(&generate_object_key());
        service
            .write_object(&path, Bytes::from_static(b"x"))
            .await
            .expect("write");

        service.delete_object(&path).await.expect("first delete");
        service.delete_object(&path).await.expect("second delete");
        service
            .delete_object(&canonical_path(&generate_object_key()))
            .await
            .expect("never existed");
    }

    #[tokio::test]
    async fn test_read_missing_is_not_found() {
        let service = memory_service();
        let err = service
            .read_stream(&canonical_path(&generate_object_key()))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_write_rejects_oversized() {
        let service = StorageService::from_config(
            StorageConfig::new(StorageProvider::Memory).with_max_file_size(4),
        )
        .expect("memory operator");
        let path = canonical_path(&generate_object_key());

        let err = service
            .write_object(&path, Bytes::from_static(b"too long"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::FileTooLarge { size: 8, max: 4 }));
        assert!(!service.exists(&path).await);
    }

    #[tokio::test]
    async fn test_non_canonical_path_rejected() {
        let service = memory_service();
        let err = service.delete_object("uploads/abc").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }
}
