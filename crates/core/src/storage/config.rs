//! Storage configuration types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use vanish_shared::StorageSettings;

use super::error::StorageError;

/// Storage provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageProvider {
    /// In-process memory (tests and throwaway dev servers).
    Memory,
    /// S3-compatible storage: Cloudflare R2, Supabase, AWS S3, DigitalOcean Spaces
    S3 {
        /// S3 endpoint URL.
        endpoint: String,
        /// S3 bucket name.
        bucket: String,
        /// AWS access key ID.
        access_key_id: String,
        /// AWS secret access key.
        secret_access_key: String,
        /// AWS region.
        region: String,
    },
    /// Azure Blob Storage
    AzureBlob {
        /// Azure storage account name.
        account: String,
        /// Azure storage access key.
        access_key: String,
        /// Azure container name.
        container: String,
    },
    /// Local filesystem (development only)
    LocalFs {
        /// Root directory path.
        root: PathBuf,
    },
}

impl StorageProvider {
    /// Create S3-compatible provider (Cloudflare R2, Supabase, AWS S3).
    #[must_use]
    pub fn s3(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self::S3 {
            endpoint: endpoint.into(),
            bucket: bucket.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: region.into(),
        }
    }

    /// Create Azure Blob Storage provider.
    #[must_use]
    pub fn azure_blob(
        account: impl Into<String>,
        access_key: impl Into<String>,
        container: impl Into<String>,
    ) -> Self {
        Self::AzureBlob {
            account: account.into(),
            access_key: access_key.into(),
            container: container.into(),
        }
    }

    /// Create local filesystem provider (development only).
    #[must_use]
    pub fn local_fs(root: impl Into<PathBuf>) -> Self {
        Self::LocalFs { root: root.into() }
    }

    /// Get the provider name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::S3 { .. } => "s3",
            Self::AzureBlob { .. } => "azure_blob",
            Self::LocalFs { .. } => "local_fs",
        }
    }

    /// Get the bucket/container name, for providers that have one.
    ///
    /// Path-style upload URLs carry it as their first path segment.
    #[must_use]
    pub fn bucket(&self) -> Option<&str> {
        match self {
            Self::S3 { bucket, .. } => Some(bucket),
            Self::AzureBlob { container, .. } => Some(container),
            Self::Memory | Self::LocalFs { .. } => None,
        }
    }

    /// Build a provider from flat application settings.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for an unknown provider or a missing
    /// required field.
    pub fn from_settings(settings: &StorageSettings) -> Result<Self, StorageError> {
        fn required(value: Option<&String>, field: &str) -> Result<String, StorageError> {
            value
                .cloned()
                .ok_or_else(|| StorageError::configuration(format!("storage.{field} is required")))
        }

        match settings.provider.as_str() {
            "memory" => Ok(Self::Memory),
            "local_fs" | "fs" | "local" => Ok(Self::local_fs(&settings.root)),
            "s3" => Ok(Self::s3(
                required(settings.endpoint.as_ref(), "endpoint")?,
                required(settings.bucket.as_ref(), "bucket")?,
                required(settings.access_key_id.as_ref(), "access_key_id")?,
                required(settings.secret_access_key.as_ref(), "secret_access_key")?,
                settings.region.clone().unwrap_or_else(|| "auto".to_string()),
            )),
            "azure_blob" => Ok(Self::azure_blob(
                required(settings.account.as_ref(), "account")?,
                required(settings.access_key.as_ref(), "access_key")?,
                required(settings.bucket.as_ref(), "bucket")?,
            )),
            other => Err(StorageError::configuration(format!(
                "unknown storage provider '{other}'"
            ))),
        }
    }
}

/// Storage service configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Storage provider configuration.
    pub provider: StorageProvider,
    /// Maximum file size in bytes.
    pub max_file_size: u64,
    /// Presigned upload URL TTL in seconds (default: 900 = 15 minutes).
    pub presign_upload_ttl_secs: u64,
    /// Base URL used for direct upload handles when the provider cannot presign.
    pub public_url: String,
}

impl StorageConfig {
    /// Default max file size: 100MB.
    pub const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;
    /// Default upload TTL: 15 minutes.
    pub const DEFAULT_UPLOAD_TTL: u64 = 900;
    /// Default public URL.
    pub const DEFAULT_PUBLIC_URL: &'static str = "http://localhost:8080";

    /// Create a new storage config with default settings.
    #[must_use]
    pub fn new(provider: StorageProvider) -> Self {
        Self {
            provider,
            max_file_size: Self::DEFAULT_MAX_FILE_SIZE,
            presign_upload_ttl_secs: Self::DEFAULT_UPLOAD_TTL,
            public_url: Self::DEFAULT_PUBLIC_URL.to_string(),
        }
    }

    /// Build from flat application settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider settings are incomplete.
    pub fn from_settings(
        settings: &StorageSettings,
        public_url: impl Into<String>,
    ) -> Result<Self, StorageError> {
        Ok(Self::new(StorageProvider::from_settings(settings)?)
            .with_max_file_size(settings.max_file_size)
            .with_upload_ttl(settings.presign_upload_ttl_secs)
            .with_public_url(public_url))
    }

    /// Set maximum file size.
    #[must_use]
    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.max_file_size = size;
        self
    }

    /// Set presigned upload URL TTL.
    #[must_use]
    pub fn with_upload_ttl(mut self, secs: u64) -> Self {
        self.presign_upload_ttl_secs = secs;
        self
    }

    /// Set the public base URL.
    #[must_use]
    pub fn with_public_url(mut self, url: impl Into<String>) -> Self {
        self.public_url = url.into();
        self
    }
}
