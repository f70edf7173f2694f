//! Test doubles shared by unit tests.

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bytes::Bytes;

use crate::storage::{BlobStream, ObjectGateway, StorageError, StorageService, UploadHandle};

/// Gateway over a real memory-backed service with injectable faults.
pub(crate) struct FlakyGateway {
    inner: StorageService,
    failing_deletes: Mutex<HashSet<String>>,
    failing_reads: AtomicBool,
}

impl FlakyGateway {
    pub(crate) fn new(inner: StorageService) -> Self {
        Self {
            inner,
            failing_deletes: Mutex::new(HashSet::new()),
            failing_reads: AtomicBool::new(false),
        }
    }

    pub(crate) fn inner(&self) -> &StorageService {
        &self.inner
    }

    pub(crate) fn fail_delete(&self, path: &str) {
        self.failing_deletes.lock().unwrap().insert(path.to_string());
    }

    pub(crate) fn fail_reads(&self, fail: bool) {
        self.failing_reads.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn heal(&self) {
        self.failing_deletes.lock().unwrap().clear();
        self.fail_reads(false);
    }
}

#[async_trait]
impl ObjectGateway for FlakyGateway {
    async fn issue_upload_handle(&self) -> Result<UploadHandle, StorageError> {
        self.inner.issue_upload_handle().await
    }

    fn normalize_path(&self, raw: &str) -> Result<String, StorageError> {
        self.inner.normalize_path(raw)
    }

    async fn read_stream(&self, path: &str) -> Result<BlobStream, StorageError> {
        if self.failing_reads.load(Ordering::SeqCst) {
            return Err(StorageError::operation("injected read failure"));
        }
        self.inner.read_stream(path).await
    }

    async fn object_exists(&self, path: &str) -> Result<bool, StorageError> {
        self.inner.object_exists(path).await
    }

    async fn write_object(&self, path: &str, data: Bytes) -> Result<(), StorageError> {
        self.inner.write_object(path, data).await
    }

    async fn delete_object(&self, path: &str) -> Result<(), StorageError> {
        if self.failing_deletes.lock().unwrap().contains(path) {
            return Err(StorageError::operation("injected delete failure"));
        }
        self.inner.delete_object(path).await
    }
}
