//! Metadata store abstraction and the in-memory implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use super::error::FileError;
use super::types::{FileRecord, NewFile};

/// Persistence for file records.
///
/// Implemented here for memory and by the db crate for PostgreSQL.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Find a record by id.
    async fn get(&self, id: Uuid) -> Result<Option<FileRecord>, FileError>;

    /// Find a record by canonical object path.
    ///
    /// If several records share a path, the earliest upload wins, ties broken
    /// by the smallest id.
    async fn get_by_object_path(&self, path: &str) -> Result<Option<FileRecord>, FileError>;

    /// Insert a new record with a fresh id, `upload_time = now` and a zero
    /// download count.
    async fn create(&self, new: NewFile) -> Result<FileRecord, FileError>;

    /// Atomically add one to the download count. Unknown ids are a no-op.
    async fn increment_download_count(&self, id: Uuid) -> Result<(), FileError>;

    /// Snapshot of every record with `expiration_time < now`, ordered by
    /// expiration then id.
    async fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<FileRecord>, FileError>;

    /// Remove a record. Returns `false` when nothing was removed.
    async fn delete(&self, id: Uuid) -> Result<bool, FileError>;
}

/// Concurrent in-memory store.
#[derive(Debug, Default)]
pub struct MemoryFileStore {
    records: DashMap<Uuid, FileRecord>,
}

impl MemoryFileStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully formed record, replacing any with the same id.
    pub fn insert(&self, record: FileRecord) {
        self.records.insert(record.id, record);
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn get(&self, id: Uuid) -> Result<Option<FileRecord>, FileError> {
        Ok(self.records.get(&id).map(|r| r.value().clone()))
    }

    async fn get_by_object_path(&self, path: &str) -> Result<Option<FileRecord>, FileError> {
        Ok(self
            .records
            .iter()
            .filter(|r| r.object_path == path)
            .min_by_key(|r| (r.upload_time, r.id))
            .map(|r| r.value().clone()))
    }

    async fn create(&self, new: NewFile) -> Result<FileRecord, FileError> {
        let record = FileRecord {
            id: Uuid::new_v4(),
            filename: new.filename,
            original_filename: new.original_filename,
            mime_type: new.mime_type,
            size: new.size,
            object_path: new.object_path,
            upload_time: Utc::now(),
            expiration_time: new.expiration_time,
            download_count: 0,
        };
        self.records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn increment_download_count(&self, id: Uuid) -> Result<(), FileError> {
        if let Some(mut record) = self.records.get_mut(&id) {
            record.download_count = record.download_count.saturating_add(1);
        }
        Ok(())
    }

    async fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<FileRecord>, FileError> {
        let mut expired: Vec<FileRecord> = self
            .records
            .iter()
            .filter(|r| r.expiration_time < now)
            .map(|r| r.value().clone())
            .collect();
        expired.sort_by_key(|r| (r.expiration_time, r.id));
        Ok(expired)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, FileError> {
        Ok(self.records.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::Arc;

    fn new_file(path: &str, expiration_time: DateTime<Utc>) -> NewFile {
        NewFile {
            filename: "notes.txt".to_string(),
            original_filename: "notes.txt".to_string(),
            mime_type: "text/plain".to_string(),
            size: 42,
            object_path: path.to_string(),
            expiration_time,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = MemoryFileStore::new();
        let exp = Utc::now() + Duration::minutes(10);
        let created = store
            .create(new_file("/objects/uploads/a", exp))
            .await
            .unwrap();

        assert_eq!(created.download_count, 0);
        assert_eq!(created.expiration_time, exp);
        assert_eq!(store.get(created.id).await.unwrap(), Some(created.clone()));
        assert_eq!(
            store.get_by_object_path("/objects/uploads/a").await.unwrap(),
            Some(created)
        );
        assert_eq!(store.get_by_object_path("/objects/other").await.unwrap(), None);
        assert_eq!(store.get(Uuid::new_v4()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_duplicate_path_resolves_to_earliest_upload() {
        let store = MemoryFileStore::new();
        let base = Utc::now();
        let later = store.create(new_file("/objects/dup", base)).await.unwrap();
        let mut earlier = later.clone();
        earlier.id = Uuid::new_v4();
        earlier.upload_time = later.upload_time - Duration::seconds(5);
        store.insert(earlier.clone());

        let found = store.get_by_object_path("/objects/dup").await.unwrap();
        assert_eq!(found.map(|r| r.id), Some(earlier.id));
    }

    #[tokio::test]
    async fn test_increment_unknown_is_noop() {
        let store = MemoryFileStore::new();
        store.increment_download_count(Uuid::new_v4()).await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_increments_are_not_lost() {
        let store = Arc::new(MemoryFileStore::new());
        let record = store
            .create(new_file("/objects/hot", Utc::now() + Duration::hours(1)))
            .await
            .unwrap();

        let tasks: Vec<_> = (0..50)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.increment_download_count(record.id).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let after = store.get(record.id).await.unwrap().unwrap();
        assert_eq!(after.download_count, 50);
        assert_eq!(after.expiration_time, record.expiration_time);
        assert_eq!(after.object_path, record.object_path);
    }

    #[tokio::test]
    async fn test_list_expired_is_strict_and_ordered() {
        let store = MemoryFileStore::new();
        let now = Utc::now();
        let late = store
            .create(new_file("/objects/late", now - Duration::minutes(1)))
            .await
            .unwrap();
        let early = store
            .create(new_file("/objects/early", now - Duration::minutes(30)))
            .await
            .unwrap();
        store
            .create(new_file("/objects/boundary", now))
            .await
            .unwrap();
        store
            .create(new_file("/objects/live", now + Duration::minutes(5)))
            .await
            .unwrap();

        let expired = store.list_expired(now).await.unwrap();
        let ids: Vec<Uuid> = expired.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![early.id, late.id]);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = MemoryFileStore::new();
        let record = store
            .create(new_file("/objects/x", Utc::now()))
            .await
            .unwrap();

        assert!(store.delete(record.id).await.unwrap());
        assert!(!store.delete(record.id).await.unwrap());
        assert_eq!(store.get(record.id).await.unwrap(), None);
    }
}
