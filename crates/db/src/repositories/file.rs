//! File repository for database operations.
//!
//! Implements the durable metadata store using SeaORM.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::files;
use vanish_core::file::{FileError, FileRecord, FileStore, NewFile};

/// File repository implementation.
#[derive(Debug, Clone)]
pub struct FileRepository {
    db: DatabaseConnection,
}

impl FileRepository {
    /// Create a new file repository.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl FileStore for FileRepository {
    async fn get(&self, id: Uuid) -> Result<Option<FileRecord>, FileError> {
        let model = files::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| FileError::repository(e.to_string()))?;

        Ok(model.map(to_domain))
    }

    async fn get_by_object_path(&self, path: &str) -> Result<Option<FileRecord>, FileError> {
        let model = files::Entity::find()
            .filter(files::Column::ObjectPath.eq(path))
            .order_by_asc(files::Column::UploadTime)
            .order_by_asc(files::Column::Id)
            .one(&self.db)
            .await
            .map_err(|e| FileError::repository(e.to_string()))?;

        Ok(model.map(to_domain))
    }

    async fn create(&self, new: NewFile) -> Result<FileRecord, FileError> {
        let size = i64::try_from(new.size)
            .map_err(|_| FileError::validation(format!("size {} out of range", new.size)))?;

        let active_model = files::ActiveModel {
            id: Set(Uuid::new_v4()),
            filename: Set(new.filename),
            original_filename: Set(new.original_filename),
            mime_type: Set(new.mime_type),
            size: Set(size),
            object_path: Set(new.object_path),
            upload_time: Set(Utc::now().into()),
            expiration_time: Set(new.expiration_time.into()),
            download_count: Set(0),
        };

        let model = active_model
            .insert(&self.db)
            .await
            .map_err(|e| FileError::repository(e.to_string()))?;

        Ok(to_domain(model))
    }

    async fn increment_download_count(&self, id: Uuid) -> Result<(), FileError> {
        files::Entity::update_many()
            .col_expr(
                files::Column::DownloadCount,
                Expr::col(files::Column::DownloadCount).add(1),
            )
            .filter(files::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(|e| FileError::repository(e.to_string()))?;

        Ok(())
    }

    async fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<FileRecord>, FileError> {
        let models = files::Entity::find()
            .filter(files::Column::ExpirationTime.lt(now))
            .order_by_asc(files::Column::ExpirationTime)
            .order_by_asc(files::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| FileError::repository(e.to_string()))?;

        Ok(models.into_iter().map(to_domain).collect())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, FileError> {
        let result = files::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| FileError::repository(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }
}

/// Convert database model to domain record.
fn to_domain(model: files::Model) -> FileRecord {
    FileRecord {
        id: model.id,
        filename: model.filename,
        original_filename: model.original_filename,
        mime_type: model.mime_type,
        size: u64::try_from(model.size).unwrap_or(0),
        object_path: model.object_path,
        upload_time: model.upload_time.with_timezone(&Utc),
        expiration_time: model.expiration_time.with_timezone(&Utc),
        download_count: u32::try_from(model.download_count).unwrap_or(0),
    }
}
