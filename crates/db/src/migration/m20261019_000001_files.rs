//! Files table for expiring uploads.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(FILES_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared("DROP TABLE IF EXISTS files CASCADE;")
            .await?;
        Ok(())
    }
}

const FILES_SQL: &str = r"
CREATE TABLE files (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    filename TEXT NOT NULL,
    original_filename TEXT NOT NULL,
    mime_type TEXT NOT NULL,
    size BIGINT NOT NULL,
    object_path TEXT NOT NULL,
    upload_time TIMESTAMPTZ NOT NULL DEFAULT now(),
    expiration_time TIMESTAMPTZ NOT NULL,
    download_count INTEGER NOT NULL DEFAULT 0,
    CONSTRAINT chk_files_size CHECK (size >= 0),
    CONSTRAINT chk_files_download_count CHECK (download_count >= 0)
);

-- Download path lookup
CREATE INDEX idx_files_object_path ON files(object_path, upload_time, id);

-- Reaper scan
CREATE INDEX idx_files_expiration ON files(expiration_time, id);
";
