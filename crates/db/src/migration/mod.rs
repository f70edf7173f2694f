//! Database migrations.
//!
//! Creates the `files` table holding expiring upload records, with indexes
//! for download path lookup and the reaper's expiration scan.

pub use sea_orm_migration::prelude::*;

mod m20261019_000001_files;

/// Migrator for running database migrations.
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20261019_000001_files::Migration)]
    }
}
