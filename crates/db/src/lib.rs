//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - The PostgreSQL-backed file store
//! - Database migrations

pub mod entities;
pub mod migration;
pub mod repositories;

pub use repositories::FileRepository;

use sea_orm::{Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use tracing::info;

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}

/// Applies all pending migrations.
///
/// # Errors
///
/// Returns an error if a migration fails.
pub async fn run_migrations(db: &DatabaseConnection) -> Result<(), DbErr> {
    migration::Migrator::up(db, None).await?;
    info!("database migrations applied");
    Ok(())
}
