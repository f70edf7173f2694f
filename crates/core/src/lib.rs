//! Core lifecycle logic for Vanish.
//!
//! This crate contains the expiring-file domain with ZERO web or database
//! dependencies. Persistence and blob storage sit behind traits.
//!
//! # Modules
//!
//! - `expiry` - Expiry decisions and the allowed lifetimes
//! - `file` - File records, the metadata store trait and the access path
//! - `storage` - Object gateway over Apache OpenDAL
//! - `reaper` - Periodic reclamation of expired blobs and records

pub mod expiry;
pub mod file;
pub mod reaper;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;

pub use file::{FileError, FileRecord, FileService, FileStore, MemoryFileStore};
pub use reaper::{ReapReport, Reaper, ReaperConfig, ReaperHandle, ReaperScheduler};
pub use storage::{ObjectGateway, StorageService};
