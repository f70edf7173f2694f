//! Expiring file records and the access path.
//!
//! - `FileStore` persists records; `MemoryFileStore` is the in-process backend
//! - `FileService` registers uploads and gates metadata and downloads on expiry

mod error;
mod service;
mod store;
mod types;

pub use error::FileError;
pub use service::FileService;
pub use store::{FileStore, MemoryFileStore};
pub use types::{CreateFileInput, Download, FileRecord, NewFile};
