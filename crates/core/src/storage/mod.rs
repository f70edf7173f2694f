//! Object storage for uploaded blobs using Apache OpenDAL.
//!
//! Supported backends:
//! - S3-compatible: Cloudflare R2, Supabase Storage, AWS S3, DigitalOcean Spaces
//! - Azure Blob Storage
//! - Local filesystem and in-process memory (development and tests)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  ObjectGateway (canonical paths)                │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                      Apache OpenDAL                             │
//! │ op.write("key", data)      │ op.presign_write("key", duration)  │
//! │ op.reader("key")           │ op.stat("key")                     │
//! │ op.delete("key")           │                                    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Providers that cannot presign (memory, local filesystem) hand out direct
//! upload handles pointing at `PUT {public_url}/objects/<key>`.

mod config;
mod error;
mod gateway;
mod path;
mod service;

pub use config::{StorageConfig, StorageProvider};
pub use error::StorageError;
pub use gateway::{BlobStream, ByteStream, ObjectGateway, UploadHandle};
pub use path::{
    OBJECT_PATH_PREFIX, canonical_path, generate_object_key, normalize_object_path, object_key,
};
pub use service::StorageService;
