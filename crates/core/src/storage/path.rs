//! Object key and canonical path handling.
//!
//! Blobs live under opaque keys (`uploads/<uuid>`). Metadata and download
//! links use the canonical path `/objects/<key>`. Every raw form a client may
//! send back (presigned URL, direct upload URL, bare key) collapses to the
//! same canonical path, which is then used for lookups and deletes alike.

use uuid::Uuid;

use super::error::StorageError;

/// Prefix of every canonical object path.
pub const OBJECT_PATH_PREFIX: &str = "/objects/";

/// Directory new uploads are placed in.
const UPLOAD_DIR: &str = "uploads";

/// Generate a fresh, collision-resistant object key.
#[must_use]
pub fn generate_object_key() -> String {
    format!("{UPLOAD_DIR}/{}", Uuid::new_v4())
}

/// Canonical path for a key.
#[must_use]
pub fn canonical_path(key: &str) -> String {
    format!("{OBJECT_PATH_PREFIX}{key}")
}

/// Extract and validate the key from a canonical path.
///
/// # Errors
///
/// Returns [`StorageError::InvalidKey`] if `path` is not canonical or the
/// key is malformed.
pub fn object_key(path: &str) -> Result<&str, StorageError> {
    let key = path
        .strip_prefix(OBJECT_PATH_PREFIX)
        .ok_or_else(|| StorageError::invalid_key(format!("not an object path: {path}")))?;
    validate_key(key)?;
    Ok(key)
}

/// Collapse a raw upload URL, key or path to its canonical path.
///
/// `bucket` is stripped from the front of path-style URLs
/// (`https://endpoint/<bucket>/<key>`). Bare keys and paths are never
/// bucket-stripped.
///
/// # Errors
///
/// Returns [`StorageError::InvalidKey`] if no valid key remains.
pub fn normalize_object_path(raw: &str, bucket: Option<&str>) -> Result<String, StorageError> {
    let trimmed = raw.trim();
    let without_query = trimmed.split(['?', '#']).next().unwrap_or_default();

    let key = match without_query
        .strip_prefix("https://")
        .or_else(|| without_query.strip_prefix("http://"))
    {
        Some(rest) => {
            let path = rest.find('/').map_or("", |idx| &rest[idx..]);
            match path.strip_prefix(OBJECT_PATH_PREFIX) {
                Some(key) => key,
                None => {
                    let relative = path.trim_start_matches('/');
                    bucket
                        .and_then(|b| relative.strip_prefix(b))
                        .and_then(|rest| rest.strip_prefix('/'))
                        .unwrap_or(relative)
                }
            }
        }
        None => without_query
            .strip_prefix(OBJECT_PATH_PREFIX)
            .unwrap_or_else(|| without_query.trim_start_matches('/')),
    };

    validate_key(key)?;
    Ok(canonical_path(key))
}

fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty() {
        return Err(StorageError::invalid_key("empty key"));
    }
    if key.contains('\\') {
        return Err(StorageError::invalid_key(format!("backslash in key: {key}")));
    }
    if key
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(StorageError::invalid_key(format!("bad segment in key: {key}")));
    }
    Ok(())
}
