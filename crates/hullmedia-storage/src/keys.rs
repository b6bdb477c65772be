//! Shared key generation for the content store.
//!
//! Original key format: `YYYYMMDD/<32 hex random>[.<ext>]`.
//! Thumbnail key format: `thumbs/{size}/{shard}/{stem}.jpg`.

use chrono::{DateTime, Utc};
use std::path::Path;
use uuid::Uuid;

use crate::traits::{StorageError, StorageResult};

const MAX_EXTENSION_LEN: usize = 10;

/// Extension kept on the storage key: lowercased, ASCII alphanumeric only, at most ten chars.
pub fn sanitize_extension(original_filename: &str) -> Option<String> {
    let ext = Path::new(original_filename).extension()?.to_str()?;
    if ext.is_empty()
        || ext.len() > MAX_EXTENSION_LEN
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Allocate a fresh key for an original upload.
pub fn generate_storage_key(original_filename: &str, now: DateTime<Utc>) -> String {
    let name = Uuid::new_v4().simple().to_string();
    match sanitize_extension(original_filename) {
        Some(ext) => format!("{}/{}.{}", now.format("%Y%m%d"), name, ext),
        None => format!("{}/{}", now.format("%Y%m%d"), name),
    }
}

/// Key of the JPEG thumbnail derived from `source_key` at `size`.
pub fn thumbnail_key(source_key: &str, size: u32) -> String {
    let path = Path::new(source_key);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(source_key);
    match path.parent().and_then(|p| p.to_str()).filter(|p| !p.is_empty()) {
        Some(dir) => format!("thumbs/{}/{}/{}.jpg", size, dir, stem),
        None => format!("thumbs/{}/{}.jpg", size, stem),
    }
}

/// Reject keys that could escape the storage root.
pub fn validate_key(storage_key: &str) -> StorageResult<()> {
    if storage_key.is_empty() {
        return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
    }
    if storage_key.contains("..") || storage_key.starts_with('/') || storage_key.contains('\\') {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    Ok(())
}
