//! Content store abstraction
//!
//! This module defines the `ContentStore` trait implemented by storage backends.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::Stream;
use hullmedia_core::AppError;
use std::pin::Pin;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Range not satisfiable for object of {total} bytes")]
    RangeNotSatisfiable { total: u64 },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => AppError::NotFound(format!("Object not found: {}", key)),
            StorageError::InvalidKey(msg) => AppError::Validation(msg),
            StorageError::RangeNotSatisfiable { total } => AppError::RangeNotSatisfiable { total },
            other => AppError::Storage(other.to_string()),
        }
    }
}

/// Stream of object bytes
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

/// An immutable object written by [`ContentStore::save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub size: u64,
    /// Upper-case hex SHA-256 computed while the bytes were written
    pub sha256: String,
    pub created_at: DateTime<Utc>,
}

/// A single HTTP-style byte range request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteRange {
    /// `bytes=a-b` (inclusive)
    FromTo(u64, u64),
    /// `bytes=a-`
    From(u64),
    /// `bytes=-n`, the last n bytes
    Suffix(u64),
}

impl ByteRange {
    /// Resolve against an object of `total` bytes into an inclusive `(start, end)` pair.
    ///
    /// Returns `None` when the range cannot be satisfied. An end past the object is clamped.
    pub fn resolve(&self, total: u64) -> Option<(u64, u64)> {
        if total == 0 {
            return None;
        }
        let last = total - 1;
        match *self {
            ByteRange::FromTo(start, end) => {
                if start > end || start > last {
                    None
                } else {
                    Some((start, end.min(last)))
                }
            }
            ByteRange::From(start) => (start <= last).then_some((start, last)),
            ByteRange::Suffix(0) => None,
            ByteRange::Suffix(n) => Some((total.saturating_sub(n), last)),
        }
    }
}

/// Readable view of a stored object, possibly restricted to a range.
pub struct ObjectReader {
    pub stream: ByteStream,
    pub total_size: u64,
    /// Inclusive range being served, `None` for the whole object
    pub range: Option<(u64, u64)>,
}

impl ObjectReader {
    /// Number of bytes the stream yields
    pub fn content_length(&self) -> u64 {
        match self.range {
            Some((start, end)) => end - start + 1,
            None => self.total_size,
        }
    }
}

impl std::fmt::Debug for ObjectReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectReader")
            .field("total_size", &self.total_size)
            .field("range", &self.range)
            .finish_non_exhaustive()
    }
}

/// Content store abstraction
///
/// Objects written through `save` are immutable and addressed by an opaque random key. A key
/// never names a partially written object.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Copy `reader` to a freshly allocated key, hashing every byte on the way.
    async fn save(
        &self,
        reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
        original_filename: &str,
        content_type: &str,
    ) -> StorageResult<StoredObject>;

    /// Open an object for streaming, optionally restricted to a byte range.
    async fn open_read(
        &self,
        storage_key: &str,
        range: Option<ByteRange>,
    ) -> StorageResult<ObjectReader>;

    /// Read a whole object into memory
    async fn read_all(&self, storage_key: &str) -> StorageResult<Vec<u8>>;

    /// Publish derived bytes (e.g. a thumbnail) at an explicit key.
    async fn put_derived(&self, storage_key: &str, data: Vec<u8>) -> StorageResult<()>;

    /// Delete an object. Returns `false` when it did not exist.
    async fn delete(&self, storage_key: &str) -> StorageResult<bool>;

    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;
}
