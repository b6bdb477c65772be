//! Hullmedia Storage Library
//!
//! Content-addressed persistence for uploaded originals and their derived thumbnails.
//!
//! # Storage key format
//!
//! Originals are stored under `YYYYMMDD/<32 hex random>[.<ext>]`, where the date shard is the
//! UTC day of the upload and the extension is taken from the client's filename. Thumbnails
//! live under `thumbs/{size}/{shard}/{stem}.jpg`.
//!
//! Keys must not contain `..`, a leading `/` or a backslash. Key generation is centralized
//! in the `keys` module.

pub mod factory;
pub mod keys;
pub mod local;
pub mod traits;

// Re-export commonly used types
pub use factory::create_content_store;
pub use local::LocalContentStore;
pub use traits::{
    ByteRange, ByteStream, ContentStore, ObjectReader, StorageError, StorageResult, StoredObject,
};
