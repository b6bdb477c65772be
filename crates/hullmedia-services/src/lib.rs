//! Hullmedia Services Layer
//!
//! Orchestration on top of storage, processing and the database crates:
//! - `uploads`: the resumable and chunked upload protocols and the finalize pipeline they share
//! - `media`: retrieval, correlation lookup and maintenance of catalogued media
//! - `cleanup`: background eviction of idle upload sessions and expired upload results
//!
//! The API crate depends on this facade only; HTTP concerns stay in hullmedia-api.

pub mod cleanup;
pub mod media;
pub mod uploads;

#[cfg(test)]
mod test_support;

pub use cleanup::SessionSweeper;
pub use media::{Download, MediaService, Resolution};
pub use uploads::{
    ChunkedUploadManager, FinalizePipeline, InMemorySessionRepository, IngestRequest,
    ResumableUploadEngine, SessionRepository, TempUploadDir,
};

pub use hullmedia_db::{
    InMemoryMediaCatalog, InMemoryUploadResultRegistry, MediaCatalog, MediaRepository,
    UploadResultRegistry, UploadResultRepository,
};
pub use hullmedia_processing::{ContentValidator, ThumbnailGenerator};
pub use hullmedia_storage::{
    create_content_store, ByteRange, ContentStore, LocalContentStore, ObjectReader, StorageError,
};
