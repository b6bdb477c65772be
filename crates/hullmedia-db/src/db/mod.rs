//! Database repositories for data access layer
//!
//! Repositories live under media/: the catalog of stored images and the correlation-id
//! registry written when uploads complete.

pub mod media;

pub use media::{
    InMemoryMediaCatalog, InMemoryUploadResultRegistry, MediaCatalog, MediaRepository,
    UploadResultRegistry, UploadResultRepository,
};
