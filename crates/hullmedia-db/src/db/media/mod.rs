pub mod catalog;
#[allow(clippy::module_inception)]
pub mod media;
pub mod upload_result;

pub use catalog::{InMemoryMediaCatalog, MediaCatalog};
pub use media::MediaRepository;
pub use upload_result::{
    InMemoryUploadResultRegistry, UploadResultRegistry, UploadResultRepository,
};
