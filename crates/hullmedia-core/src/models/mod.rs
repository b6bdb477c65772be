//! Data models for the application
//!
//! Catalog records live in `media`; the request/response shapes of the two upload
//! protocols and the completion registry live in `upload`.

mod media;
mod upload;

pub use media::*;
pub use upload::*;
