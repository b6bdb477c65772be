//! Image derivatives
//!
//! - Fit-within resizing and filter selection (resize)
//! - Cached JPEG thumbnails with a placeholder fallback (thumbnail)

pub mod resize;
pub mod thumbnail;

pub use resize::ImageResize;
pub use thumbnail::{render_placeholder, render_thumbnail, ThumbnailError, ThumbnailGenerator};
