//! Hullmedia Processing Library
//!
//! Content checks and derivatives for uploaded images:
//! - signature sniffing on the first bytes of a file (`signature`)
//! - size, filename and decode validation (`validator`)
//! - bounded thumbnails published back to the content store (`image`)

pub mod image;
pub mod signature;
pub mod validator;

pub use self::image::{ImageResize, ThumbnailError, ThumbnailGenerator};
pub use signature::{is_supported_image, sniff, ImageKind, SIGNATURE_PROBE_LEN};
pub use validator::{ContentValidator, ImageInfo, ValidationError, ValidationMode};
