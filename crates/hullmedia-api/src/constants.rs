//! API constants
//!
//! Every route of the service lives under [`API_PREFIX`].

/// Current API version segment
pub const API_VERSION: &str = "v0";

/// Prefix of every hull image route
pub const API_PREFIX: &str = "/api/v0/hull-images";

/// Protocol version advertised on resumable upload responses
pub const TUS_VERSION: &str = "1.0.0";

/// Content type required on resumable PATCH requests
pub const OFFSET_OCTET_STREAM: &str = "application/offset+octet-stream";

/// Filename used when a single-shot upload does not name its file
pub const DEFAULT_UPLOAD_FILENAME: &str = "upload.bin";

pub mod headers {
    pub const UPLOAD_LENGTH: &str = "upload-length";
    pub const UPLOAD_OFFSET: &str = "upload-offset";
    pub const UPLOAD_METADATA: &str = "upload-metadata";
    pub const TUS_RESUMABLE: &str = "tus-resumable";
    pub const UPLOAD_MEDIA_ID: &str = "upload-media-id";
    pub const FILE_NAME: &str = "x-file-name";
    pub const ASSOCIATION_ID: &str = "x-association-id";
}
