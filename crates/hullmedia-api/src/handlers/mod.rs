pub mod chunked_upload;
pub mod health;
pub mod media_delete;
pub mod media_download;
pub mod media_get;
pub mod media_thumbnail;
pub mod media_upload;
pub mod resumable_upload;
pub mod upload_result;

use axum::body::Body;
use axum::http::HeaderMap;
use futures::StreamExt;
use hullmedia_core::AppError;
use hullmedia_storage::ObjectReader;

/// Response body streaming a stored object
pub(crate) fn stream_body(reader: ObjectReader) -> Body {
    let stream = reader.stream.map(|result| {
        result.map_err(|e| std::io::Error::other(format!("Storage stream error: {}", e)))
    });
    Body::from_stream(stream)
}

/// Trimmed, non-empty header value
pub(crate) fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Required unsigned integer header
pub(crate) fn header_u64(headers: &HeaderMap, name: &str) -> Result<u64, AppError> {
    header_str(headers, name)
        .ok_or_else(|| AppError::Validation(format!("Missing {} header", name)))?
        .parse()
        .map_err(|_| AppError::Validation(format!("{} must be a non-negative integer", name)))
}
