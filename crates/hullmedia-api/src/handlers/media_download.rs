use crate::error::{ErrorResponse, HttpAppError};
use crate::handlers::{header_str, stream_body};
use crate::state::AppState;
use crate::utils::range::parse_range;
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use hullmedia_core::AppError;
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/api/v0/hull-images/{id}/original",
    tag = "hull-images",
    params(
        ("id" = i64, Path, description = "Media ID"),
        ("Range" = Option<String>, Header, description = "Single byte range: bytes=a-b, bytes=a- or bytes=-n")
    ),
    responses(
        (status = 200, description = "Original file", content_type = "application/octet-stream"),
        (status = 206, description = "Requested byte range", content_type = "application/octet-stream"),
        (status = 404, description = "Media not found", body = ErrorResponse),
        (status = 416, description = "Range outside the file", body = ErrorResponse)
    )
)]
pub async fn download_original(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    request_headers: HeaderMap,
) -> Result<impl IntoResponse, HttpAppError> {
    let range = header_str(&request_headers, header::RANGE.as_str()).and_then(parse_range);
    let download = state.media.service.download(id, range).await?;

    tracing::debug!(media_id = id, storage_key = %download.record.storage_key, "Proxying file from storage");

    let content_length = download.reader.content_length();
    let total = download.reader.total_size;
    let served = download.reader.range;

    let mut builder = Response::builder()
        .header(header::CONTENT_TYPE, download.record.content_type.as_str())
        .header(header::CONTENT_LENGTH, content_length)
        .header(header::ACCEPT_RANGES, "bytes")
        .header(
            header::CONTENT_DISPOSITION,
            format!(
                "attachment; filename=\"{}\"",
                download.record.original_filename.replace(['"', '\\'], "_")
            ),
        )
        .header(header::CACHE_CONTROL, "private, max-age=3600");

    builder = match (download.partial, served) {
        (true, Some((start, end))) => builder
            .status(StatusCode::PARTIAL_CONTENT)
            .header(header::CONTENT_RANGE, format!("bytes {}-{}/{}", start, end, total)),
        _ => builder.status(StatusCode::OK),
    };

    let response = builder
        .body(stream_body(download.reader))
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to build response");
            HttpAppError::from(AppError::Internal(e.to_string()))
        })?;

    Ok(response)
}
