use crate::error::{ErrorResponse, HttpAppError};
use crate::handlers::stream_body;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use hullmedia_core::AppError;
use std::sync::Arc;

/// Thumbnail bounded to `size` pixels per edge, created on first request.
///
/// A size of 0 or less selects the default size.
#[utoipa::path(
    get,
    path = "/api/v0/hull-images/{id}/thumbnail/{size}",
    tag = "hull-images",
    params(
        ("id" = i64, Path, description = "Media ID"),
        ("size" = i64, Path, description = "Longest edge in pixels")
    ),
    responses(
        (status = 200, description = "JPEG thumbnail", content_type = "image/jpeg"),
        (status = 404, description = "Media not found", body = ErrorResponse)
    )
)]
pub async fn get_thumbnail(
    State(state): State<Arc<AppState>>,
    Path((id, size)): Path<(i64, i64)>,
) -> Result<impl IntoResponse, HttpAppError> {
    let size = u32::try_from(size.max(0)).unwrap_or(u32::MAX);
    let (key, reader) = state.media.service.thumbnail(id, size).await?;

    let file_name = key.rsplit('/').next().unwrap_or("thumbnail.jpg").to_string();
    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "image/jpeg")
        .header(header::CONTENT_LENGTH, reader.content_length())
        .header(
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"{}\"", file_name),
        )
        .header(header::CACHE_CONTROL, "public, max-age=31536000, immutable")
        .body(stream_body(reader))
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to build response");
            HttpAppError::from(AppError::Internal(e.to_string()))
        })?;

    Ok(response)
}
