use crate::constants::{headers, API_PREFIX, DEFAULT_UPLOAD_FILENAME};
use crate::error::{ErrorResponse, HttpAppError};
use crate::handlers::header_str;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use futures::TryStreamExt;
use hullmedia_core::models::MediaRecord;
use hullmedia_core::AppError;
use std::sync::Arc;
use tokio_util::io::StreamReader;

/// Single-shot upload: the raw request body is the image.
#[utoipa::path(
    post,
    path = "/api/v0/hull-images",
    tag = "hull-images",
    params(
        ("X-File-Name" = Option<String>, Header, description = "Original filename"),
        ("X-Association-Id" = Option<i64>, Header, description = "Owner of the image, e.g. a vessel part")
    ),
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status = 201, description = "Image stored and catalogued", body = MediaRecord),
        (status = 400, description = "Body is not a decodable image", body = ErrorResponse),
        (status = 413, description = "Body exceeds the upload limit", body = ErrorResponse)
    )
)]
pub async fn upload_media(
    State(state): State<Arc<AppState>>,
    request_headers: HeaderMap,
    body: Body,
) -> Result<impl IntoResponse, HttpAppError> {
    let max = state.media.max_upload_size_bytes;
    let declared_length = header_str(&request_headers, header::CONTENT_LENGTH.as_str())
        .and_then(|v| v.parse::<u64>().ok());
    if let Some(length) = declared_length {
        if length > max {
            return Err(AppError::PayloadTooLarge(format!(
                "File size {} bytes exceeds the {} byte limit",
                length, max
            ))
            .into());
        }
    }

    let filename = header_str(&request_headers, headers::FILE_NAME)
        .unwrap_or(DEFAULT_UPLOAD_FILENAME)
        .to_string();
    let content_type =
        header_str(&request_headers, header::CONTENT_TYPE.as_str()).map(String::from);
    let association_id = header_str(&request_headers, headers::ASSOCIATION_ID)
        .map(|v| {
            v.parse::<i64>().map_err(|_| {
                AppError::Validation(format!("{} must be an integer", headers::ASSOCIATION_ID))
            })
        })
        .transpose()?;

    let stream = body.into_data_stream().map_err(std::io::Error::other);
    let reader = StreamReader::new(stream);

    let record = state
        .media
        .service
        .upload(Box::pin(reader), &filename, content_type, association_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("{}/{}", API_PREFIX, record.id))],
        Json(record),
    ))
}
