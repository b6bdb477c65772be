//! Resumable upload handlers (tus core protocol).
//!
//! `POST` creates a session of a declared length, `HEAD` reports the server offset, `PATCH`
//! appends at an offset and `DELETE` terminates. The PATCH that delivers the last byte also
//! finalizes the upload.

use crate::constants::{headers, API_PREFIX, OFFSET_OCTET_STREAM, TUS_VERSION};
use crate::error::{ErrorResponse, HttpAppError};
use crate::handlers::{header_str, header_u64};
use crate::state::AppState;
use crate::utils::tus_metadata::parse_upload_metadata;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use hullmedia_core::models::Completion;
use hullmedia_core::AppError;
use std::sync::Arc;
use uuid::Uuid;

#[utoipa::path(
    post,
    path = "/api/v0/hull-images/uploads",
    tag = "uploads",
    params(
        ("Upload-Length" = u64, Header, description = "Total size of the upload in bytes"),
        ("Upload-Metadata" = Option<String>, Header, description = "Comma separated `key base64value` pairs: filename, contentType, correlationId, associationId")
    ),
    responses(
        (status = 201, description = "Upload created; Location names the session"),
        (status = 400, description = "Missing filename or invalid headers", body = ErrorResponse),
        (status = 413, description = "Declared length exceeds the upload limit", body = ErrorResponse)
    )
)]
pub async fn create_upload(
    State(state): State<Arc<AppState>>,
    request_headers: HeaderMap,
) -> Result<impl IntoResponse, HttpAppError> {
    let declared_length = header_u64(&request_headers, headers::UPLOAD_LENGTH)?;
    let metadata = parse_upload_metadata(header_str(&request_headers, headers::UPLOAD_METADATA))?;

    let id = state
        .uploads
        .resumable
        .create(declared_length, metadata)
        .await?;

    Ok((
        StatusCode::CREATED,
        [
            (header::LOCATION, format!("{}/uploads/{}", API_PREFIX, id)),
            (header::HeaderName::from_static(headers::TUS_RESUMABLE), TUS_VERSION.to_string()),
            (header::HeaderName::from_static(headers::UPLOAD_OFFSET), "0".to_string()),
        ],
    ))
}

#[utoipa::path(
    head,
    path = "/api/v0/hull-images/uploads/{id}",
    tag = "uploads",
    params(("id" = Uuid, Path, description = "Upload session ID")),
    responses(
        (status = 200, description = "Upload-Offset and Upload-Length headers carry the state"),
        (status = 404, description = "Unknown, finished or expired session")
    )
)]
pub async fn upload_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let status = state.uploads.resumable.status(id).await?;

    Ok((
        StatusCode::OK,
        [
            (header::HeaderName::from_static(headers::UPLOAD_OFFSET), status.offset.to_string()),
            (header::HeaderName::from_static(headers::UPLOAD_LENGTH), status.length.to_string()),
            (header::HeaderName::from_static(headers::TUS_RESUMABLE), TUS_VERSION.to_string()),
            (header::CACHE_CONTROL, "no-store".to_string()),
        ],
    ))
}

#[utoipa::path(
    patch,
    path = "/api/v0/hull-images/uploads/{id}",
    tag = "uploads",
    params(
        ("id" = Uuid, Path, description = "Upload session ID"),
        ("Upload-Offset" = u64, Header, description = "Offset the chunk starts at")
    ),
    request_body(content = Vec<u8>, content_type = "application/offset+octet-stream"),
    responses(
        (status = 204, description = "Chunk accepted; Upload-Offset is the new offset"),
        (status = 409, description = "Offset does not match the server offset", body = ErrorResponse),
        (status = 415, description = "Wrong content type", body = ErrorResponse),
        (status = 422, description = "Upload finished but the content was rejected", body = ErrorResponse)
    )
)]
pub async fn patch_upload(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    request_headers: HeaderMap,
    body: Bytes,
) -> Result<Response, HttpAppError> {
    let content_type = header_str(&request_headers, header::CONTENT_TYPE.as_str());
    if content_type != Some(OFFSET_OCTET_STREAM) {
        return Ok((
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Json(ErrorResponse::new(
                format!("PATCH requires Content-Type: {}", OFFSET_OCTET_STREAM),
                "UNSUPPORTED_MEDIA_TYPE",
            )),
        )
            .into_response());
    }
    let offset = header_u64(&request_headers, headers::UPLOAD_OFFSET)?;

    let outcome = state.uploads.resumable.patch(id, offset, &body).await?;

    let mut response = match outcome.completion {
        None => StatusCode::NO_CONTENT.into_response(),
        Some(Completion::Registered(record)) => {
            let mut response = StatusCode::NO_CONTENT.into_response();
            response.headers_mut().insert(
                headers::UPLOAD_MEDIA_ID,
                header::HeaderValue::from(record.id),
            );
            response
        }
        Some(Completion::Rejected(reason)) => {
            let app_error = AppError::Validation(reason);
            let mut body = ErrorResponse::new(app_error.to_string(), "UPLOAD_REJECTED");
            body.error_type = Some(app_error.error_type().to_string());
            (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
        }
    };

    let response_headers = response.headers_mut();
    response_headers.insert(headers::UPLOAD_OFFSET, header::HeaderValue::from(outcome.offset));
    response_headers.insert(
        headers::TUS_RESUMABLE,
        header::HeaderValue::from_static(TUS_VERSION),
    );

    Ok(response)
}

#[utoipa::path(
    delete,
    path = "/api/v0/hull-images/uploads/{id}",
    tag = "uploads",
    params(("id" = Uuid, Path, description = "Upload session ID")),
    responses(
        (status = 204, description = "Upload terminated"),
        (status = 404, description = "Unknown session", body = ErrorResponse)
    )
)]
pub async fn terminate_upload(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    state.uploads.resumable.cancel(id).await?;
    Ok((
        StatusCode::NO_CONTENT,
        [(header::HeaderName::from_static(headers::TUS_RESUMABLE), TUS_VERSION)],
    ))
}
