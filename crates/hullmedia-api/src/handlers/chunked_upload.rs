//! Chunked upload handlers.
//!
//! Chunks are sent in order as raw bodies; completion runs the received bytes through the same
//! finalize pipeline as every other upload and answers with the created record.

use crate::constants::API_PREFIX;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use hullmedia_core::models::{ChunkAck, ChunkedSession, MediaRecord};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

/// Request to start a chunked upload
#[derive(Debug, Deserialize, ToSchema)]
pub struct StartChunkedUploadRequest {
    /// Original filename
    pub filename: String,
    /// Content type (MIME type)
    #[serde(default)]
    pub content_type: Option<String>,
    /// Optional owner of the image, e.g. a vessel part
    #[serde(default)]
    pub association_id: Option<i64>,
}

#[utoipa::path(
    post,
    path = "/api/v0/hull-images/chunked/start",
    tag = "uploads",
    request_body = StartChunkedUploadRequest,
    responses(
        (status = 200, description = "Chunked upload started", body = ChunkedSession),
        (status = 400, description = "Invalid input", body = ErrorResponse)
    )
)]
pub async fn start_chunked_upload(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StartChunkedUploadRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let session = state
        .uploads
        .chunked
        .initiate(
            &request.filename,
            request.content_type,
            request.association_id,
        )
        .await?;

    Ok(Json(session))
}

#[utoipa::path(
    put,
    path = "/api/v0/hull-images/chunked/{id}/chunk/{index}",
    tag = "uploads",
    params(
        ("id" = Uuid, Path, description = "Session ID"),
        ("index" = u64, Path, description = "Chunk index, starting at 0")
    ),
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "Chunk appended", body = ChunkAck),
        (status = 400, description = "Empty chunk", body = ErrorResponse),
        (status = 404, description = "Unknown session", body = ErrorResponse),
        (status = 409, description = "Index is not the next expected one", body = ErrorResponse),
        (status = 413, description = "Upload limit exceeded", body = ErrorResponse)
    )
)]
pub async fn upload_chunk(
    State(state): State<Arc<AppState>>,
    Path((id, index)): Path<(Uuid, u64)>,
    body: Bytes,
) -> Result<impl IntoResponse, HttpAppError> {
    let ack = state.uploads.chunked.put_chunk(id, index, &body).await?;
    Ok(Json(ack))
}

#[utoipa::path(
    post,
    path = "/api/v0/hull-images/chunked/{id}/complete",
    tag = "uploads",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 201, description = "Image stored and catalogued", body = MediaRecord),
        (status = 400, description = "Content is not a supported image", body = ErrorResponse),
        (status = 404, description = "Unknown session", body = ErrorResponse)
    )
)]
pub async fn complete_chunked_upload(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let record = state.uploads.chunked.complete(id).await?;

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("{}/{}", API_PREFIX, record.id))],
        Json(record),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v0/hull-images/chunked/{id}",
    tag = "uploads",
    params(("id" = Uuid, Path, description = "Session ID")),
    responses(
        (status = 204, description = "Session discarded"),
        (status = 404, description = "Unknown session", body = ErrorResponse)
    )
)]
pub async fn cancel_chunked_upload(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    state.uploads.chunked.cancel(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
