use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct PruneResponse {
    /// Records removed because their stored object was missing
    pub removed: u64,
}

#[utoipa::path(
    delete,
    path = "/api/v0/hull-images/{id}",
    tag = "hull-images",
    params(("id" = i64, Path, description = "Media ID")),
    responses(
        (status = 204, description = "Record and stored original deleted"),
        (status = 404, description = "Media not found", body = ErrorResponse),
        (status = 500, description = "Record deleted but the stored original could not be removed", body = ErrorResponse)
    )
)]
pub async fn delete_media(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    state.media.service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/v0/hull-images/prune-missing",
    tag = "hull-images",
    responses(
        (status = 200, description = "Records without a stored object were removed", body = PruneResponse)
    )
)]
pub async fn prune_missing(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let removed = state.media.service.prune_missing().await?;
    Ok(Json(PruneResponse { removed }))
}
