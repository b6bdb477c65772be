use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use hullmedia_core::models::MediaRecord;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListMediaQuery {
    /// Only records attached to this owner
    pub association_id: Option<i64>,
}

#[utoipa::path(
    get,
    path = "/api/v0/hull-images",
    tag = "hull-images",
    params(ListMediaQuery),
    responses(
        (status = 200, description = "Records, newest first", body = Vec<MediaRecord>)
    )
)]
pub async fn list_media(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListMediaQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let records = state.media.service.list(query.association_id).await?;
    Ok(Json(records))
}

#[utoipa::path(
    get,
    path = "/api/v0/hull-images/{id}",
    tag = "hull-images",
    params(("id" = i64, Path, description = "Media ID")),
    responses(
        (status = 200, description = "Media found", body = MediaRecord),
        (status = 404, description = "Media not found", body = ErrorResponse)
    )
)]
pub async fn get_media(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, HttpAppError> {
    let record = state.media.service.get(id).await?;
    Ok(Json(record))
}
