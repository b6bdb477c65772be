use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use hullmedia_core::models::{MediaRecord, UploadResult};
use hullmedia_core::AppError;
use hullmedia_services::Resolution;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;
use uuid::Uuid;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UploadResultQuery {
    /// Correlation id the client attached to its resumable upload
    pub correlation_id: String,
}

/// Look up how a resumable upload ended.
///
/// 404 means the upload has not finished yet or its result expired.
#[utoipa::path(
    get,
    path = "/api/v0/hull-images/uploads/result",
    tag = "uploads",
    params(UploadResultQuery),
    responses(
        (status = 200, description = "Upload registered", body = MediaRecord),
        (status = 400, description = "correlation_id is not a UUID", body = ErrorResponse),
        (status = 404, description = "Not finished yet or expired", body = ErrorResponse),
        (status = 422, description = "Upload was rejected", body = UploadResult)
    )
)]
pub async fn get_upload_result(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UploadResultQuery>,
) -> Result<Response, HttpAppError> {
    let correlation_id = Uuid::parse_str(query.correlation_id.trim())
        .map_err(|_| AppError::Validation("Invalid correlation_id".to_string()))?;

    let response = match state
        .media
        .service
        .resolve_by_correlation(correlation_id)
        .await?
    {
        Resolution::Ready(record) => (StatusCode::OK, Json(record)).into_response(),
        Resolution::Rejected(reason) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(UploadResult::Rejected { reason }),
        )
            .into_response(),
    };

    Ok(response)
}
