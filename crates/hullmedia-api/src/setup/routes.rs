//! Route configuration and setup

use crate::constants::{headers, API_PREFIX};
use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, HeaderValue, Method},
    routing::{get, post, put},
    Json, Router,
};
use hullmedia_core::Config;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;
    let request_body_limit = config.max_request_body_bytes();

    let app = Router::new()
        .merge(public_routes())
        .merge(protocol_routes(request_body_limit))
        .merge(media_routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!(
        max_request_body_bytes = request_body_limit,
        prefix = API_PREFIX,
        "Routes configured"
    );

    Ok(app)
}

/// Methods used by the upload protocols and the media endpoints
const ALLOWED_METHODS: [Method; 6] = [
    Method::GET,
    Method::HEAD,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
];

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    // Browsers only hand these to scripts when listed
    let exposed = [
        HeaderName::from_static(headers::UPLOAD_OFFSET),
        HeaderName::from_static(headers::UPLOAD_LENGTH),
        HeaderName::from_static(headers::TUS_RESUMABLE),
        HeaderName::from_static(headers::UPLOAD_MEDIA_ID),
        header::LOCATION,
        header::CONTENT_RANGE,
    ];

    let origins = config.cors_origins();
    let cors = if origins.iter().any(|o| o == "*") {
        if config.is_production() {
            tracing::warn!("CORS configured to allow all origins - not recommended for production");
        }
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins = origins
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;
        CorsLayer::new().allow_origin(origins)
    };

    Ok(cors
        .allow_methods(ALLOWED_METHODS)
        .allow_headers(Any)
        .expose_headers(exposed))
}

/// Health and API documentation
fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route(
            "/api/openapi.json",
            get(|| async { Json(crate::api_doc::get_openapi_spec()) }),
        )
}

/// Resumable and chunked upload routes.
///
/// Each request carries one chunk, so the body is capped at the per-request limit rather than
/// the total upload size.
fn protocol_routes(request_body_limit: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/uploads", API_PREFIX),
            post(handlers::resumable_upload::create_upload),
        )
        .route(
            &format!("{}/uploads/result", API_PREFIX),
            get(handlers::upload_result::get_upload_result),
        )
        .route(
            &format!("{}/uploads/{{id}}", API_PREFIX),
            axum::routing::head(handlers::resumable_upload::upload_status)
                .patch(handlers::resumable_upload::patch_upload)
                .delete(handlers::resumable_upload::terminate_upload),
        )
        .route(
            &format!("{}/chunked/start", API_PREFIX),
            post(handlers::chunked_upload::start_chunked_upload),
        )
        .route(
            &format!("{}/chunked/{{id}}/chunk/{{index}}", API_PREFIX),
            put(handlers::chunked_upload::upload_chunk),
        )
        .route(
            &format!("{}/chunked/{{id}}/complete", API_PREFIX),
            post(handlers::chunked_upload::complete_chunked_upload),
        )
        .route(
            &format!("{}/chunked/{{id}}", API_PREFIX),
            axum::routing::delete(handlers::chunked_upload::cancel_chunked_upload),
        )
        .layer(DefaultBodyLimit::max(request_body_limit))
        .layer(RequestBodyLimitLayer::new(request_body_limit))
}

/// Single-shot upload, retrieval and maintenance of catalogued media.
///
/// The single-shot body is streamed and bounded by the upload size limit in the service.
fn media_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            API_PREFIX,
            get(handlers::media_get::list_media).post(handlers::media_upload::upload_media),
        )
        .route(
            &format!("{}/prune-missing", API_PREFIX),
            post(handlers::media_delete::prune_missing),
        )
        .route(
            &format!("{}/{{id}}", API_PREFIX),
            get(handlers::media_get::get_media).delete(handlers::media_delete::delete_media),
        )
        .route(
            &format!("{}/{{id}}/original", API_PREFIX),
            get(handlers::media_download::download_original),
        )
        .route(
            &format!("{}/{{id}}/thumbnail/{{size}}", API_PREFIX),
            get(handlers::media_thumbnail::get_thumbnail),
        )
}
