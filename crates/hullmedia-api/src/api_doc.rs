//! OpenAPI documentation.
//! API version is in `crate::constants::API_VERSION`.
//! Paths in handler annotations use placeholder /api/v0; they are rewritten when the spec is served.

use utoipa::OpenApi;

use crate::constants::API_VERSION;
use crate::error;
use crate::handlers;
use hullmedia_core::models;

/// Placeholder version used in handler path annotations (utoipa requires compile-time literals).
const OPENAPI_PATH_PLACEHOLDER: &str = "/api/v0";

fn transform_openapi_paths(spec: &mut utoipa::openapi::OpenApi, version: &str) {
    let replacement = format!("/api/{}", version);
    if OPENAPI_PATH_PLACEHOLDER == replacement {
        return;
    }
    let path_map = std::mem::take(&mut spec.paths.paths);
    for (key, item) in path_map {
        let new_key = key.replacen(OPENAPI_PATH_PLACEHOLDER, &replacement, 1);
        spec.paths.paths.insert(new_key, item);
    }
}

/// Returns the OpenAPI spec with path placeholders replaced by the current API version.
pub fn get_openapi_spec() -> utoipa::openapi::OpenApi {
    let mut spec = ApiDoc::openapi();
    transform_openapi_paths(&mut spec, API_VERSION);
    spec
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Hullmedia API",
        version = "0.1.0",
        description = "Hull inspection image uploads. Images arrive through the tus resumable protocol, ordered chunked uploads or a single request body, are validated by content and catalogued. All endpoints are versioned under /api/v0/."
    ),
    paths(
        // Resumable uploads
        handlers::resumable_upload::create_upload,
        handlers::resumable_upload::upload_status,
        handlers::resumable_upload::patch_upload,
        handlers::resumable_upload::terminate_upload,
        handlers::upload_result::get_upload_result,
        // Chunked uploads
        handlers::chunked_upload::start_chunked_upload,
        handlers::chunked_upload::upload_chunk,
        handlers::chunked_upload::complete_chunked_upload,
        handlers::chunked_upload::cancel_chunked_upload,
        // Media
        handlers::media_upload::upload_media,
        handlers::media_get::list_media,
        handlers::media_get::get_media,
        handlers::media_download::download_original,
        handlers::media_thumbnail::get_thumbnail,
        handlers::media_delete::delete_media,
        handlers::media_delete::prune_missing,
        // Health
        handlers::health::health_check,
    ),
    components(
        schemas(
            models::MediaRecord,
            models::MediaStatus,
            models::UploadResult,
            models::UploadStatus,
            models::ChunkedSession,
            models::ChunkAck,
            handlers::chunked_upload::StartChunkedUploadRequest,
            handlers::media_delete::PruneResponse,
            handlers::health::HealthCheckResponse,
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "uploads", description = "Resumable (tus) and chunked upload protocols"),
        (name = "hull-images", description = "Single-shot upload, retrieval, thumbnails and maintenance of catalogued images"),
        (name = "health", description = "Service health")
    )
)]
struct ApiDoc;
