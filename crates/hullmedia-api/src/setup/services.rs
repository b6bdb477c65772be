//! Service initialization and application state setup

use crate::state::{AppState, DbState, MediaState, UploadState};
use anyhow::{Context, Result};
use hullmedia_core::Config;
use hullmedia_services::{
    ChunkedUploadManager, ContentStore, ContentValidator, FinalizePipeline,
    InMemoryMediaCatalog, InMemorySessionRepository, InMemoryUploadResultRegistry, MediaCatalog,
    MediaRepository, MediaService, ResumableUploadEngine, SessionRepository, SessionSweeper,
    TempUploadDir, ThumbnailGenerator, UploadResultRegistry, UploadResultRepository,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

/// Initialize all services and repositories, returning the application state.
///
/// The sweeper is returned unstarted; the caller decides whether to run it.
pub async fn initialize_services(
    config: &Config,
    pool: Option<PgPool>,
    storage: Arc<dyn ContentStore>,
) -> Result<(Arc<AppState>, Arc<SessionSweeper>)> {
    let result_ttl = Duration::from_secs(config.upload_result_ttl_secs());

    let (catalog, registry): (Arc<dyn MediaCatalog>, Arc<dyn UploadResultRegistry>) = match &pool
    {
        Some(pool) => (
            Arc::new(MediaRepository::new(pool.clone())),
            Arc::new(UploadResultRepository::new(pool.clone(), result_ttl)),
        ),
        None => (
            Arc::new(InMemoryMediaCatalog::new()),
            Arc::new(InMemoryUploadResultRegistry::new(result_ttl)),
        ),
    };

    let sessions: Arc<dyn SessionRepository> = Arc::new(InMemorySessionRepository::new());
    let temp = TempUploadDir::new(config.temp_upload_dir())
        .await
        .context("Failed to create temporary upload directory")?;

    // Sessions never survive a restart, so every accumulation file on disk is stale.
    match temp.remove_orphans(sessions.as_ref()).await {
        Ok(0) => {}
        Ok(removed) => tracing::info!(removed, "Removed orphaned temporary upload files"),
        Err(e) => tracing::warn!(error = %e, "Failed to scan temporary upload directory"),
    }

    let pipeline = Arc::new(FinalizePipeline::new(
        storage.clone(),
        catalog.clone(),
        ContentValidator::new(config.max_upload_size_bytes()),
    ));

    let resumable = Arc::new(ResumableUploadEngine::new(
        sessions.clone(),
        temp.clone(),
        pipeline.clone(),
        registry.clone(),
    ));
    let chunked = Arc::new(ChunkedUploadManager::new(
        sessions.clone(),
        temp.clone(),
        pipeline.clone(),
        config.chunk_size_bytes(),
    ));

    let thumbnails =
        ThumbnailGenerator::new(storage.clone()).with_default_size(config.default_thumbnail_size());
    let media_service = Arc::new(MediaService::new(
        storage.clone(),
        catalog,
        registry.clone(),
        thumbnails,
        pipeline,
    ));

    let sweeper = Arc::new(SessionSweeper::new(
        sessions,
        temp,
        registry,
        Duration::from_secs(config.session_idle_timeout_secs()),
        Duration::from_secs(config.session_sweep_interval_secs()),
    ));

    tracing::info!(
        backing = if pool.is_some() { "postgres" } else { "in-memory" },
        "Services initialized"
    );

    let state = Arc::new(AppState {
        config: config.clone(),
        db: DbState { pool },
        uploads: UploadState { resumable, chunked },
        media: MediaState {
            service: media_service,
            storage,
            max_upload_size_bytes: config.max_upload_size_bytes(),
        },
    });

    Ok((state, sweeper))
}
