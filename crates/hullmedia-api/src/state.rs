//! Application state shared by every handler.
//!
//! Split into sub-states so each concern is owned in one place; handlers receive the whole
//! `Arc<AppState>` and reach for what they need.

use hullmedia_core::Config;
use hullmedia_services::{ChunkedUploadManager, ContentStore, MediaService, ResumableUploadEngine};
use sqlx::PgPool;
use std::sync::Arc;

/// Database pool, present only when `DATABASE_URL` is configured.
#[derive(Clone)]
pub struct DbState {
    pub pool: Option<PgPool>,
}

/// Both upload protocols
#[derive(Clone)]
pub struct UploadState {
    pub resumable: Arc<ResumableUploadEngine>,
    pub chunked: Arc<ChunkedUploadManager>,
}

/// Retrieval and maintenance of catalogued media
#[derive(Clone)]
pub struct MediaState {
    pub service: Arc<MediaService>,
    pub storage: Arc<dyn ContentStore>,
    pub max_upload_size_bytes: u64,
}

pub struct AppState {
    pub config: Config,
    pub db: DbState,
    pub uploads: UploadState,
    pub media: MediaState,
}
