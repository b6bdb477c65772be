//! Application setup and initialization
//!
//! This module contains all application initialization logic extracted from main.rs
//! for better organization and testability.

pub mod database;
pub mod routes;
pub mod server;
pub mod services;
pub mod storage;

use crate::state::AppState;
use anyhow::{Context, Result};
use hullmedia_core::Config;
use hullmedia_services::SessionSweeper;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Validate configuration first - fail fast on misconfiguration
    config.validate().context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(config.log_format(), config.environment())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!("Configuration loaded and validated successfully");

    let (state, sweeper) = initialize_state(&config).await?;
    sweeper.start();

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}

/// Database, storage and services, without telemetry or background tasks
pub async fn initialize_state(config: &Config) -> Result<(Arc<AppState>, Arc<SessionSweeper>)> {
    let pool = match config.database_url() {
        Some(url) => Some(database::setup_database(config, url).await?),
        None => {
            tracing::warn!("DATABASE_URL not set, media catalog and upload results are kept in memory");
            None
        }
    };

    let storage = storage::setup_storage(config).await?;

    services::initialize_services(config, pool, storage).await
}
