//! Storage setup and initialization

use anyhow::{Context, Result};
use hullmedia_core::Config;
use hullmedia_services::{create_content_store, ContentStore};
use std::sync::Arc;

pub async fn setup_storage(config: &Config) -> Result<Arc<dyn ContentStore>> {
    tracing::info!(root = %config.storage_root(), "Initializing content store...");
    let store = create_content_store(config)
        .await
        .context("Failed to initialize content store")?;
    tracing::info!("Content store initialized successfully");
    Ok(store)
}
