use crate::{ContentStore, LocalContentStore, StorageResult};
use hullmedia_core::Config;
use std::sync::Arc;

/// Create the content store described by the configuration
pub async fn create_content_store(config: &Config) -> StorageResult<Arc<dyn ContentStore>> {
    let store = LocalContentStore::new(config.storage_root()).await?;

    tracing::info!(
        root = %store.base_path().display(),
        "Content store initialized"
    );

    Ok(Arc::new(store))
}
