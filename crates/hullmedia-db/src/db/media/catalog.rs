use async_trait::async_trait;
use chrono::Utc;
use hullmedia_core::models::{MediaRecord, NewMediaRecord};
use hullmedia_core::AppError;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// Catalog of validated images
///
/// Implemented by [`crate::MediaRepository`] (PostgreSQL) and [`InMemoryMediaCatalog`].
#[async_trait]
pub trait MediaCatalog: Send + Sync {
    /// Insert a record and return it with its assigned id
    async fn create(&self, record: NewMediaRecord) -> Result<MediaRecord, AppError>;

    async fn get(&self, id: i64) -> Result<Option<MediaRecord>, AppError>;

    /// Newest first, optionally restricted to one association
    async fn list(&self, association_id: Option<i64>) -> Result<Vec<MediaRecord>, AppError>;

    /// Returns `false` when no record had this id
    async fn delete(&self, id: i64) -> Result<bool, AppError>;
}

/// In-process catalog for single-instance deployments and tests
#[derive(Default)]
pub struct InMemoryMediaCatalog {
    inner: RwLock<CatalogState>,
}

#[derive(Default)]
struct CatalogState {
    next_id: i64,
    records: BTreeMap<i64, MediaRecord>,
}

impl InMemoryMediaCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MediaCatalog for InMemoryMediaCatalog {
    async fn create(&self, record: NewMediaRecord) -> Result<MediaRecord, AppError> {
        let mut state = self.inner.write().await;
        state.next_id += 1;
        let record = record.into_record(state.next_id, Utc::now());
        state.records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get(&self, id: i64) -> Result<Option<MediaRecord>, AppError> {
        Ok(self.inner.read().await.records.get(&id).cloned())
    }

    async fn list(&self, association_id: Option<i64>) -> Result<Vec<MediaRecord>, AppError> {
        let state = self.inner.read().await;
        Ok(state
            .records
            .values()
            .rev()
            .filter(|r| association_id.is_none() || r.association_id == association_id)
            .cloned()
            .collect())
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.inner.write().await.records.remove(&id).is_some())
    }
}
