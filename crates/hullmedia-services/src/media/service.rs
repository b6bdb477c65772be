use hullmedia_core::models::{MediaRecord, UploadResult};
use hullmedia_core::AppError;
use hullmedia_db::{MediaCatalog, UploadResultRegistry};
use hullmedia_processing::{ThumbnailGenerator, ValidationMode};
use hullmedia_storage::{ByteRange, ContentStore, ObjectReader};
use std::pin::Pin;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};
use uuid::Uuid;

use crate::uploads::{FinalizePipeline, IngestRequest};

/// An original being served, possibly partially
#[derive(Debug)]
pub struct Download {
    pub record: MediaRecord,
    pub reader: ObjectReader,
    /// A range was requested and is being honoured
    pub partial: bool,
}

/// What a correlation id currently points at
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Ready(MediaRecord),
    Rejected(String),
}

/// Read, lookup and maintenance operations over catalogued media
pub struct MediaService {
    store: Arc<dyn ContentStore>,
    catalog: Arc<dyn MediaCatalog>,
    registry: Arc<dyn UploadResultRegistry>,
    thumbnails: ThumbnailGenerator,
    pipeline: Arc<FinalizePipeline>,
}

impl MediaService {
    pub fn new(
        store: Arc<dyn ContentStore>,
        catalog: Arc<dyn MediaCatalog>,
        registry: Arc<dyn UploadResultRegistry>,
        thumbnails: ThumbnailGenerator,
        pipeline: Arc<FinalizePipeline>,
    ) -> Self {
        Self {
            store,
            catalog,
            registry,
            thumbnails,
            pipeline,
        }
    }

    pub async fn get(&self, id: i64) -> Result<MediaRecord, AppError> {
        self.catalog
            .get(id)
            .await?
            .ok_or_else(|| media_not_found(id))
    }

    pub async fn list(&self, association_id: Option<i64>) -> Result<Vec<MediaRecord>, AppError> {
        self.catalog.list(association_id).await
    }

    /// Stream the original, or the part of it selected by `range`.
    #[tracing::instrument(skip(self))]
    pub async fn download(&self, id: i64, range: Option<ByteRange>) -> Result<Download, AppError> {
        let record = self.get(id).await?;
        let reader = self.store.open_read(&record.storage_key, range).await?;
        let partial = reader.range.is_some();

        tracing::debug!(
            media_id = id,
            storage_key = %record.storage_key,
            content_length = reader.content_length(),
            partial,
            "Serving original"
        );

        Ok(Download {
            record,
            reader,
            partial,
        })
    }

    /// Thumbnail of at most `size` pixels per edge; 0 selects the default size.
    #[tracing::instrument(skip(self))]
    pub async fn thumbnail(&self, id: i64, size: u32) -> Result<(String, ObjectReader), AppError> {
        let record = self.get(id).await?;
        let key = self
            .thumbnails
            .get_or_create(&record.storage_key, size)
            .await?;
        let reader = self.store.open_read(&key, None).await?;
        Ok((key, reader))
    }

    /// Look up the outcome of a resumable upload by the client's correlation id.
    ///
    /// `NotFound` covers both "not finished yet" and "expired", and also a registered record
    /// that was deleted since.
    pub async fn resolve_by_correlation(&self, correlation_id: Uuid) -> Result<Resolution, AppError> {
        match self.registry.try_get(correlation_id).await? {
            Some(UploadResult::Registered { media_id }) => {
                let record = self.get(media_id).await?;
                Ok(Resolution::Ready(record))
            }
            Some(UploadResult::Rejected { reason }) => Ok(Resolution::Rejected(reason)),
            None => Err(AppError::NotFound(format!(
                "No upload result for correlation id {}",
                correlation_id
            ))),
        }
    }

    /// Remove the record, then its original.
    ///
    /// Cached thumbnails are left in place; their keys are never handed out again once the
    /// record is gone. When the original cannot be removed the record stays deleted and the
    /// call fails with `AppError::Storage` naming the orphaned key.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        let record = self.get(id).await?;

        if !self.catalog.delete(id).await? {
            return Err(media_not_found(id));
        }

        match self.store.delete(&record.storage_key).await {
            Ok(existed) => {
                tracing::info!(
                    media_id = id,
                    storage_key = %record.storage_key,
                    object_existed = existed,
                    "Media deleted"
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    media_id = id,
                    storage_key = %record.storage_key,
                    error = %e,
                    "Record deleted but original could not be removed"
                );
                Err(AppError::Storage(format!(
                    "Media {} deleted but its original {} could not be removed: {}",
                    id, record.storage_key, e
                )))
            }
        }
    }

    /// Drop records whose original is no longer in the store.
    #[tracing::instrument(skip(self))]
    pub async fn prune_missing(&self) -> Result<u64, AppError> {
        let mut pruned = 0;
        for record in self.catalog.list(None).await? {
            if self.store.exists(&record.storage_key).await? {
                continue;
            }
            if self.catalog.delete(record.id).await? {
                tracing::info!(
                    media_id = record.id,
                    storage_key = %record.storage_key,
                    "Pruned record without stored object"
                );
                pruned += 1;
            }
        }

        tracing::info!(pruned, "Prune of missing objects finished");
        Ok(pruned)
    }

    /// Single request upload; the whole image must decode.
    #[tracing::instrument(skip(self, reader))]
    pub async fn upload(
        &self,
        reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
        filename: &str,
        content_type: Option<String>,
        association_id: Option<i64>,
    ) -> Result<MediaRecord, AppError> {
        let validator = self.pipeline.validator();
        validator.validate_filename(filename)?;

        // One byte past the ceiling is enough to tell an oversized body apart.
        let limited = reader.take(validator.max_file_size().saturating_add(1));

        self.pipeline
            .ingest(
                Box::pin(limited),
                IngestRequest {
                    filename: filename.trim().to_string(),
                    content_type,
                    association_id,
                    mode: ValidationMode::Strict,
                },
            )
            .await
    }
}

fn media_not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Media {} not found", id))
}
