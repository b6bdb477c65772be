//! Store, validate, catalog.
//!
//! Every upload path converges here. A stored object that fails validation or cannot be
//! catalogued is deleted again, so no object survives without a record and no record is
//! written for bytes that were not stored.

use futures::StreamExt;
use hullmedia_core::models::{MediaRecord, NewMediaRecord};
use hullmedia_core::AppError;
use hullmedia_db::MediaCatalog;
use hullmedia_processing::{ContentValidator, ImageInfo, ValidationMode};
use hullmedia_storage::{ByteRange, ByteStream, ContentStore, StorageError, StoredObject};
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use tokio::io::AsyncRead;

/// Bytes handed to the validator when only the signature and header are needed
const HEADER_PROBE_BYTES: u64 = 256 * 1024;

const GENERIC_CONTENT_TYPE: &str = "application/octet-stream";

async fn collect_stream(mut stream: ByteStream) -> Result<Vec<u8>, StorageError> {
    let mut out = Vec::new();
    while let Some(chunk) = stream.next().await {
        out.extend_from_slice(&chunk?);
    }
    Ok(out)
}

/// What the pipeline needs to know about an upload besides its bytes
#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub filename: String,
    pub content_type: Option<String>,
    pub association_id: Option<i64>,
    pub mode: ValidationMode,
}

pub struct FinalizePipeline {
    store: Arc<dyn ContentStore>,
    catalog: Arc<dyn MediaCatalog>,
    validator: ContentValidator,
}

impl FinalizePipeline {
    pub fn new(
        store: Arc<dyn ContentStore>,
        catalog: Arc<dyn MediaCatalog>,
        validator: ContentValidator,
    ) -> Self {
        Self {
            store,
            catalog,
            validator,
        }
    }

    pub fn validator(&self) -> &ContentValidator {
        &self.validator
    }

    /// Finalize a completed temp file.
    pub async fn finalize_file(
        &self,
        path: &Path,
        request: IngestRequest,
    ) -> Result<MediaRecord, AppError> {
        let file = tokio::fs::File::open(path).await.map_err(|e| {
            AppError::Storage(format!(
                "Failed to open temp upload file {}: {}",
                path.display(),
                e
            ))
        })?;
        self.ingest(Box::pin(file), request).await
    }

    /// Store `reader`, validate what was stored and create the catalog record.
    ///
    /// Content rejected by the validator surfaces as `AppError::Validation` (or
    /// `PayloadTooLarge`); anything else is a storage or catalog failure.
    #[tracing::instrument(skip(self, reader), fields(filename = %request.filename, mode = ?request.mode))]
    pub async fn ingest(
        &self,
        reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
        request: IngestRequest,
    ) -> Result<MediaRecord, AppError> {
        let start = std::time::Instant::now();
        let declared_type = request
            .content_type
            .as_deref()
            .map(str::trim)
            .filter(|ct| !ct.is_empty())
            .unwrap_or(GENERIC_CONTENT_TYPE);

        let stored = self
            .store
            .save(reader, &request.filename, declared_type)
            .await?;

        let info = match self.inspect(&stored, request.mode).await {
            Ok(info) => info,
            Err(e) => {
                self.rollback(&stored.key).await;
                return Err(e);
            }
        };

        let content_type = if declared_type == GENERIC_CONTENT_TYPE {
            info.kind.mime_type().to_string()
        } else {
            declared_type.to_string()
        };

        let record = NewMediaRecord {
            original_filename: request.filename.clone(),
            content_type,
            size_bytes: stored.size as i64,
            sha256: stored.sha256.clone(),
            width: info.width.map(|w| w as i32),
            height: info.height.map(|h| h as i32),
            storage_key: stored.key.clone(),
            association_id: request.association_id,
        };

        let record = match self.catalog.create(record).await {
            Ok(record) => record,
            Err(e) => {
                tracing::error!(storage_key = %stored.key, error = %e, "Failed to catalog stored object");
                self.rollback(&stored.key).await;
                return Err(e);
            }
        };

        tracing::info!(
            media_id = record.id,
            storage_key = %record.storage_key,
            size_bytes = stored.size,
            sha256 = %stored.sha256,
            width = ?record.width,
            height = ?record.height,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Upload finalized"
        );

        Ok(record)
    }

    async fn inspect(&self, stored: &StoredObject, mode: ValidationMode) -> Result<ImageInfo, AppError> {
        self.validator.validate_file_size(stored.size)?;

        let data = match mode {
            ValidationMode::Strict => self.store.read_all(&stored.key).await?,
            ValidationMode::Signature => {
                let reader = self
                    .store
                    .open_read(&stored.key, Some(ByteRange::FromTo(0, HEADER_PROBE_BYTES - 1)))
                    .await?;
                collect_stream(reader.stream).await?
            }
        };

        let validator = self.validator.clone();
        let info = tokio::task::spawn_blocking(move || validator.classify(&data, mode))
            .await
            .map_err(|e| AppError::Internal(format!("Validation task failed: {}", e)))??;

        Ok(info)
    }

    async fn rollback(&self, storage_key: &str) {
        match self.store.delete(storage_key).await {
            Ok(_) => tracing::debug!(storage_key = %storage_key, "Rolled back stored object"),
            Err(e) => tracing::error!(
                storage_key = %storage_key,
                error = %e,
                "Failed to roll back stored object"
            ),
        }
    }
}
