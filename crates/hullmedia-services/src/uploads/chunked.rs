//! Chunked upload sessions
//!
//! Simpler than the resumable protocol: the total size is not announced and chunks are
//! numbered. Chunks must arrive strictly in order; a chunk carrying any index other than the
//! next expected one is refused with `AppError::Conflict` so that retried or parallel sends
//! can never reorder or duplicate bytes.

use hullmedia_core::models::{ChunkAck, ChunkedSession, MediaRecord};
use hullmedia_core::AppError;
use hullmedia_processing::ValidationMode;
use std::sync::Arc;
use uuid::Uuid;

use super::finalize::{FinalizePipeline, IngestRequest};
use super::session::{
    lock_open, SessionRepository, SessionState, TempUploadDir, UploadProtocol, UploadSession,
};

pub struct ChunkedUploadManager {
    sessions: Arc<dyn SessionRepository>,
    temp: TempUploadDir,
    pipeline: Arc<FinalizePipeline>,
    chunk_size: usize,
}

impl ChunkedUploadManager {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        temp: TempUploadDir,
        pipeline: Arc<FinalizePipeline>,
        chunk_size: usize,
    ) -> Self {
        Self {
            sessions,
            temp,
            pipeline,
            chunk_size,
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn initiate(
        &self,
        filename: &str,
        content_type: Option<String>,
        association_id: Option<i64>,
    ) -> Result<ChunkedSession, AppError> {
        self.pipeline.validator().validate_filename(filename)?;

        let id = Uuid::new_v4();
        let temp_path = self.temp.create(id).await?;

        let mut session = UploadSession::new(
            id,
            UploadProtocol::Chunked,
            filename.trim().to_string(),
            temp_path,
        );
        session.content_type = content_type;
        session.association_id = association_id;
        session.chunk_size = self.chunk_size;
        self.sessions.insert(session);

        tracing::info!(session_id = %id, chunk_size = self.chunk_size, "Chunked upload started");

        Ok(ChunkedSession {
            session_id: id,
            chunk_size: self.chunk_size,
        })
    }

    #[tracing::instrument(skip(self, data), fields(session_id = %id, len = data.len()))]
    pub async fn put_chunk(&self, id: Uuid, index: u64, data: &[u8]) -> Result<ChunkAck, AppError> {
        let handle = self.sessions.get(id).ok_or_else(session_not_found)?;
        let mut session = lock_open(&handle, UploadProtocol::Chunked).await?;

        if index != session.next_chunk_index {
            return Err(AppError::Conflict {
                expected: session.next_chunk_index,
                actual: index,
            });
        }
        if data.is_empty() {
            return Err(AppError::Validation("Chunk is empty".to_string()));
        }
        self.pipeline
            .validator()
            .validate_file_size(session.offset + data.len() as u64)?;

        session.append(data).await.map_err(|e| {
            AppError::Storage(format!("Failed to append chunk {} to {}: {}", index, id, e))
        })?;
        session.next_chunk_index += 1;

        tracing::debug!(offset = session.offset, "Chunk appended");

        Ok(ChunkAck {
            session_id: id,
            index,
            next_index: session.next_chunk_index,
            received_bytes: session.offset,
        })
    }

    /// Close the session and run the received bytes through the finalize pipeline.
    ///
    /// The session is gone afterwards whatever the outcome.
    #[tracing::instrument(skip(self), fields(session_id = %id))]
    pub async fn complete(&self, id: Uuid) -> Result<MediaRecord, AppError> {
        let handle = self.sessions.get(id).ok_or_else(session_not_found)?;
        let mut session = lock_open(&handle, UploadProtocol::Chunked).await?;

        session.state = SessionState::Finalizing;
        self.sessions.remove(id);

        let result = if session.offset == 0 {
            Err(AppError::Validation("No chunks were uploaded".to_string()))
        } else {
            let request = IngestRequest {
                filename: session.filename.clone(),
                content_type: session.content_type.clone(),
                association_id: session.association_id,
                mode: ValidationMode::Signature,
            };
            self.pipeline.finalize_file(&session.temp_path, request).await
        };
        self.temp.discard(&session.temp_path).await;

        match &result {
            Ok(record) => {
                tracing::info!(media_id = record.id, chunks = session.next_chunk_index, "Chunked upload completed");
            }
            Err(e) => tracing::warn!(error = %e, "Chunked upload failed"),
        }
        session.state = SessionState::Terminated;

        result
    }

    #[tracing::instrument(skip(self), fields(session_id = %id))]
    pub async fn cancel(&self, id: Uuid) -> Result<(), AppError> {
        let handle = self.sessions.get(id).ok_or_else(session_not_found)?;
        let mut session = lock_open(&handle, UploadProtocol::Chunked).await?;

        session.state = SessionState::Terminated;
        self.sessions.remove(id);
        self.temp.discard(&session.temp_path).await;

        tracing::info!(received_bytes = session.offset, "Chunked upload cancelled");
        Ok(())
    }
}

fn session_not_found() -> AppError {
    AppError::NotFound("Upload session not found".to_string())
}
