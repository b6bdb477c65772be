//! Resumable upload engine
//!
//! Offset-tracked uploads of a declared length. The server owns the offset: a client that lost
//! its connection asks for it and continues from there. When the last declared byte arrives the
//! engine finalizes inside the same call, and when the client supplied a correlation id the
//! outcome is also written to the completion registry so it can be picked up later.

use hullmedia_core::models::{Completion, PatchOutcome, UploadMetadata, UploadResult, UploadStatus};
use hullmedia_core::AppError;
use hullmedia_db::UploadResultRegistry;
use hullmedia_processing::ValidationMode;
use std::sync::Arc;
use uuid::Uuid;

use super::finalize::{FinalizePipeline, IngestRequest};
use super::session::{
    lock_open, SessionRepository, SessionState, TempUploadDir, UploadProtocol, UploadSession,
};

pub struct ResumableUploadEngine {
    sessions: Arc<dyn SessionRepository>,
    temp: TempUploadDir,
    pipeline: Arc<FinalizePipeline>,
    registry: Arc<dyn UploadResultRegistry>,
}

impl ResumableUploadEngine {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        temp: TempUploadDir,
        pipeline: Arc<FinalizePipeline>,
        registry: Arc<dyn UploadResultRegistry>,
    ) -> Self {
        Self {
            sessions,
            temp,
            pipeline,
            registry,
        }
    }

    /// Open a session for `declared_length` bytes.
    #[tracing::instrument(skip(self, metadata), fields(filename = %metadata.filename))]
    pub async fn create(
        &self,
        declared_length: u64,
        metadata: UploadMetadata,
    ) -> Result<Uuid, AppError> {
        let validator = self.pipeline.validator();
        validator.validate_filename(&metadata.filename)?;
        validator.validate_file_size(declared_length)?;

        let id = Uuid::new_v4();
        let temp_path = self.temp.create(id).await?;

        let mut session = UploadSession::new(
            id,
            UploadProtocol::Resumable,
            metadata.filename.trim().to_string(),
            temp_path,
        );
        session.declared_length = Some(declared_length);
        session.content_type = metadata.content_type;
        session.correlation_id = metadata.correlation_id;
        session.association_id = metadata.association_id;
        let correlation_id = session.correlation_id;
        self.sessions.insert(session);

        tracing::info!(
            session_id = %id,
            declared_length,
            correlation_id = ?correlation_id,
            "Resumable upload created"
        );

        Ok(id)
    }

    /// Current offset and declared length.
    pub async fn status(&self, id: Uuid) -> Result<UploadStatus, AppError> {
        let handle = self.sessions.get(id).ok_or_else(session_not_found)?;
        let session = lock_open(&handle, UploadProtocol::Resumable).await?;
        Ok(UploadStatus {
            offset: session.offset,
            length: session.declared_length.unwrap_or_default(),
        })
    }

    /// Append `data` at `offset`.
    ///
    /// The claimed offset must equal the server's offset, otherwise `AppError::Conflict` is
    /// returned and nothing is written. The call that delivers the last byte also finalizes the
    /// upload and reports the outcome in [`PatchOutcome::completion`]; content rejected by the
    /// validator is reported there as well, while storage or catalog failures are errors.
    #[tracing::instrument(skip(self, data), fields(session_id = %id, len = data.len()))]
    pub async fn patch(
        &self,
        id: Uuid,
        offset: u64,
        data: &[u8],
    ) -> Result<PatchOutcome, AppError> {
        let handle = self.sessions.get(id).ok_or_else(session_not_found)?;
        let mut session = lock_open(&handle, UploadProtocol::Resumable).await?;

        if offset != session.offset {
            tracing::debug!(expected = session.offset, actual = offset, "Offset mismatch");
            return Err(AppError::Conflict {
                expected: session.offset,
                actual: offset,
            });
        }

        let declared = session.declared_length.unwrap_or_default();
        let end = session.offset + data.len() as u64;
        if end > declared {
            return Err(AppError::Validation(format!(
                "Chunk ends at byte {} but the upload length is {}",
                end, declared
            )));
        }

        if data.is_empty() {
            session.touch();
        } else {
            session.append(data).await.map_err(|e| {
                AppError::Storage(format!("Failed to append to upload {}: {}", id, e))
            })?;
        }

        tracing::debug!(offset = session.offset, declared, "Chunk appended");

        if session.offset < declared {
            return Ok(PatchOutcome {
                offset: session.offset,
                completion: None,
            });
        }

        session.state = SessionState::SizeComplete;
        let completion = self.finalize(&mut session).await?;

        Ok(PatchOutcome {
            offset: session.offset,
            completion: Some(completion),
        })
    }

    /// Abort a session and drop what it received.
    #[tracing::instrument(skip(self), fields(session_id = %id))]
    pub async fn cancel(&self, id: Uuid) -> Result<(), AppError> {
        let handle = self.sessions.get(id).ok_or_else(session_not_found)?;
        let mut session = lock_open(&handle, UploadProtocol::Resumable).await?;

        session.state = SessionState::Terminated;
        self.sessions.remove(id);
        self.temp.discard(&session.temp_path).await;

        tracing::info!(offset = session.offset, "Resumable upload cancelled");
        Ok(())
    }

    async fn finalize(&self, session: &mut UploadSession) -> Result<Completion, AppError> {
        session.state = SessionState::Finalizing;
        self.sessions.remove(session.id);

        let request = IngestRequest {
            filename: session.filename.clone(),
            content_type: session.content_type.clone(),
            association_id: session.association_id,
            mode: ValidationMode::Signature,
        };
        let result = self.pipeline.finalize_file(&session.temp_path, request).await;
        self.temp.discard(&session.temp_path).await;

        let (outcome, completion) = match result {
            Ok(record) => {
                session.state = SessionState::Registered;
                (
                    UploadResult::Registered {
                        media_id: record.id,
                    },
                    Ok(Completion::Registered(record)),
                )
            }
            Err(AppError::Validation(reason)) | Err(AppError::PayloadTooLarge(reason)) => {
                session.state = SessionState::Rejected;
                tracing::warn!(session_id = %session.id, reason = %reason, "Upload rejected");
                (
                    UploadResult::Rejected {
                        reason: reason.clone(),
                    },
                    Ok(Completion::Rejected(reason)),
                )
            }
            Err(e) => {
                session.state = SessionState::Rejected;
                tracing::error!(session_id = %session.id, error = %e, "Upload finalize failed");
                (
                    UploadResult::Rejected {
                        reason: e.to_string(),
                    },
                    Err(e),
                )
            }
        };

        if let Some(correlation_id) = session.correlation_id {
            if let Err(e) = self.registry.set(correlation_id, outcome.clone()).await {
                tracing::error!(
                    correlation_id = %correlation_id,
                    error = %e,
                    "Failed to record upload result"
                );
            }
        }

        tracing::info!(
            session_id = %session.id,
            outcome = outcome.kind(),
            correlation_id = ?session.correlation_id,
            "Resumable upload finished"
        );
        session.state = SessionState::Terminated;

        completion
    }
}

fn session_not_found() -> AppError {
    AppError::NotFound("Upload session not found".to_string())
}
