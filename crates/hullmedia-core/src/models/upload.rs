use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::media::MediaRecord;

/// Client-supplied attributes attached to a resumable upload at creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadMetadata {
    pub filename: String,
    pub content_type: Option<String>,
    /// Token the client polls with once the server finished the upload
    pub correlation_id: Option<Uuid>,
    pub association_id: Option<i64>,
}

/// Outcome recorded in the completion registry for a correlation id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UploadResult {
    Registered { media_id: i64 },
    Rejected { reason: String },
}

impl UploadResult {
    /// Short label stored next to the outcome
    pub fn kind(&self) -> &'static str {
        match self {
            UploadResult::Registered { .. } => "registered",
            UploadResult::Rejected { .. } => "rejected",
        }
    }
}

/// Server-side position of a resumable upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct UploadStatus {
    pub offset: u64,
    pub length: u64,
}

/// How a resumable upload ended once its last byte arrived.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Registered(MediaRecord),
    Rejected(String),
}

/// Result of an accepted PATCH.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchOutcome {
    pub offset: u64,
    /// Present only on the request that delivered the final byte
    pub completion: Option<Completion>,
}

/// Response to starting a chunked upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ChunkedSession {
    pub session_id: Uuid,
    pub chunk_size: usize,
}

/// Acknowledgement of an appended chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ChunkAck {
    pub session_id: Uuid,
    pub index: u64,
    pub next_index: u64,
    pub received_bytes: u64,
}
