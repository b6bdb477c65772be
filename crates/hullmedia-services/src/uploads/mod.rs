//! Upload protocols
//!
//! Two ways in, one way through: the resumable engine and the chunked manager both hand a
//! completed temp file to the [`FinalizePipeline`].

pub mod chunked;
pub mod finalize;
pub mod resumable;
pub mod session;

pub use chunked::ChunkedUploadManager;
pub use finalize::{FinalizePipeline, IngestRequest};
pub use resumable::ResumableUploadEngine;
pub use session::{
    InMemorySessionRepository, SessionHandle, SessionRepository, SessionState, TempUploadDir,
    UploadProtocol, UploadSession,
};
