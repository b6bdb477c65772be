//! Upload session state shared by the resumable and chunked protocols.
//!
//! A session is held as `Arc<tokio::sync::Mutex<UploadSession>>`. Every write takes that lock,
//! so writes to one session are serialized. A session removed from the repository is marked
//! closed under its lock; writers that were already waiting observe the flag and back off.

use chrono::{DateTime, Utc};
use hullmedia_core::AppError;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadProtocol {
    /// Offset-tracked upload of a declared length
    Resumable,
    /// Ordered chunks of unknown total length
    Chunked,
}

/// Lifecycle of an upload session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Receiving,
    /// Every declared byte has arrived
    SizeComplete,
    Finalizing,
    Registered,
    Rejected,
    /// Removed by finalize, cancel or eviction; no further writes are accepted
    Terminated,
}

#[derive(Debug)]
pub struct UploadSession {
    pub id: Uuid,
    pub protocol: UploadProtocol,
    /// Total size announced at creation; `None` for the chunked protocol
    pub declared_length: Option<u64>,
    /// Bytes durably appended to the temp file
    pub offset: u64,
    pub filename: String,
    pub content_type: Option<String>,
    pub correlation_id: Option<Uuid>,
    pub association_id: Option<i64>,
    pub temp_path: PathBuf,
    pub created_at: DateTime<Utc>,
    pub last_activity: Instant,
    pub next_chunk_index: u64,
    pub chunk_size: usize,
    pub state: SessionState,
}

impl UploadSession {
    pub fn new(id: Uuid, protocol: UploadProtocol, filename: String, temp_path: PathBuf) -> Self {
        Self {
            id,
            protocol,
            declared_length: None,
            offset: 0,
            filename,
            content_type: None,
            correlation_id: None,
            association_id: None,
            temp_path,
            created_at: Utc::now(),
            last_activity: Instant::now(),
            next_chunk_index: 0,
            chunk_size: 0,
            state: SessionState::Created,
        }
    }

    /// No further writes are accepted once finalize, cancel or eviction started.
    pub fn is_closed(&self) -> bool {
        matches!(
            self.state,
            SessionState::Finalizing
                | SessionState::Registered
                | SessionState::Rejected
                | SessionState::Terminated
        )
    }

    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_activity.elapsed()
    }

    /// Append `data` to the temp file and advance the offset.
    ///
    /// On failure the file is truncated back to the previous offset and nothing changes.
    pub async fn append(&mut self, data: &[u8]) -> io::Result<()> {
        let mut file = fs::OpenOptions::new()
            .append(true)
            .open(&self.temp_path)
            .await?;

        let written = async {
            file.write_all(data).await?;
            file.flush().await?;
            file.sync_data().await
        }
        .await;

        if let Err(e) = written {
            if let Err(truncate_err) = file.set_len(self.offset).await {
                tracing::error!(
                    session_id = %self.id,
                    error = %truncate_err,
                    "Failed to roll back partial append"
                );
            }
            return Err(e);
        }

        self.offset += data.len() as u64;
        self.state = SessionState::Receiving;
        self.touch();
        Ok(())
    }
}

pub type SessionHandle = Arc<Mutex<UploadSession>>;

/// Where live upload sessions are kept
pub trait SessionRepository: Send + Sync {
    fn insert(&self, session: UploadSession) -> SessionHandle;

    fn get(&self, id: Uuid) -> Option<SessionHandle>;

    fn remove(&self, id: Uuid) -> Option<SessionHandle>;

    /// Snapshot of every live session
    fn all(&self) -> Vec<(Uuid, SessionHandle)>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-local session repository
#[derive(Default)]
pub struct InMemorySessionRepository {
    sessions: RwLock<HashMap<Uuid, SessionHandle>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionRepository for InMemorySessionRepository {
    fn insert(&self, session: UploadSession) -> SessionHandle {
        let id = session.id;
        let handle = Arc::new(Mutex::new(session));
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, handle.clone());
        handle
    }

    fn get(&self, id: Uuid) -> Option<SessionHandle> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    fn remove(&self, id: Uuid) -> Option<SessionHandle> {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
    }

    fn all(&self) -> Vec<(Uuid, SessionHandle)> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(id, handle)| (*id, handle.clone()))
            .collect()
    }

    fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Directory holding the accumulation files of live sessions
#[derive(Debug, Clone)]
pub struct TempUploadDir {
    root: PathBuf,
}

impl TempUploadDir {
    pub async fn new(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, id: Uuid) -> PathBuf {
        self.root.join(format!("{}.part", id.simple()))
    }

    /// Create the empty accumulation file of a new session
    pub async fn create(&self, id: Uuid) -> Result<PathBuf, AppError> {
        let path = self.path_for(id);
        fs::File::create(&path).await.map_err(|e| {
            AppError::Storage(format!(
                "Failed to create temp upload file {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(path)
    }

    /// Best-effort removal; a missing file is not an error.
    pub async fn discard(&self, path: &Path) {
        match fs::remove_file(path).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %path.display(),
                error = %e,
                "Failed to remove temp upload file"
            ),
        }
    }

    /// Remove accumulation files left behind by a previous process.
    pub async fn remove_orphans(&self, sessions: &dyn SessionRepository) -> io::Result<usize> {
        let live: Vec<PathBuf> = sessions
            .all()
            .into_iter()
            .map(|(id, _)| self.path_for(id))
            .collect();

        let mut removed = 0;
        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_part = path.extension().is_some_and(|ext| ext == "part");
            if is_part && !live.contains(&path) {
                self.discard(&path).await;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

/// Lock a session for writing, failing when it no longer accepts writes.
pub(crate) async fn lock_open(
    handle: &SessionHandle,
    protocol: UploadProtocol,
) -> Result<tokio::sync::MutexGuard<'_, UploadSession>, AppError> {
    let session = handle.lock().await;
    if session.is_closed() || session.protocol != protocol {
        return Err(AppError::NotFound("Upload session not found".to_string()));
    }
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_append_advances_offset() {
        let dir = tempdir().unwrap();
        let temp = TempUploadDir::new(dir.path()).await.unwrap();
        let id = Uuid::new_v4();
        let path = temp.create(id).await.unwrap();
        let mut session = UploadSession::new(id, UploadProtocol::Resumable, "a.jpg".into(), path);

        session.append(b"hello ").await.unwrap();
        session.append(b"world").await.unwrap();

        assert_eq!(session.offset, 11);
        assert_eq!(session.state, SessionState::Receiving);
        assert_eq!(fs::read(&session.temp_path).await.unwrap(), b"hello world");
    }

    #[tokio::test]
    async fn test_append_to_missing_file_fails_without_mutation() {
        let dir = tempdir().unwrap();
        let mut session = UploadSession::new(
            Uuid::new_v4(),
            UploadProtocol::Chunked,
            "a.jpg".into(),
            dir.path().join("missing/nothing.part"),
        );
        assert!(session.append(b"x").await.is_err());
        assert_eq!(session.offset, 0);
        assert_eq!(session.state, SessionState::Created);
    }

    #[tokio::test]
    async fn test_repository_insert_get_remove() {
        let repo = InMemorySessionRepository::new();
        let id = Uuid::new_v4();
        repo.insert(UploadSession::new(
            id,
            UploadProtocol::Resumable,
            "a.jpg".into(),
            PathBuf::from("x.part"),
        ));

        assert_eq!(repo.len(), 1);
        assert!(repo.get(id).is_some());
        assert!(repo.remove(id).is_some());
        assert!(repo.get(id).is_none());
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn test_lock_open_rejects_closed_and_foreign_sessions() {
        let repo = InMemorySessionRepository::new();
        let id = Uuid::new_v4();
        let handle = repo.insert(UploadSession::new(
            id,
            UploadProtocol::Chunked,
            "a.jpg".into(),
            PathBuf::from("x.part"),
        ));

        assert!(lock_open(&handle, UploadProtocol::Resumable).await.is_err());
        {
            let mut session = lock_open(&handle, UploadProtocol::Chunked).await.unwrap();
            session.state = SessionState::Terminated;
        }
        assert!(matches!(
            lock_open(&handle, UploadProtocol::Chunked).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_remove_orphans_keeps_live_sessions() {
        let dir = tempdir().unwrap();
        let temp = TempUploadDir::new(dir.path()).await.unwrap();
        let repo = InMemorySessionRepository::new();

        let live = Uuid::new_v4();
        let live_path = temp.create(live).await.unwrap();
        repo.insert(UploadSession::new(
            live,
            UploadProtocol::Resumable,
            "a.jpg".into(),
            live_path.clone(),
        ));
        let orphan_path = temp.create(Uuid::new_v4()).await.unwrap();

        assert_eq!(temp.remove_orphans(&repo).await.unwrap(), 1);
        assert!(live_path.exists());
        assert!(!orphan_path.exists());
    }
}
