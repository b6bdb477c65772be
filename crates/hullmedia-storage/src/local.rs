use crate::keys::{generate_storage_key, validate_key};
use crate::traits::{
    ByteRange, ContentStore, ObjectReader, StorageError, StorageResult, StoredObject,
};
use async_trait::async_trait;
use chrono::Utc;
use futures::StreamExt;
use sha2::{Digest, Sha256};
use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use uuid::Uuid;

const COPY_BUFFER_SIZE: usize = 1024 * 1024;

/// Local filesystem content store
#[derive(Clone)]
pub struct LocalContentStore {
    base_path: PathBuf,
}

impl LocalContentStore {
    /// Create a new store rooted at `base_path` (e.g. "storage/hull-images")
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalContentStore { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        validate_key(storage_key)?;
        Ok(self.base_path.join(storage_key))
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

/// Sibling path used while an object is being written.
fn part_path(path: &Path, tag: &str) -> PathBuf {
    let mut part = path.as_os_str().to_owned();
    part.push(format!(".{}.part", tag));
    PathBuf::from(part)
}

fn map_not_found(err: std::io::Error, storage_key: &str) -> StorageError {
    if err.kind() == ErrorKind::NotFound {
        StorageError::NotFound(storage_key.to_string())
    } else {
        StorageError::DownloadFailed(format!("Failed to read {}: {}", storage_key, err))
    }
}

/// Copy `reader` into `file`, returning (bytes written, upper-case hex SHA-256).
async fn copy_hashing(
    reader: &mut (dyn AsyncRead + Send + Unpin),
    file: &mut fs::File,
) -> std::io::Result<(u64, String)> {
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; COPY_BUFFER_SIZE];
    let mut total = 0u64;
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        file.write_all(&buf[..n]).await?;
        total += n as u64;
    }
    file.flush().await?;
    Ok((total, hex::encode_upper(hasher.finalize())))
}

#[async_trait]
impl ContentStore for LocalContentStore {
    async fn save(
        &self,
        mut reader: Pin<Box<dyn AsyncRead + Send + Unpin>>,
        original_filename: &str,
        _content_type: &str,
    ) -> StorageResult<StoredObject> {
        let created_at = Utc::now();
        let key = generate_storage_key(original_filename, created_at);
        let path = self.key_to_path(&key)?;
        let part = part_path(&path, "upload");
        let start = std::time::Instant::now();

        self.ensure_parent_dir(&path).await?;

        let mut file = fs::File::create(&part).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", part.display(), e))
        })?;

        let written = match copy_hashing(&mut *reader, &mut file).await {
            Ok(written) => file.sync_all().await.map(|_| written),
            Err(e) => Err(e),
        };
        drop(file);

        let (size, sha256) = match written {
            Ok(written) => written,
            Err(e) => {
                let _ = fs::remove_file(&part).await;
                return Err(StorageError::UploadFailed(format!(
                    "Failed to write stream to file {}: {}",
                    part.display(),
                    e
                )));
            }
        };

        if let Err(e) = fs::rename(&part, &path).await {
            let _ = fs::remove_file(&part).await;
            return Err(StorageError::UploadFailed(format!(
                "Failed to publish {}: {}",
                path.display(),
                e
            )));
        }

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = size,
            sha256 = %sha256,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage save successful"
        );

        Ok(StoredObject {
            key,
            size,
            sha256,
            created_at,
        })
    }

    async fn open_read(
        &self,
        storage_key: &str,
        range: Option<ByteRange>,
    ) -> StorageResult<ObjectReader> {
        let path = self.key_to_path(storage_key)?;

        let mut file = fs::File::open(&path)
            .await
            .map_err(|e| map_not_found(e, storage_key))?;
        let total_size = file.metadata().await?.len();

        let served = match range {
            Some(range) => Some(
                range
                    .resolve(total_size)
                    .ok_or(StorageError::RangeNotSatisfiable { total: total_size })?,
            ),
            None => None,
        };

        let (offset, length) = match served {
            Some((start, end)) => (start, end - start + 1),
            None => (0, total_size),
        };
        if offset > 0 {
            file.seek(SeekFrom::Start(offset)).await?;
        }

        let key = storage_key.to_string();
        let stream = tokio_util::io::ReaderStream::new(file.take(length)).map(move |chunk| {
            chunk.map_err(|e| {
                tracing::error!(key = %key, error = %e, "Local storage stream read error");
                StorageError::DownloadFailed(format!("Failed to read chunk: {}", e))
            })
        });

        tracing::debug!(
            key = %storage_key,
            total_size,
            range = ?served,
            "Opened object for reading"
        );

        Ok(ObjectReader {
            stream: Box::pin(stream),
            total_size,
            range: served,
        })
    }

    async fn read_all(&self, storage_key: &str) -> StorageResult<Vec<u8>> {
        let path = self.key_to_path(storage_key)?;
        let start = std::time::Instant::now();

        let data = fs::read(&path)
            .await
            .map_err(|e| map_not_found(e, storage_key))?;

        tracing::debug!(
            key = %storage_key,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage read successful"
        );

        Ok(data)
    }

    async fn put_derived(&self, storage_key: &str, data: Vec<u8>) -> StorageResult<()> {
        let path = self.key_to_path(storage_key)?;
        // one part file per writer
        let part = part_path(&path, &Uuid::new_v4().simple().to_string());
        let size = data.len();

        self.ensure_parent_dir(&path).await?;

        let result = async {
            let mut file = fs::File::create(&part).await?;
            file.write_all(&data).await?;
            file.sync_all().await?;
            drop(file);
            fs::rename(&part, &path).await
        }
        .await;

        if let Err(e) = result {
            let _ = fs::remove_file(&part).await;
            return Err(StorageError::UploadFailed(format!(
                "Failed to publish {}: {}",
                path.display(),
                e
            )));
        }

        tracing::info!(
            key = %storage_key,
            size_bytes = size,
            "Local storage derived object published"
        );

        Ok(())
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(storage_key)?;

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(key = %storage_key, "Local storage delete successful");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::DeleteFailed(format!(
                "Failed to delete file {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(storage_key)?;
        match fs::metadata(&path).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::IoError(e)),
        }
    }
}
