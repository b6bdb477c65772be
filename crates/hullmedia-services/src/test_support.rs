use crate::uploads::{FinalizePipeline, InMemorySessionRepository, TempUploadDir};
use hullmedia_db::{InMemoryMediaCatalog, InMemoryUploadResultRegistry};
use hullmedia_processing::ContentValidator;
use hullmedia_storage::LocalContentStore;
use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const MAX_UPLOAD: u64 = 1024 * 1024;

pub fn png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| Rgb([(x * 7) as u8, (y * 13) as u8, 90]));
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .unwrap();
    buffer
}

/// Everything a service needs, backed by a temp directory
pub struct Harness {
    pub dir: TempDir,
    pub store: Arc<LocalContentStore>,
    pub catalog: Arc<InMemoryMediaCatalog>,
    pub registry: Arc<InMemoryUploadResultRegistry>,
    pub sessions: Arc<InMemorySessionRepository>,
    pub temp: TempUploadDir,
    pub pipeline: Arc<FinalizePipeline>,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_ttl(Duration::from_secs(60)).await
    }

    pub async fn with_ttl(ttl: Duration) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(LocalContentStore::new(dir.path().join("store")).await.unwrap());
        let catalog = Arc::new(InMemoryMediaCatalog::new());
        let registry = Arc::new(InMemoryUploadResultRegistry::new(ttl));
        let sessions = Arc::new(InMemorySessionRepository::new());
        let temp = TempUploadDir::new(dir.path().join("temp")).await.unwrap();
        let pipeline = Arc::new(FinalizePipeline::new(
            store.clone(),
            catalog.clone(),
            ContentValidator::new(MAX_UPLOAD),
        ));
        Self {
            dir,
            store,
            catalog,
            registry,
            sessions,
            temp,
            pipeline,
        }
    }

    /// Number of accumulation files still on disk
    pub fn temp_files(&self) -> usize {
        std::fs::read_dir(self.temp.root()).unwrap().count()
    }

    /// Number of stored originals (thumbnails excluded)
    pub fn stored_objects(&self) -> usize {
        let root = self.dir.path().join("store");
        let mut count = 0;
        for shard in std::fs::read_dir(root).unwrap() {
            let shard = shard.unwrap();
            if shard.file_name() == "thumbs" || !shard.path().is_dir() {
                continue;
            }
            count += std::fs::read_dir(shard.path()).unwrap().count();
        }
        count
    }
}
