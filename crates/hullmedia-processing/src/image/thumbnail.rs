//! Thumbnail generation
//!
//! Thumbnails are JPEGs cached in the content store under `thumbs/{size}/...`. A thumbnail is
//! produced once per (source, size) pair; later requests return the cached key. Sources that
//! cannot be read or decoded get a small light-gray placeholder instead of an error.

use hullmedia_core::constants::DEFAULT_THUMBNAIL_SIZE;
use hullmedia_core::AppError;
use hullmedia_storage::keys::thumbnail_key;
use hullmedia_storage::{ContentStore, StorageError};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageReader, Rgb, RgbImage};
use std::io::Cursor;
use std::sync::Arc;

use super::resize::ImageResize;

const THUMBNAIL_JPEG_QUALITY: u8 = 80;
const PLACEHOLDER_JPEG_QUALITY: u8 = 60;
const PLACEHOLDER_MAX_EDGE: u32 = 8;
const PLACEHOLDER_COLOR: Rgb<u8> = Rgb([0xD3, 0xD3, 0xD3]);

#[derive(Debug, thiserror::Error)]
pub enum ThumbnailError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Failed to encode thumbnail: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Thumbnail task failed: {0}")]
    Task(String),
}

impl From<ThumbnailError> for AppError {
    fn from(err: ThumbnailError) -> Self {
        match err {
            ThumbnailError::Storage(e) => e.into(),
            other => AppError::Internal(other.to_string()),
        }
    }
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, image::ImageError> {
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let mut buf = Vec::new();
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality))?;
    Ok(buf)
}

/// Decode `data`, fit it within `max_edge` and encode the result as JPEG.
pub fn render_thumbnail(data: &[u8], max_edge: u32) -> Result<Vec<u8>, image::ImageError> {
    let img = ImageReader::new(Cursor::new(data))
        .with_guessed_format()?
        .decode()?;
    let resized = ImageResize::resize_to_fit(img, max_edge);
    encode_jpeg(&resized, THUMBNAIL_JPEG_QUALITY)
}

/// Light-gray square of `min(max_edge, 8)` pixels.
pub fn render_placeholder(max_edge: u32) -> Result<Vec<u8>, image::ImageError> {
    let edge = max_edge.clamp(1, PLACEHOLDER_MAX_EDGE);
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(edge, edge, PLACEHOLDER_COLOR));
    encode_jpeg(&img, PLACEHOLDER_JPEG_QUALITY)
}

/// Produces and caches thumbnails of stored originals
#[derive(Clone)]
pub struct ThumbnailGenerator {
    store: Arc<dyn ContentStore>,
    default_size: u32,
}

impl ThumbnailGenerator {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self {
            store,
            default_size: DEFAULT_THUMBNAIL_SIZE,
        }
    }

    /// Size used when a caller asks for 0
    pub fn with_default_size(mut self, default_size: u32) -> Self {
        if default_size > 0 {
            self.default_size = default_size;
        }
        self
    }

    pub fn effective_size(&self, max_size: u32) -> u32 {
        if max_size == 0 {
            self.default_size
        } else {
            max_size
        }
    }

    /// Return the key of the thumbnail of `storage_key`, creating it on first use.
    #[tracing::instrument(skip(self))]
    pub async fn get_or_create(
        &self,
        storage_key: &str,
        max_size: u32,
    ) -> Result<String, ThumbnailError> {
        let size = self.effective_size(max_size);
        let key = thumbnail_key(storage_key, size);

        if self.store.exists(&key).await? {
            tracing::debug!(thumbnail_key = %key, "Thumbnail cache hit");
            return Ok(key);
        }

        let start = std::time::Instant::now();
        let source = match self.store.read_all(storage_key).await {
            Ok(data) => Some(data),
            Err(e @ StorageError::InvalidKey(_)) => return Err(e.into()),
            Err(e) => {
                tracing::warn!(error = %e, "Thumbnail source unreadable, using placeholder");
                None
            }
        };

        let encoded = tokio::task::spawn_blocking(move || match source {
            Some(data) => render_thumbnail(&data, size).or_else(|e| {
                tracing::warn!(error = %e, "Thumbnail source undecodable, using placeholder");
                render_placeholder(size)
            }),
            None => render_placeholder(size),
        })
        .await
        .map_err(|e| ThumbnailError::Task(e.to_string()))??;

        let size_bytes = encoded.len();
        self.store.put_derived(&key, encoded).await?;

        tracing::info!(
            thumbnail_key = %key,
            size,
            size_bytes,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Thumbnail created"
        );

        Ok(key)
    }
}
