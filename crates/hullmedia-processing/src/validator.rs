use hullmedia_core::AppError;
use image::ImageReader;
use std::io::Cursor;

use crate::signature::{sniff, ImageKind};

const MAX_FILENAME_LEN: usize = 255;

/// Validation errors for uploaded content
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Empty file")]
    EmptyFile,

    #[error("Unsupported or unrecognized image format")]
    UnrecognizedFormat,

    #[error("Image could not be decoded: {0}")]
    Undecodable(String),
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::FileTooLarge { .. } => AppError::PayloadTooLarge(err.to_string()),
            other => AppError::Validation(other.to_string()),
        }
    }
}

/// How much of the content must be proven before it is accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// The signature decides; dimensions are read when the header allows it
    Signature,
    /// The whole image must decode
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub kind: ImageKind,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Content validator
///
/// Owns the size ceiling and the image acceptance rules. Decoding is CPU bound, callers on the
/// async runtime should run [`ContentValidator::classify`] through `spawn_blocking`.
#[derive(Debug, Clone)]
pub struct ContentValidator {
    max_file_size: u64,
}

impl ContentValidator {
    pub fn new(max_file_size: u64) -> Self {
        Self { max_file_size }
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Validate a declared or observed size
    pub fn validate_file_size(&self, size: u64) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }

        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        Ok(())
    }

    /// The client filename is stored verbatim; it only has to be present and printable.
    pub fn validate_filename(&self, filename: &str) -> Result<(), ValidationError> {
        let trimmed = filename.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::InvalidFilename(
                "filename is required".to_string(),
            ));
        }
        if trimmed.len() > MAX_FILENAME_LEN {
            return Err(ValidationError::InvalidFilename(format!(
                "filename exceeds {} bytes",
                MAX_FILENAME_LEN
            )));
        }
        if trimmed.chars().any(|c| c.is_control()) {
            return Err(ValidationError::InvalidFilename(
                "filename contains control characters".to_string(),
            ));
        }
        Ok(())
    }

    /// Sniff the signature, then fully decode the image.
    pub fn validate_image(&self, data: &[u8]) -> Result<ImageInfo, ValidationError> {
        self.classify(data, ValidationMode::Strict)
    }

    pub fn classify(&self, data: &[u8], mode: ValidationMode) -> Result<ImageInfo, ValidationError> {
        if data.is_empty() {
            return Err(ValidationError::EmptyFile);
        }
        let kind = sniff(data).ok_or(ValidationError::UnrecognizedFormat)?;

        let reader = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| ValidationError::Undecodable(e.to_string()))?;

        match mode {
            ValidationMode::Strict => {
                let img = reader
                    .decode()
                    .map_err(|e| ValidationError::Undecodable(e.to_string()))?;
                Ok(ImageInfo {
                    kind,
                    width: Some(img.width()),
                    height: Some(img.height()),
                })
            }
            ValidationMode::Signature => {
                let dims = match reader.into_dimensions() {
                    Ok(dims) => Some(dims),
                    Err(e) => {
                        tracing::debug!(error = %e, "Could not read image dimensions");
                        None
                    }
                };
                Ok(ImageInfo {
                    kind,
                    width: dims.map(|d| d.0),
                    height: dims.map(|d| d.1),
                })
            }
        }
    }
}
