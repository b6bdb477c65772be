//! Error types module
//!
//! All failures surfaced by the upload pipeline are unified under [`AppError`]. Lower crates
//! keep their own error enums (`StorageError`, `ValidationError`) and convert into this one
//! at the service boundary.
//!
//! The `Database` variant carries a `sqlx::Error` when the `sqlx` feature is enabled and a
//! plain message otherwise.

use std::io;

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Expected errors such as validation failures or offset conflicts
    Debug,
    /// Recoverable issues
    Warn,
    /// Unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "OFFSET_CONFLICT")
    fn error_code(&self) -> &'static str;

    /// Whether the client may retry the same request
    fn is_recoverable(&self) -> bool;

    fn suggested_action(&self) -> Option<&'static str>;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    /// The client's view of a session position disagrees with the server's.
    /// For the resumable protocol these are byte offsets, for the chunked protocol chunk indexes.
    #[error("Conflict: expected {expected}, received {actual}")]
    Conflict { expected: u64, actual: u64 },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Range not satisfiable for object of {total} bytes")]
    RangeNotSatisfiable { total: u64 },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Validation(format!("JSON parsing error: {}", err))
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::Validation(format!("UUID parsing error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, suggested_action, sensitive, log_level).
fn app_error_static_metadata(
    err: &AppError,
) -> (
    u16,
    &'static str,
    bool,
    Option<&'static str>,
    bool,
    LogLevel,
) {
    match err {
        AppError::Database(_) => (
            500,
            "DATABASE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::Validation(_) => (
            400,
            "VALIDATION_ERROR",
            false,
            Some("Check the uploaded content and request parameters"),
            false,
            LogLevel::Debug,
        ),
        AppError::Conflict { .. } => (
            409,
            "OFFSET_CONFLICT",
            true,
            Some("Query the current offset and resume from it"),
            false,
            LogLevel::Debug,
        ),
        AppError::NotFound(_) => (
            404,
            "NOT_FOUND",
            false,
            Some("Verify the resource ID exists"),
            false,
            LogLevel::Debug,
        ),
        AppError::PayloadTooLarge(_) => (
            413,
            "PAYLOAD_TOO_LARGE",
            false,
            Some("Reduce the upload size"),
            false,
            LogLevel::Debug,
        ),
        AppError::RangeNotSatisfiable { .. } => (
            416,
            "RANGE_NOT_SATISFIABLE",
            false,
            Some("Request a range inside the object size"),
            false,
            LogLevel::Debug,
        ),
        AppError::Storage(_) => (
            500,
            "STORAGE_ERROR",
            true,
            Some("Retry after a short delay"),
            true,
            LogLevel::Error,
        ),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => (
            500,
            "INTERNAL_ERROR",
            true,
            Some("Contact support if this error persists"),
            true,
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Variant name, used as `error_type` in responses and logs
    pub fn error_type(&self) -> &'static str {
        match self {
            AppError::Database(_) => "Database",
            AppError::Validation(_) => "Validation",
            AppError::Conflict { .. } => "Conflict",
            AppError::NotFound(_) => "NotFound",
            AppError::PayloadTooLarge(_) => "PayloadTooLarge",
            AppError::RangeNotSatisfiable { .. } => "RangeNotSatisfiable",
            AppError::Storage(_) => "Storage",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn suggested_action(&self) -> Option<&'static str> {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Database(_) => "Failed to access database".to_string(),
            AppError::Validation(ref msg) => msg.clone(),
            AppError::Conflict { expected, actual } => format!(
                "Offset mismatch: server is at {}, request claimed {}",
                expected, actual
            ),
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::PayloadTooLarge(ref msg) => msg.clone(),
            AppError::RangeNotSatisfiable { total } => {
                format!("Requested range is outside the {} byte object", total)
            }
            AppError::Storage(_) => "Failed to access storage".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
            AppError::InternalWithSource { .. } => "Internal server error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_database() {
        #[cfg(feature = "sqlx")]
        let err = AppError::from(sqlx::Error::PoolClosed);
        #[cfg(not(feature = "sqlx"))]
        let err = AppError::Database("pool closed".to_string());
        assert_eq!(err.http_status_code(), 500);
        assert_eq!(err.error_code(), "DATABASE_ERROR");
        assert!(err.is_recoverable());
        assert_eq!(err.client_message(), "Failed to access database");
        assert!(err.is_sensitive());
        assert_eq!(err.log_level(), LogLevel::Error);
    }

    #[test]
    fn test_error_metadata_conflict() {
        let err = AppError::Conflict {
            expected: 1024,
            actual: 512,
        };
        assert_eq!(err.http_status_code(), 409);
        assert_eq!(err.error_code(), "OFFSET_CONFLICT");
        assert!(err.is_recoverable());
        assert!(err.client_message().contains("1024"));
        assert!(err.client_message().contains("512"));
        assert!(!err.is_sensitive());
    }

    #[test]
    fn test_error_metadata_validation_and_not_found() {
        let err = AppError::Validation("not an image".to_string());
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.client_message(), "not an image");
        assert_eq!(err.log_level(), LogLevel::Debug);

        let err = AppError::NotFound("Upload session not found".to_string());
        assert_eq!(err.http_status_code(), 404);
        assert_eq!(
            err.suggested_action(),
            Some("Verify the resource ID exists")
        );
    }

    #[test]
    fn test_error_metadata_sizes_and_ranges() {
        assert_eq!(
            AppError::PayloadTooLarge("too big".to_string()).http_status_code(),
            413
        );
        let err = AppError::RangeNotSatisfiable { total: 10 };
        assert_eq!(err.http_status_code(), 416);
        assert_eq!(err.error_type(), "RangeNotSatisfiable");
    }

    #[test]
    fn test_internal_errors_are_sensitive() {
        let err = AppError::from(anyhow::anyhow!("disk exploded"));
        assert!(err.is_sensitive());
        assert_eq!(err.client_message(), "Internal server error");
        assert_eq!(err.error_type(), "Internal");

        let err = AppError::from(io::Error::new(io::ErrorKind::Other, "boom"));
        assert!(err.detailed_message().contains("boom"));
    }
}
