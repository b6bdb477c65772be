//! Shared constants

/// Default chunk size handed to chunked-protocol clients (4 MiB).
pub const DEFAULT_CHUNK_SIZE_BYTES: usize = 4 * 1024 * 1024;

/// Default ceiling for a single upload (10 GiB).
pub const DEFAULT_MAX_UPLOAD_SIZE_MB: u64 = 10 * 1024;

/// Thumbnail edge used when the caller asks for size 0.
pub const DEFAULT_THUMBNAIL_SIZE: u32 = 256;

/// Completion registry entries live for one hour unless configured otherwise.
pub const DEFAULT_UPLOAD_RESULT_TTL_SECS: u64 = 3600;

/// Upload sessions idle longer than this are evicted.
pub const DEFAULT_SESSION_IDLE_TIMEOUT_SECS: u64 = 24 * 60 * 60;

pub const DEFAULT_SESSION_SWEEP_INTERVAL_SECS: u64 = 300;

pub const DEFAULT_STORAGE_ROOT: &str = "storage/hull-images";
pub const DEFAULT_TEMP_UPLOAD_DIR: &str = "storage/temp-uploads";

/// Upper bound for a single PATCH or chunk request body.
pub const DEFAULT_MAX_REQUEST_BODY_MB: usize = 64;

/// Status stored on every catalog record that passed validation.
pub const MEDIA_STATUS_READY: &str = "ready";
