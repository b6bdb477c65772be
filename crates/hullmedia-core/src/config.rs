//! Configuration module
//!
//! Configuration is read from environment variables (after loading a `.env` file if present).
//! Every setting has a default so a bare `cargo run` serves uploads from the working directory
//! with in-process catalog and registry backings.

use std::env;
use std::str::FromStr;

use crate::constants::{
    DEFAULT_CHUNK_SIZE_BYTES, DEFAULT_MAX_REQUEST_BODY_MB, DEFAULT_MAX_UPLOAD_SIZE_MB,
    DEFAULT_SESSION_IDLE_TIMEOUT_SECS, DEFAULT_SESSION_SWEEP_INTERVAL_SECS, DEFAULT_STORAGE_ROOT,
    DEFAULT_TEMP_UPLOAD_DIR, DEFAULT_THUMBNAIL_SIZE, DEFAULT_UPLOAD_RESULT_TTL_SECS,
};

const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const SERVER_PORT: u16 = 4000;

/// Settings shared by any hullmedia server process
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub environment: String,
    /// `json` switches the log output to JSON lines; anything else is compact text
    pub log_format: String,
}

impl Default for BaseConfig {
    fn default() -> Self {
        Self {
            server_port: SERVER_PORT,
            cors_origins: vec!["*".to_string()],
            db_max_connections: MAX_CONNECTIONS,
            db_timeout_seconds: CONNECTION_TIMEOUT_SECS,
            environment: "development".to_string(),
            log_format: "compact".to_string(),
        }
    }
}

/// Upload pipeline configuration
#[derive(Clone, Debug)]
pub struct MediaServiceConfig {
    pub base: BaseConfig,
    /// When unset the catalog and completion registry are kept in process
    pub database_url: Option<String>,
    pub storage_root: String,
    pub temp_upload_dir: String,
    pub max_upload_size_bytes: u64,
    pub max_request_body_bytes: usize,
    pub chunk_size_bytes: usize,
    pub session_idle_timeout_secs: u64,
    pub session_sweep_interval_secs: u64,
    pub upload_result_ttl_secs: u64,
    pub default_thumbnail_size: u32,
}

impl Default for MediaServiceConfig {
    fn default() -> Self {
        Self {
            base: BaseConfig::default(),
            database_url: None,
            storage_root: DEFAULT_STORAGE_ROOT.to_string(),
            temp_upload_dir: DEFAULT_TEMP_UPLOAD_DIR.to_string(),
            max_upload_size_bytes: DEFAULT_MAX_UPLOAD_SIZE_MB * 1024 * 1024,
            max_request_body_bytes: DEFAULT_MAX_REQUEST_BODY_MB * 1024 * 1024,
            chunk_size_bytes: DEFAULT_CHUNK_SIZE_BYTES,
            session_idle_timeout_secs: DEFAULT_SESSION_IDLE_TIMEOUT_SECS,
            session_sweep_interval_secs: DEFAULT_SESSION_SWEEP_INTERVAL_SECS,
            upload_result_ttl_secs: DEFAULT_UPLOAD_RESULT_TTL_SECS,
            default_thumbnail_size: DEFAULT_THUMBNAIL_SIZE,
        }
    }
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<MediaServiceConfig>);

impl Config {
    pub fn new(config: MediaServiceConfig) -> Self {
        Config(Box::new(config))
    }

    fn as_media(&self) -> &MediaServiceConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_env(&self.as_media().base.environment)
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = MediaServiceConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_media().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.as_media().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.as_media().base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.as_media().base.environment
    }

    pub fn log_format(&self) -> &str {
        &self.as_media().base.log_format
    }

    pub fn db_max_connections(&self) -> u32 {
        self.as_media().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.as_media().base.db_timeout_seconds
    }

    pub fn database_url(&self) -> Option<&str> {
        self.as_media().database_url.as_deref()
    }

    pub fn storage_root(&self) -> &str {
        &self.as_media().storage_root
    }

    pub fn temp_upload_dir(&self) -> &str {
        &self.as_media().temp_upload_dir
    }

    pub fn max_upload_size_bytes(&self) -> u64 {
        self.as_media().max_upload_size_bytes
    }

    pub fn max_request_body_bytes(&self) -> usize {
        self.as_media().max_request_body_bytes
    }

    pub fn chunk_size_bytes(&self) -> usize {
        self.as_media().chunk_size_bytes
    }

    pub fn session_idle_timeout_secs(&self) -> u64 {
        self.as_media().session_idle_timeout_secs
    }

    pub fn session_sweep_interval_secs(&self) -> u64 {
        self.as_media().session_sweep_interval_secs
    }

    pub fn upload_result_ttl_secs(&self) -> u64 {
        self.as_media().upload_result_ttl_secs
    }

    pub fn default_thumbnail_size(&self) -> u32 {
        self.as_media().default_thumbnail_size
    }
}

fn is_production_env(environment: &str) -> bool {
    let env = environment.to_lowercase();
    env == "production" || env == "prod"
}

/// Parse an optional numeric variable, falling back to `default` when unset or malformed.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl MediaServiceConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let defaults = MediaServiceConfig::default();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| defaults.base.environment.clone());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        if is_production_env(&environment) && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let base = BaseConfig {
            server_port: match env::var("PORT") {
                Ok(port) => port
                    .parse()
                    .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
                Err(_) => SERVER_PORT,
            },
            cors_origins,
            db_max_connections: env_or("DB_MAX_CONNECTIONS", MAX_CONNECTIONS),
            db_timeout_seconds: env_or("DB_TIMEOUT_SECONDS", CONNECTION_TIMEOUT_SECS),
            environment,
            log_format: env::var("LOG_FORMAT")
                .map(|s| s.trim().to_lowercase())
                .unwrap_or_else(|_| defaults.base.log_format.clone()),
        };

        let max_upload_size_mb: u64 = env_or("MAX_UPLOAD_SIZE_MB", DEFAULT_MAX_UPLOAD_SIZE_MB);
        let max_request_body_mb: usize = env_or("MAX_REQUEST_BODY_MB", DEFAULT_MAX_REQUEST_BODY_MB);

        Ok(MediaServiceConfig {
            base,
            database_url: env::var("DATABASE_URL")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            storage_root: env::var("STORAGE_ROOT").unwrap_or(defaults.storage_root),
            temp_upload_dir: env::var("TEMP_UPLOAD_DIR").unwrap_or(defaults.temp_upload_dir),
            max_upload_size_bytes: max_upload_size_mb * 1024 * 1024,
            max_request_body_bytes: max_request_body_mb * 1024 * 1024,
            chunk_size_bytes: env_or("CHUNK_SIZE_BYTES", DEFAULT_CHUNK_SIZE_BYTES),
            session_idle_timeout_secs: env_or(
                "UPLOAD_SESSION_IDLE_TIMEOUT_SECS",
                DEFAULT_SESSION_IDLE_TIMEOUT_SECS,
            ),
            session_sweep_interval_secs: env_or(
                "SESSION_SWEEP_INTERVAL_SECS",
                DEFAULT_SESSION_SWEEP_INTERVAL_SECS,
            ),
            upload_result_ttl_secs: env_or(
                "UPLOAD_RESULT_TTL_SECS",
                DEFAULT_UPLOAD_RESULT_TTL_SECS,
            ),
            default_thumbnail_size: env_or("DEFAULT_THUMBNAIL_SIZE", DEFAULT_THUMBNAIL_SIZE),
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if let Some(url) = &self.database_url {
            if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
                return Err(anyhow::anyhow!(
                    "DATABASE_URL must be a valid PostgreSQL connection string"
                ));
            }
        }

        if self.storage_root.trim().is_empty() {
            return Err(anyhow::anyhow!("STORAGE_ROOT cannot be empty"));
        }
        if self.temp_upload_dir.trim().is_empty() {
            return Err(anyhow::anyhow!("TEMP_UPLOAD_DIR cannot be empty"));
        }

        if self.max_upload_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_SIZE_MB must be greater than 0"));
        }
        if self.chunk_size_bytes == 0 {
            return Err(anyhow::anyhow!("CHUNK_SIZE_BYTES must be greater than 0"));
        }
        if self.chunk_size_bytes > self.max_request_body_bytes {
            return Err(anyhow::anyhow!(
                "CHUNK_SIZE_BYTES ({}) cannot exceed MAX_REQUEST_BODY_MB ({} bytes)",
                self.chunk_size_bytes,
                self.max_request_body_bytes
            ));
        }
        if self.session_sweep_interval_secs == 0 {
            return Err(anyhow::anyhow!(
                "SESSION_SWEEP_INTERVAL_SECS must be greater than 0"
            ));
        }
        if self.upload_result_ttl_secs == 0 {
            return Err(anyhow::anyhow!("UPLOAD_RESULT_TTL_SECS must be greater than 0"));
        }

        Ok(())
    }
}
