//! Hullmedia Core Library
//!
//! This crate provides the domain models, error types and configuration shared by
//! every hullmedia component.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{BaseConfig, Config, MediaServiceConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
// Note: ContentStore and StorageError live in hullmedia-storage
