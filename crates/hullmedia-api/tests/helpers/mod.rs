//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p hullmedia-api`. The catalog and upload result
//! registry run in memory, storage and temp files live in a per-test directory.

pub mod fixtures;

use axum_test::TestServer;
use hullmedia_api::constants;
use hullmedia_api::setup::{initialize_state, routes};
use hullmedia_api::state::AppState;
use hullmedia_core::{Config, MediaServiceConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

pub const MAX_UPLOAD_BYTES: u64 = 2 * 1024 * 1024;
pub const MAX_REQUEST_BODY_BYTES: usize = 256 * 1024;
pub const CHUNK_SIZE_BYTES: usize = 64 * 1024;

/// API path prefix for tests (e.g. `/api/v0/hull-images`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

/// Test application: server, state, and owned resources.
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn storage_root(&self) -> PathBuf {
        self._temp_dir.path().join("storage")
    }

    pub fn temp_upload_dir(&self) -> PathBuf {
        self._temp_dir.path().join("uploads")
    }
}

pub fn create_test_config(temp_dir: &TempDir) -> Config {
    Config::new(MediaServiceConfig {
        storage_root: temp_dir.path().join("storage").display().to_string(),
        temp_upload_dir: temp_dir.path().join("uploads").display().to_string(),
        max_upload_size_bytes: MAX_UPLOAD_BYTES,
        max_request_body_bytes: MAX_REQUEST_BODY_BYTES,
        chunk_size_bytes: CHUNK_SIZE_BYTES,
        ..MediaServiceConfig::default()
    })
}

/// Setup test app with in-memory backings and local storage.
pub async fn setup_test_app() -> TestApp {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let config = create_test_config(&temp_dir);

    let (state, _sweeper) = initialize_state(&config)
        .await
        .expect("Failed to initialize state");
    let router = routes::setup_routes(&config, state.clone()).expect("Failed to setup routes");
    let server = TestServer::new(router).expect("Failed to start test server");

    TestApp {
        server,
        state,
        _temp_dir: temp_dir,
    }
}
