//! Test helpers: build AppState and router for integration tests.
//!
//! The metadata store is in memory, objects go to `LocalStorage` under a temp dir, and
//! ffprobe/ffmpeg are replaced by small shell scripts.

#![allow(dead_code)]

pub mod auth;
pub mod fixtures;

use axum_test::TestServer;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tubely_api::setup::{routes, services};
use tubely_api::AppState;
use tubely_core::{BaseConfig, Config, StorageBackend, TubelyConfig};
use tubely_db::InMemoryVideoRepository;
use tubely_storage::{ConfiguredStorage, LocalStorage};

pub const BASE_URL: &str = "http://localhost:8091";
pub const MAX_VIDEO_BYTES: u64 = 64 * 1024;
pub const MAX_THUMBNAIL_BYTES: u64 = 16 * 1024;

/// Reports a 16:9 display aspect ratio.
pub const LANDSCAPE_FFPROBE: &str =
    r#"echo '{"streams":[{"codec_type":"video","display_aspect_ratio":"16:9"}]}'"#;

/// Copies the input (arg 2) to the output (arg 9) behind a `moov` marker.
pub const COPYING_FFMPEG: &str = r#"{ printf 'moov'; cat "$2"; } > "$9""#;

pub const FAILING_FFMPEG: &str = r#"echo 'moov atom not found' >&2; exit 1"#;

pub fn api_path(path: &str) -> String {
    format!("{}{}", tubely_api::constants::API_PREFIX, path)
}

/// Strip the public origin from a URL handed out by the API.
pub fn local_path(url: &str) -> String {
    url.strip_prefix(BASE_URL)
        .unwrap_or_else(|| panic!("unexpected origin in {}", url))
        .to_string()
}

pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub videos: Arc<InMemoryVideoRepository>,
    pub dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn scratch_dir(&self) -> PathBuf {
        self.dir.path().join("scratch")
    }

    pub fn objects_dir(&self) -> PathBuf {
        self.dir.path().join("objects")
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.dir.path().join("assets")
    }

    pub fn scratch_entries(&self) -> usize {
        std::fs::read_dir(self.scratch_dir()).unwrap().count()
    }

    pub fn stored_objects(&self) -> Vec<PathBuf> {
        files_under(&self.objects_dir())
    }
}

pub fn files_under(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                files.extend(files_under(&path));
            } else {
                files.push(path);
            }
        }
    }
    files
}

fn write_script(dir: &Path, name: &str, body: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path.to_string_lossy().into_owned()
}

pub fn create_test_config(root: &Path, ffprobe_path: String, ffmpeg_path: String) -> Config {
    let base = BaseConfig {
        server_port: 8091,
        cors_origins: vec!["*".to_string()],
        db_max_connections: 5,
        db_timeout_seconds: 30,
        jwt_secret: auth::TEST_JWT_SECRET.to_string(),
        environment: "test".to_string(),
        log_format: "text".to_string(),
    };

    Config(Box::new(TubelyConfig {
        base,
        database_url: "postgres://unused@localhost/tubely".to_string(),
        storage_backend: StorageBackend::Local,
        s3_bucket: None,
        s3_region: None,
        s3_endpoint: None,
        aws_region: None,
        local_storage_path: Some(root.join("objects").to_string_lossy().into_owned()),
        local_storage_base_url: Some(format!("{}/media", BASE_URL)),
        local_storage_bucket: "tubely-test".to_string(),
        assets_root: root.join("assets"),
        assets_base_url: format!("{}/assets", BASE_URL),
        max_video_size_bytes: MAX_VIDEO_BYTES,
        max_thumbnail_size_bytes: MAX_THUMBNAIL_BYTES,
        scratch_dir: Some(root.join("scratch")),
        ffmpeg_path,
        ffprobe_path,
        probe_timeout_secs: 10,
        remux_timeout_base_secs: 10,
        remux_timeout_secs_per_mb: 1,
        signed_url_ttl_secs: 600,
    }))
}

/// App whose tools report 16:9 and remux successfully.
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(LANDSCAPE_FFPROBE, COPYING_FFMPEG).await
}

pub async fn setup_test_app_with(ffprobe_body: &str, ffmpeg_body: &str) -> TestApp {
    let dir = tempfile::tempdir().expect("Failed to create temp directory");
    let bin = dir.path().join("bin");
    std::fs::create_dir_all(&bin).unwrap();
    let ffprobe = write_script(&bin, "ffprobe", ffprobe_body);
    let ffmpeg = write_script(&bin, "ffmpeg", ffmpeg_body);

    let config = create_test_config(dir.path(), ffprobe, ffmpeg);

    let storage = LocalStorage::new(
        dir.path().join("objects"),
        format!("{}/media", BASE_URL),
        config.local_storage_bucket().to_string(),
        config.jwt_secret(),
    )
    .await
    .expect("Failed to create local storage");

    let videos = Arc::new(InMemoryVideoRepository::new());
    let state = services::initialize_services(
        &config,
        videos.clone(),
        ConfiguredStorage::Local(Arc::new(storage)),
    )
    .await
    .expect("Failed to initialize services");

    let app = routes::setup_routes(&config, state.clone()).expect("Failed to setup routes");
    let server = TestServer::new(app).expect("Failed to create test server");

    TestApp {
        server,
        state,
        videos,
        dir,
    }
}
