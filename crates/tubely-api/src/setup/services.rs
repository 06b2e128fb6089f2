//! Pipeline construction and application state setup

use crate::assets::AssetStore;
use crate::state::AppState;
use anyhow::{Context, Result};
use std::sync::Arc;
use tubely_core::Config;
use tubely_db::VideoRepository;
use tubely_processing::{
    FfmpegFastStart, FfprobeInspector, LocalStager, RemoteRelocator, ToolTimeout, UrlSigner,
    VideoIngestPipeline,
};
use tubely_storage::ConfiguredStorage;

/// Wire the ingestion pipeline and the rest of the application state.
pub async fn initialize_services(
    config: &Config,
    videos: Arc<dyn VideoRepository>,
    storage: ConfiguredStorage,
) -> Result<Arc<AppState>> {
    let shared = storage.shared();

    let scratch_dir = config.scratch_dir();
    tokio::fs::create_dir_all(&scratch_dir)
        .await
        .with_context(|| format!("Failed to create scratch dir {}", scratch_dir.display()))?;

    let inspector = FfprobeInspector::new(config.ffprobe_path(), config.probe_timeout())
        .context("Invalid FFPROBE_PATH")?;
    let rewriter = FfmpegFastStart::new(
        config.ffmpeg_path(),
        ToolTimeout::new(config.remux_timeout_base(), config.remux_timeout_per_mb()),
    )
    .context("Invalid FFMPEG_PATH")?;
    let signer = UrlSigner::new(shared.clone(), config.signed_url_ttl());

    let pipeline = VideoIngestPipeline::new(
        videos.clone(),
        LocalStager::new(scratch_dir.clone()),
        Arc::new(inspector),
        Arc::new(rewriter),
        RemoteRelocator::new(shared),
        signer.clone(),
        config.max_video_size_bytes(),
    );

    let assets = AssetStore::new(config.assets_root(), config.assets_base_url());
    assets
        .ensure_dir()
        .await
        .with_context(|| format!("Failed to create assets dir {}", assets.root().display()))?;

    tracing::info!(
        scratch_dir = %scratch_dir.display(),
        assets_root = %assets.root().display(),
        ffmpeg_path = %config.ffmpeg_path(),
        ffprobe_path = %config.ffprobe_path(),
        signed_url_ttl_secs = config.signed_url_ttl().as_secs(),
        "Ingestion pipeline ready"
    );

    Ok(Arc::new(AppState {
        config: config.clone(),
        videos,
        pipeline: Arc::new(pipeline),
        signer,
        assets,
        local_media: storage.local(),
    }))
}
