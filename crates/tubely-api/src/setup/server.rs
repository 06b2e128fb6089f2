//! Listener binding and graceful shutdown

use anyhow::{Context, Result};
use axum::Router;
use tubely_core::Config;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Bind the listener and serve until SIGINT or SIGTERM. In-flight uploads run to completion.
pub async fn start_server(config: &Config, app: Router) -> Result<()> {
    let addr = format!("0.0.0.0:{}", config.server_port());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!(
        addr = %addr,
        storage_backend = %config.storage_backend(),
        scratch_dir = %config.scratch_dir().display(),
        assets_root = %config.assets_root().display(),
        ffprobe_path = %config.ffprobe_path(),
        ffmpeg_path = %config.ffmpeg_path(),
        max_video_mb = config.max_video_size_bytes() / BYTES_PER_MB,
        max_thumbnail_mb = config.max_thumbnail_size_bytes() / BYTES_PER_MB,
        signed_url_ttl_secs = config.signed_url_ttl().as_secs(),
        "Accepting uploads"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// # Panics
/// Panics if a signal handler cannot be installed.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let signal = tokio::select! {
        _ = ctrl_c => "SIGINT",
        _ = terminate => "SIGTERM",
    };
    tracing::info!(signal, "Draining in-flight requests");
}
