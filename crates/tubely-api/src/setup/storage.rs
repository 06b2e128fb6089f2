//! Storage setup and initialization

use anyhow::{Context, Result};
use tubely_core::Config;
use tubely_storage::{create_storage, ConfiguredStorage};

pub async fn setup_storage(config: &Config) -> Result<ConfiguredStorage> {
    tracing::info!("Initializing storage...");
    let storage = create_storage(config)
        .await
        .context("Failed to initialize storage backend")?;

    let shared = storage.shared();
    tracing::info!(
        backend = %shared.backend_type(),
        bucket = %shared.bucket(),
        "Storage initialized successfully"
    );

    Ok(storage)
}
