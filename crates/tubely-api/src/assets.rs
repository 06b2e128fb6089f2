//! Thumbnail assets on the local filesystem.
//!
//! Assets are written under `root` with random names and served back through `base_url`.

use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tubely_core::media_type::media_type_to_ext;
use tubely_core::AppError;
use tubely_storage::random_asset_name;

#[derive(Debug, Clone)]
pub struct AssetStore {
    root: PathBuf,
    base_url: String,
}

impl AssetStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.root).await
    }

    /// File name for an asset of `media_type`.
    pub fn asset_path(name: &str, media_type: &str) -> String {
        format!("{}{}", name, media_type_to_ext(media_type))
    }

    pub fn disk_path(&self, asset_path: &str) -> PathBuf {
        self.root.join(asset_path)
    }

    pub fn url(&self, asset_path: &str) -> String {
        format!("{}/{}", self.base_url, asset_path)
    }

    /// Stream `source` to a fresh asset file, returning its asset path.
    ///
    /// Over `max_bytes` the partial file is removed and `PayloadTooLarge` returned.
    pub async fn save<R>(
        &self,
        source: R,
        media_type: &str,
        max_bytes: u64,
    ) -> Result<String, AppError>
    where
        R: AsyncRead + Unpin,
    {
        let asset_path = Self::asset_path(&random_asset_name(), media_type);
        let path = self.disk_path(&asset_path);

        match write_limited(source, &path, max_bytes).await {
            Ok(size_bytes) => {
                tracing::debug!(asset = %asset_path, size_bytes, "Thumbnail asset written");
                Ok(asset_path)
            }
            Err(e) => {
                self.remove(&asset_path).await;
                Err(e)
            }
        }
    }

    /// Best-effort removal.
    pub async fn remove(&self, asset_path: &str) {
        let path = self.disk_path(asset_path);
        if let Err(e) = fs::remove_file(&path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(error = %e, path = %path.display(), "Failed to remove asset");
            }
        }
    }
}

async fn write_limited<R>(source: R, path: &Path, max_bytes: u64) -> Result<u64, AppError>
where
    R: AsyncRead + Unpin,
{
    let mut file = fs::File::create(path).await?;
    let mut limited = source.take(max_bytes.saturating_add(1));
    let written = tokio::io::copy(&mut limited, &mut file).await?;
    if written > max_bytes {
        return Err(AppError::PayloadTooLarge(format!(
            "Thumbnail exceeds the {} byte limit",
            max_bytes
        )));
    }
    file.flush().await?;
    Ok(written)
}
