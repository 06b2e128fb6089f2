#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(feature = "storage-s3")]
use crate::S3Storage;
use crate::{Storage, StorageBackend, StorageError, StorageResult};
use std::sync::Arc;
use tubely_core::Config;

/// The backend selected by configuration.
///
/// The local backend is also kept concretely so the HTTP layer can verify and serve its
/// presigned URLs.
#[derive(Clone)]
pub enum ConfiguredStorage {
    #[cfg(feature = "storage-s3")]
    S3(Arc<S3Storage>),
    #[cfg(feature = "storage-local")]
    Local(Arc<LocalStorage>),
}

impl ConfiguredStorage {
    pub fn shared(&self) -> Arc<dyn Storage> {
        match self {
            #[cfg(feature = "storage-s3")]
            ConfiguredStorage::S3(storage) => storage.clone(),
            #[cfg(feature = "storage-local")]
            ConfiguredStorage::Local(storage) => storage.clone(),
        }
    }

    #[cfg(feature = "storage-local")]
    pub fn local(&self) -> Option<Arc<LocalStorage>> {
        match self {
            ConfiguredStorage::Local(storage) => Some(storage.clone()),
            #[allow(unreachable_patterns)]
            _ => None,
        }
    }
}

/// Create a storage backend based on configuration
pub async fn create_storage(config: &Config) -> StorageResult<ConfiguredStorage> {
    match config.storage_backend() {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => {
            let bucket = config
                .s3_bucket()
                .map(String::from)
                .ok_or_else(|| StorageError::ConfigError("S3_BUCKET not configured".to_string()))?;
            let region = config
                .s3_region()
                .map(String::from)
                .or_else(|| config.aws_region().map(String::from))
                .ok_or_else(|| {
                    StorageError::ConfigError("S3_REGION or AWS_REGION not configured".to_string())
                })?;
            let endpoint = config.s3_endpoint().map(String::from);

            let storage = S3Storage::new(bucket, region, endpoint).await?;
            Ok(ConfiguredStorage::S3(Arc::new(storage)))
        }

        #[cfg(not(feature = "storage-s3"))]
        StorageBackend::S3 => Err(StorageError::ConfigError(
            "S3 storage backend not available (storage-s3 feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = config
                .local_storage_path()
                .map(String::from)
                .ok_or_else(|| {
                    StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
                })?;
            let base_url = config
                .local_storage_base_url()
                .map(String::from)
                .ok_or_else(|| {
                    StorageError::ConfigError("LOCAL_STORAGE_BASE_URL not configured".to_string())
                })?;

            let storage = LocalStorage::new(
                base_path,
                base_url,
                config.local_storage_bucket().to_string(),
                config.jwt_secret().as_bytes(),
            )
            .await?;
            Ok(ConfiguredStorage::Local(Arc::new(storage)))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}
