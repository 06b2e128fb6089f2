use crate::keys::validate_key;
use crate::traits::{ensure_bucket, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::buffered::BufWriter;
use object_store::path::Path as ObjectPath;
use object_store::signer::Signer;
use object_store::Error as ObjectStoreError;
use object_store::{Attribute, Attributes, ObjectStore, ObjectStoreExt, Result as ObjectResult};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tubely_core::StorageReference;

/// Objects up to this size go out as a single PUT; larger ones as a multipart upload.
const UPLOAD_BUFFER_BYTES: usize = 10 * 1024 * 1024;

/// S3 storage implementation
#[derive(Clone)]
pub struct S3Storage {
    store: Arc<AmazonS3>,
    bucket: String,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region)
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3Storage {
            store: Arc::new(store),
            bucket,
        })
    }

    fn location(&self, reference: &StorageReference) -> StorageResult<ObjectPath> {
        ensure_bucket(&self.bucket, reference)?;
        Ok(ObjectPath::from(reference.key().to_string()))
    }
}

/// Copy `file` into `location` without holding it in memory. Aborts the upload on failure.
async fn stream_file(
    store: Arc<dyn ObjectStore>,
    location: ObjectPath,
    mut file: File,
    content_type: &str,
    capacity: usize,
) -> std::io::Result<u64> {
    let mut attributes = Attributes::new();
    attributes.insert(Attribute::ContentType, content_type.to_string().into());
    let mut writer = BufWriter::with_capacity(store, location, capacity).with_attributes(attributes);

    let result = async {
        let size = tokio::io::copy(&mut file, &mut writer).await?;
        writer.shutdown().await?;
        Ok::<u64, std::io::Error>(size)
    }
    .await;

    if result.is_err() {
        if let Err(e) = writer.abort().await {
            tracing::warn!(error = %e, "Failed to abort S3 upload");
        }
    }
    result
}

#[async_trait]
impl Storage for S3Storage {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn upload_file(
        &self,
        key: &str,
        content_type: &str,
        path: &Path,
    ) -> StorageResult<StorageReference> {
        validate_key(key)?;
        let reference = StorageReference::new(self.bucket.clone(), key)?;
        let file = tokio::fs::File::open(path).await?;
        let location = ObjectPath::from(key.to_string());

        let start = Instant::now();
        let size = stream_file(
            self.store.clone(),
            location,
            file,
            content_type,
            UPLOAD_BUFFER_BYTES,
        )
        .await
        .map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %key,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            content_type = %content_type,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(reference)
    }

    async fn presigned_get_url(
        &self,
        reference: &StorageReference,
        expires_in: Duration,
    ) -> StorageResult<String> {
        let location = self.location(reference)?;
        let url_result: ObjectResult<_> = self
            .store
            .signed_url(Method::GET, &location, expires_in)
            .await;

        let url = url_result
            .map_err(|e| StorageError::SigningFailed(e.to_string()))?
            .to_string();

        Ok(url)
    }

    async fn delete(&self, reference: &StorageReference) -> StorageResult<()> {
        let start = Instant::now();
        let location = self.location(reference)?;

        let result: ObjectResult<_> = self.store.delete(&location).await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %reference.key(),
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 delete failed"
            );
            StorageError::DeleteFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %reference.key(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );

        Ok(())
    }

    async fn exists(&self, reference: &StorageReference) -> StorageResult<bool> {
        let location = self.location(reference)?;
        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use object_store::memory::InMemory;

    async fn storage() -> S3Storage {
        S3Storage::new(
            "tubely-videos".to_string(),
            "us-east-2".to_string(),
            Some("http://localhost:9000".to_string()),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn presign_rejects_foreign_bucket() {
        let storage = storage().await;
        let reference = StorageReference::new("someone-else", "landscape/k.mp4").unwrap();
        let err = storage
            .presigned_get_url(&reference, Duration::from_secs(600))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::BucketMismatch { .. }));
    }

    #[tokio::test]
    async fn upload_rejects_invalid_key() {
        let storage = storage().await;
        let err = storage
            .upload_file("../escape.mp4", "video/mp4", Path::new("/nonexistent"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }

    async fn stream_through_memory(len: usize, capacity: usize) {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("video.mp4");
        let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        tokio::fs::write(&path, &data).await.unwrap();

        let store = Arc::new(InMemory::new());
        let location = ObjectPath::from("landscape/k.mp4");
        let file = File::open(&path).await.unwrap();
        let size = stream_file(store.clone(), location.clone(), file, "video/mp4", capacity)
            .await
            .unwrap();
        assert_eq!(size, len as u64);

        let stored = store.get(&location).await.unwrap();
        assert_eq!(
            stored.attributes.get(&Attribute::ContentType).map(|v| &**v),
            Some("video/mp4")
        );
        assert_eq!(stored.bytes().await.unwrap().as_ref(), data.as_slice());
    }

    #[tokio::test]
    async fn small_file_is_streamed_in_one_put() {
        stream_through_memory(4096, 64 * 1024).await;
    }

    #[tokio::test]
    async fn large_file_is_streamed_in_parts() {
        stream_through_memory(12 * 1024 * 1024, 5 * 1024 * 1024).await;
    }

    #[tokio::test]
    async fn missing_staged_file_is_an_io_error() {
        let storage = storage().await;
        let err = storage
            .upload_file("landscape/k.mp4", "video/mp4", Path::new("/nonexistent/k.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::IoError(_)));
    }

    #[tokio::test]
    async fn reports_bucket_and_backend() {
        let storage = storage().await;
        assert_eq!(storage.bucket(), "tubely-videos");
        assert_eq!(storage.backend_type(), StorageBackend::S3);
    }
}
