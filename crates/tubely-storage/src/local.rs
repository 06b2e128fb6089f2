use crate::keys::validate_key;
use crate::traits::{ensure_bucket, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::fs;
use tubely_core::StorageReference;

type HmacSha256 = Hmac<Sha256>;

/// Local filesystem storage implementation
///
/// Objects live under `base_path/<key>`. Presigned URLs point at `base_url/<key>` and carry
/// an expiry and an HMAC-SHA256 signature over `bucket\nkey\nexpires`.
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
    bucket: String,
    signing_secret: Vec<u8>,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "/var/lib/tubely/media")
    /// * `base_url` - Base URL for serving files (e.g., "http://localhost:8091/media")
    /// * `bucket` - Logical bucket name recorded in references
    /// * `signing_secret` - Key for presigned URL signatures
    pub async fn new(
        base_path: impl Into<PathBuf>,
        base_url: String,
        bucket: String,
        signing_secret: impl Into<Vec<u8>>,
    ) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
            bucket,
            signing_secret: signing_secret.into(),
        })
    }

    /// Filesystem path for a key, rejecting keys that could escape the storage root.
    pub fn object_path(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;
        Ok(self.base_path.join(key))
    }

    fn mac(&self) -> StorageResult<HmacSha256> {
        HmacSha256::new_from_slice(&self.signing_secret)
            .map_err(|e| StorageError::SigningFailed(e.to_string()))
    }

    fn signature_payload(&self, key: &str, expires: i64) -> String {
        format!("{}\n{}\n{}", self.bucket, key, expires)
    }

    /// Hex HMAC-SHA256 over the bucket, key and expiry.
    pub fn sign(&self, key: &str, expires: i64) -> StorageResult<String> {
        let mut mac = self.mac()?;
        mac.update(self.signature_payload(key, expires).as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Verify a presigned URL's signature and expiry.
    pub fn verify_signature(&self, key: &str, expires: i64, signature: &str) -> StorageResult<()> {
        if Utc::now().timestamp() > expires {
            return Err(StorageError::InvalidSignature);
        }
        let tag = hex::decode(signature).map_err(|_| StorageError::InvalidSignature)?;
        let mut mac = self.mac()?;
        mac.update(self.signature_payload(key, expires).as_bytes());
        mac.verify_slice(&tag)
            .map_err(|_| StorageError::InvalidSignature)
    }

    /// Ensure parent directory exists
    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Storage for LocalStorage {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn upload_file(
        &self,
        key: &str,
        content_type: &str,
        path: &Path,
    ) -> StorageResult<StorageReference> {
        let reference = StorageReference::new(self.bucket.clone(), key)?;
        let destination = self.object_path(key)?;
        let start = Instant::now();

        self.ensure_parent_dir(&destination).await?;
        let size = fs::copy(path, &destination).await.map_err(|e| {
            tracing::error!(
                error = %e,
                key = %key,
                "Local upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            content_type = %content_type,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local upload successful"
        );

        Ok(reference)
    }

    async fn presigned_get_url(
        &self,
        reference: &StorageReference,
        expires_in: Duration,
    ) -> StorageResult<String> {
        ensure_bucket(&self.bucket, reference)?;
        validate_key(reference.key())?;

        let expires = i64::try_from(expires_in.as_secs())
            .ok()
            .and_then(|ttl| Utc::now().timestamp().checked_add(ttl))
            .ok_or_else(|| {
                StorageError::SigningFailed(format!("expiry out of range: {:?}", expires_in))
            })?;
        let signature = self.sign(reference.key(), expires)?;

        Ok(format!(
            "{}/{}?expires={}&signature={}",
            self.base_url.trim_end_matches('/'),
            reference.key(),
            expires,
            signature
        ))
    }

    async fn delete(&self, reference: &StorageReference) -> StorageResult<()> {
        ensure_bucket(&self.bucket, reference)?;
        let path = self.object_path(reference.key())?;

        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::DeleteFailed(e.to_string())),
        }
    }

    async fn exists(&self, reference: &StorageReference) -> StorageResult<bool> {
        ensure_bucket(&self.bucket, reference)?;
        let path = self.object_path(reference.key())?;
        Ok(fs::try_exists(&path).await?)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
