//! Storage abstraction trait

use crate::StorageBackend;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tubely_core::{AppError, ReferenceDecodeError, StorageReference};

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Reference is for bucket {found}, this backend serves {expected}")]
    BucketMismatch { expected: String, found: String },

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Invalid or expired signature")]
    InvalidSignature,

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<ReferenceDecodeError> for StorageError {
    fn from(err: ReferenceDecodeError) -> Self {
        StorageError::InvalidKey(err.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(msg) => AppError::NotFound(msg),
            StorageError::InvalidKey(msg) => AppError::BadRequest(msg),
            StorageError::InvalidSignature => {
                AppError::Unauthorized("Invalid or expired signature".to_string())
            }
            other => AppError::Storage(other.to_string()),
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage abstraction trait
///
/// Objects are addressed by [`StorageReference`] (bucket + key). A backend only serves
/// references for its own bucket.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Bucket this backend writes to.
    fn bucket(&self) -> &str;

    /// Upload a local file to `key`, tagged with `content_type`.
    ///
    /// The reference is returned only once the object has been written.
    async fn upload_file(
        &self,
        key: &str,
        content_type: &str,
        path: &Path,
    ) -> StorageResult<StorageReference>;

    /// Generate a time-limited GET URL for a stored object.
    async fn presigned_get_url(
        &self,
        reference: &StorageReference,
        expires_in: Duration,
    ) -> StorageResult<String>;

    async fn delete(&self, reference: &StorageReference) -> StorageResult<()>;

    async fn exists(&self, reference: &StorageReference) -> StorageResult<bool>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}

/// Reject references that name a bucket other than `expected`.
pub(crate) fn ensure_bucket(expected: &str, reference: &StorageReference) -> StorageResult<()> {
    if reference.bucket() != expected {
        return Err(StorageError::BucketMismatch {
            expected: expected.to_string(),
            found: reference.bucket().to_string(),
        });
    }
    Ok(())
}
