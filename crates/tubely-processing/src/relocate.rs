//! Relocation of rewritten videos into object storage.
//!
//! Keys are `<aspect class>/<random name><ext>`, with a fresh name for every upload.

use std::sync::Arc;
use std::time::Instant;
use tubely_core::{AspectClass, StorageReference};
use tubely_storage::{video_key, Storage};

use crate::error::UploadError;
use crate::staging::StagedFile;

/// Uploads rewritten videos under a fresh random key in remote storage.
#[derive(Clone)]
pub struct RemoteRelocator {
    storage: Arc<dyn Storage>,
}

impl RemoteRelocator {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Upload `file` to `<class>/<random><ext>`, streamed from disk. No retry.
    #[tracing::instrument(skip(self, file), fields(bucket = %self.storage.bucket(), size_bytes = file.len()))]
    pub async fn relocate(
        &self,
        file: &StagedFile,
        content_type: &str,
        class: AspectClass,
    ) -> Result<StorageReference, UploadError> {
        let key = video_key(class, content_type);
        let start = Instant::now();

        let reference = self
            .storage
            .upload_file(&key, content_type, file.path())
            .await
            .map_err(|source| UploadError {
                key: key.clone(),
                source,
            })?;

        tracing::info!(
            key = %reference.key(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Video relocated"
        );
        Ok(reference)
    }

    /// Remove an object whose reference could not be persisted. Failures are logged only.
    pub async fn discard(&self, reference: &StorageReference) {
        if let Err(e) = self.storage.delete(reference).await {
            tracing::warn!(
                error = %e,
                bucket = %reference.bucket(),
                key = %reference.key(),
                "Failed to delete orphaned upload"
            );
        }
    }
}
