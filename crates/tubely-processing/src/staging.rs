//! Local staging of upload bodies.

use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

use crate::error::StageError;

const SCRATCH_PREFIX: &str = "tubely-upload-";
const SCRATCH_SUFFIX: &str = ".mp4";

/// A scratch file owned by one pipeline invocation.
///
/// The file is deleted when the value is dropped.
#[derive(Debug)]
pub struct StagedFile {
    path: TempPath,
    len: u64,
}

impl StagedFile {
    /// Take ownership of an existing file; it is deleted when the returned value drops.
    pub fn adopt(path: PathBuf, len: u64) -> Self {
        Self {
            path: TempPath::from_path(path),
            len,
        }
    }

    pub(crate) fn with_len(mut self, len: u64) -> Self {
        self.len = len;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Open the file for reading from the start.
    pub async fn open(&self) -> std::io::Result<File> {
        File::open(&self.path).await
    }
}

/// Buffers incoming byte streams into uniquely named scratch files.
#[derive(Debug, Clone)]
pub struct LocalStager {
    scratch_dir: PathBuf,
}

impl LocalStager {
    pub fn new(scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            scratch_dir: scratch_dir.into(),
        }
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// Copy `source` to a new scratch file, failing once more than `max_bytes` arrive.
    ///
    /// The partial file is removed on every error path.
    #[tracing::instrument(skip(self, source), fields(scratch_dir = %self.scratch_dir.display()))]
    pub async fn stage<R>(&self, source: R, max_bytes: u64) -> Result<StagedFile, StageError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let named = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .suffix(SCRATCH_SUFFIX)
            .tempfile_in(&self.scratch_dir)?;
        let (std_file, path) = named.into_parts();
        let mut file = File::from_std(std_file);

        // read one byte past the ceiling to detect oversized bodies
        let mut limited = source.take(max_bytes.saturating_add(1));
        let written = tokio::io::copy(&mut limited, &mut file).await?;
        if written > max_bytes {
            tracing::debug!(limit = max_bytes, "Upload exceeded size ceiling while staging");
            return Err(StageError::TooLarge { limit: max_bytes });
        }

        file.flush().await?;
        file.sync_data().await?;
        drop(file);

        tracing::debug!(
            path = %path.display(),
            size_bytes = written,
            "Upload staged"
        );

        Ok(StagedFile { path, len: written })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn scratch_entries(dir: &TempDir) -> usize {
        std::fs::read_dir(dir.path()).unwrap().count()
    }

    #[tokio::test]
    async fn stages_full_stream() {
        let dir = TempDir::new().unwrap();
        let stager = LocalStager::new(dir.path());
        let body: &[u8] = b"ftypisom....moov....mdat";

        let staged = stager.stage(body, 1024).await.unwrap();
        assert_eq!(staged.len(), body.len() as u64);

        let mut content = Vec::new();
        staged
            .open()
            .await
            .unwrap()
            .read_to_end(&mut content)
            .await
            .unwrap();
        assert_eq!(content, body);
        let file_name = staged.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(file_name.starts_with(SCRATCH_PREFIX));
    }

    #[tokio::test]
    async fn drop_removes_scratch_file() {
        let dir = TempDir::new().unwrap();
        let stager = LocalStager::new(dir.path());
        let staged = stager.stage(&b"abc"[..], 1024).await.unwrap();
        let path = staged.path().to_path_buf();
        assert!(path.exists());
        drop(staged);
        assert!(!path.exists());
        assert_eq!(scratch_entries(&dir), 0);
    }

    #[tokio::test]
    async fn oversized_stream_is_rejected_and_cleaned() {
        let dir = TempDir::new().unwrap();
        let stager = LocalStager::new(dir.path());
        let body = vec![7u8; 2048];

        let err = stager.stage(&body[..], 1024).await.unwrap_err();
        assert!(matches!(err, StageError::TooLarge { limit: 1024 }));
        assert_eq!(scratch_entries(&dir), 0);
    }

    #[tokio::test]
    async fn exactly_at_ceiling_is_accepted() {
        let dir = TempDir::new().unwrap();
        let stager = LocalStager::new(dir.path());
        let body = vec![1u8; 1024];
        let staged = stager.stage(&body[..], 1024).await.unwrap();
        assert_eq!(staged.len(), 1024);
    }

    #[tokio::test]
    async fn concurrent_stages_use_distinct_files() {
        let dir = TempDir::new().unwrap();
        let stager = LocalStager::new(dir.path());
        let (a, b) = tokio::join!(
            stager.stage(&b"first"[..], 64),
            stager.stage(&b"second"[..], 64)
        );
        let (a, b) = (a.unwrap(), b.unwrap());
        assert_ne!(a.path(), b.path());
        assert_eq!(scratch_entries(&dir), 2);
    }

    #[tokio::test]
    async fn missing_scratch_dir_is_io_error() {
        let dir = TempDir::new().unwrap();
        let stager = LocalStager::new(dir.path().join("does-not-exist"));
        let err = stager.stage(&b"x"[..], 64).await.unwrap_err();
        assert!(matches!(err, StageError::Io(_)));
    }
}
