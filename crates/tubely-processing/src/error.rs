//! Failure taxonomy of the ingestion pipeline.
//!
//! Each stage has its own error type; [`PipelineError`] wraps them and records which
//! stage failed. Conversion into [`AppError`] decides the HTTP presentation.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;
use thiserror::Error;
use tubely_core::AppError;
use tubely_storage::StorageError;
use uuid::Uuid;

use crate::command::ToolError;

/// States an upload passes through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Validating,
    Staging,
    Inspecting,
    Rewriting,
    Relocating,
    Persisting,
    Signing,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Validating => "validating",
            PipelineStage::Staging => "staging",
            PipelineStage::Inspecting => "inspecting",
            PipelineStage::Rewriting => "rewriting",
            PipelineStage::Relocating => "relocating",
            PipelineStage::Persisting => "persisting",
            PipelineStage::Signing => "signing",
        }
    }
}

impl Display for PipelineStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Preconditions checked before any byte of the upload is read.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("video {0} not found")]
    VideoNotFound(Uuid),

    #[error("user {user_id} does not own video {video_id}")]
    NotOwner { video_id: Uuid, user_id: Uuid },

    #[error("invalid content type: {0:?}")]
    MalformedContentType(String),

    #[error("unsupported content type {0}, expected video/mp4")]
    UnsupportedContentType(String),

    #[error("upload exceeds the maximum size of {limit} bytes")]
    PayloadTooLarge { limit: u64 },
}

#[derive(Debug, Error)]
pub enum StageError {
    #[error("failed to stage upload: {0}")]
    Io(#[from] std::io::Error),

    #[error("upload exceeds the maximum size of {limit} bytes")]
    TooLarge { limit: u64 },
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("unreadable ffprobe output: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum RemuxError {
    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("remuxed output missing at {}: {source}", path.display())]
    MissingOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
#[error("upload of {key} failed: {source}")]
pub struct UploadError {
    pub key: String,
    #[source]
    pub source: StorageError,
}

#[derive(Debug, Error)]
#[error("failed to sign {reference}: {source}")]
pub struct SigningError {
    pub reference: String,
    #[source]
    pub source: StorageError,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("validating: {0}")]
    Validation(#[from] ValidationError),

    #[error("validating: failed to load video: {0}")]
    Lookup(#[source] AppError),

    #[error("staging: {0}")]
    Staging(#[source] std::io::Error),

    #[error("inspecting: {0}")]
    Probe(#[from] ProbeError),

    #[error("rewriting: {0}")]
    Remux(#[from] RemuxError),

    #[error("relocating: {0}")]
    Upload(#[from] UploadError),

    #[error("persisting: {0}")]
    Persist(#[source] AppError),
}

impl PipelineError {
    pub fn stage(&self) -> PipelineStage {
        match self {
            PipelineError::Validation(_) | PipelineError::Lookup(_) => PipelineStage::Validating,
            PipelineError::Staging(_) => PipelineStage::Staging,
            PipelineError::Probe(_) => PipelineStage::Inspecting,
            PipelineError::Remux(_) => PipelineStage::Rewriting,
            PipelineError::Upload(_) => PipelineStage::Relocating,
            PipelineError::Persist(_) => PipelineStage::Persisting,
        }
    }
}

impl From<StageError> for PipelineError {
    fn from(err: StageError) -> Self {
        match err {
            StageError::Io(e) => PipelineError::Staging(e),
            // an oversized body is a rejected precondition, not an IO fault
            StageError::TooLarge { limit } => {
                PipelineError::Validation(ValidationError::PayloadTooLarge { limit })
            }
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::VideoNotFound(_) => AppError::NotFound(err.to_string()),
            ValidationError::NotOwner { .. } => {
                AppError::Forbidden("You do not own this video".to_string())
            }
            ValidationError::MalformedContentType(_) => AppError::BadRequest(err.to_string()),
            ValidationError::UnsupportedContentType(_) => {
                AppError::UnsupportedMediaType(err.to_string())
            }
            ValidationError::PayloadTooLarge { .. } => AppError::PayloadTooLarge(err.to_string()),
        }
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Validation(e) => e.into(),
            PipelineError::Lookup(e) => e,
            PipelineError::Staging(e) => AppError::Internal(format!("Failed to stage upload: {}", e)),
            PipelineError::Probe(ProbeError::Tool(e)) => tool_failure("Could not inspect video", e),
            PipelineError::Probe(e @ ProbeError::Malformed(_)) => {
                AppError::MediaProcessing(format!("Could not inspect video: {}", e))
            }
            PipelineError::Remux(RemuxError::Tool(e)) => {
                tool_failure("Could not prepare video for streaming", e)
            }
            PipelineError::Remux(e @ RemuxError::MissingOutput { .. }) => {
                AppError::Internal(format!("Could not prepare video for streaming: {}", e))
            }
            PipelineError::Upload(e) => AppError::Storage(e.to_string()),
            PipelineError::Persist(e) => e,
        }
    }
}

/// Only a tool that ran and rejected the input is the client's fault.
fn tool_failure(context: &str, err: ToolError) -> AppError {
    match err {
        ToolError::Failed { .. } => AppError::MediaProcessing(format!("{}: {}", context, err)),
        ToolError::TimedOut { .. } => AppError::Timeout(format!("{}: {}", context, err)),
        ToolError::Spawn { .. } | ToolError::InvalidPath(_) => {
            AppError::Internal(format!("{}: {}", context, err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tubely_core::ErrorMetadata;

    #[test]
    fn errors_carry_their_stage() {
        let err = PipelineError::from(ValidationError::VideoNotFound(Uuid::nil()));
        assert_eq!(err.stage(), PipelineStage::Validating);
        assert!(err.to_string().starts_with("validating:"));

        let err = PipelineError::from(StageError::Io(std::io::Error::other("disk full")));
        assert_eq!(err.stage(), PipelineStage::Staging);
    }

    #[test]
    fn oversized_stream_is_a_validation_failure() {
        let err = PipelineError::from(StageError::TooLarge { limit: 10 });
        assert_eq!(err.stage(), PipelineStage::Validating);
        assert_eq!(AppError::from(err).http_status_code(), 413);
    }

    #[test]
    fn http_mapping() {
        let status = |e: PipelineError| AppError::from(e).http_status_code();
        assert_eq!(
            status(ValidationError::VideoNotFound(Uuid::nil()).into()),
            404
        );
        assert_eq!(
            status(
                ValidationError::NotOwner {
                    video_id: Uuid::nil(),
                    user_id: Uuid::nil()
                }
                .into()
            ),
            403
        );
        assert_eq!(
            status(ValidationError::UnsupportedContentType("image/gif".into()).into()),
            415
        );
        assert_eq!(
            status(
                UploadError {
                    key: "k".into(),
                    source: StorageError::UploadFailed("503".into())
                }
                .into()
            ),
            502
        );
    }

    #[cfg(unix)]
    fn exit_status(code: i32) -> std::process::ExitStatus {
        use std::os::unix::process::ExitStatusExt;
        std::process::ExitStatus::from_raw(code << 8)
    }

    #[cfg(unix)]
    #[test]
    fn rejected_input_is_unprocessable() {
        let failed = || ToolError::Failed {
            program: "ffmpeg".into(),
            status: exit_status(1),
            stderr: "moov atom not found".into(),
        };
        let err = AppError::from(PipelineError::from(RemuxError::Tool(failed())));
        assert_eq!(err.http_status_code(), 422);
        let err = AppError::from(PipelineError::from(ProbeError::Tool(failed())));
        assert_eq!(err.http_status_code(), 422);

        let garbage = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = AppError::from(PipelineError::from(ProbeError::Malformed(garbage)));
        assert_eq!(err.http_status_code(), 422);
    }

    #[test]
    fn missing_tool_is_a_server_fault() {
        let spawn = || ToolError::Spawn {
            program: "ffprobe".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        for err in [
            PipelineError::from(ProbeError::Tool(spawn())),
            PipelineError::from(RemuxError::Tool(spawn())),
            PipelineError::from(RemuxError::Tool(ToolError::InvalidPath("ff;mpeg".into()))),
        ] {
            let app = AppError::from(err);
            assert_eq!(app.http_status_code(), 500);
            assert_ne!(
                app.suggested_action(),
                Some("Check that the file is a valid MP4 video")
            );
        }
    }

    #[test]
    fn tool_timeout_is_a_gateway_timeout() {
        let timed_out = || ToolError::TimedOut {
            program: "ffmpeg".into(),
            timeout: std::time::Duration::from_secs(30),
        };
        let err = AppError::from(PipelineError::from(ProbeError::Tool(timed_out())));
        assert_eq!(err.http_status_code(), 504);
        let err = AppError::from(PipelineError::from(RemuxError::Tool(timed_out())));
        assert_eq!(err.http_status_code(), 504);
        assert!(err.is_recoverable());
    }
}
