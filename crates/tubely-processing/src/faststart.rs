//! Fast-start remuxing through ffmpeg.
//!
//! The container is copied stream-for-stream with the `moov` index moved ahead of the media
//! data so playback can begin before the whole file has downloaded.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::command::{run_tool, validate_tool_path, ToolError, ToolTimeout};
use crate::error::RemuxError;
use crate::staging::StagedFile;

/// Suffix appended to the input path to name the rewritten file.
pub const OUTPUT_SUFFIX: &str = ".processing";

/// Produces a streaming-optimised copy of a staged file, leaving the input untouched.
#[async_trait]
pub trait MediaRewriter: Send + Sync {
    async fn rewrite(&self, input: &StagedFile) -> Result<StagedFile, RemuxError>;
}

pub fn output_path_for(input: &StagedFile) -> PathBuf {
    let mut path = input.path().as_os_str().to_owned();
    path.push(OUTPUT_SUFFIX);
    PathBuf::from(path)
}

/// Runs `ffmpeg -i <in> -c copy -movflags faststart -f mp4 <in>.processing`.
#[derive(Debug, Clone)]
pub struct FfmpegFastStart {
    ffmpeg_path: String,
    timeout: ToolTimeout,
}

impl FfmpegFastStart {
    pub fn new(ffmpeg_path: impl Into<String>, timeout: ToolTimeout) -> Result<Self, ToolError> {
        let ffmpeg_path = ffmpeg_path.into();
        validate_tool_path(&ffmpeg_path)?;
        Ok(Self {
            ffmpeg_path,
            timeout,
        })
    }
}

#[async_trait]
impl MediaRewriter for FfmpegFastStart {
    #[tracing::instrument(skip(self, input), fields(
        process.executable.path = %self.ffmpeg_path,
        ffmpeg.operation = "faststart",
        size_bytes = input.len()
    ))]
    async fn rewrite(&self, input: &StagedFile) -> Result<StagedFile, RemuxError> {
        let output_path = output_path_for(input);
        // owned before ffmpeg runs so a partial output is removed on failure
        let output = StagedFile::adopt(output_path.clone(), 0);

        let args: Vec<OsString> = vec![
            "-i".into(),
            input.path().as_os_str().to_owned(),
            "-c".into(),
            "copy".into(),
            "-movflags".into(),
            "faststart".into(),
            "-f".into(),
            "mp4".into(),
            output_path.as_os_str().to_owned(),
        ];
        run_tool(&self.ffmpeg_path, args, self.timeout.for_size(input.len())).await?;

        let len = tokio::fs::metadata(&output_path)
            .await
            .map_err(|source| RemuxError::MissingOutput {
                path: output_path.clone(),
                source,
            })?
            .len();

        tracing::debug!(size_bytes = len, "Video remuxed for fast start");
        Ok(output.with_len(len))
    }
}
