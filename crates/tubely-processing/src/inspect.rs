//! Aspect-ratio inspection through ffprobe.

use async_trait::async_trait;
use serde::Deserialize;
use std::ffi::OsString;
use std::time::Duration;
use tubely_core::AspectClass;

use crate::command::{run_tool, validate_tool_path, ToolError};
use crate::error::ProbeError;
use crate::staging::StagedFile;

/// Classifies the display geometry of a staged file.
#[async_trait]
pub trait MediaInspector: Send + Sync {
    async fn inspect(&self, file: &StagedFile) -> Result<AspectClass, ProbeError>;
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    #[serde(default)]
    display_aspect_ratio: Option<String>,
}

/// Classify ffprobe's JSON stream dump by the first stream's `display_aspect_ratio`.
///
/// A missing stream or ratio classifies as `Other`.
pub fn classify_probe_output(stdout: &[u8]) -> Result<AspectClass, ProbeError> {
    let output: ProbeOutput = serde_json::from_slice(stdout)?;
    let ratio = output
        .streams
        .first()
        .and_then(|s| s.display_aspect_ratio.as_deref())
        .unwrap_or("");
    Ok(AspectClass::from_display_aspect_ratio(ratio))
}

/// Runs `ffprobe -v error -of json -show_streams <path>`.
#[derive(Debug, Clone)]
pub struct FfprobeInspector {
    ffprobe_path: String,
    timeout: Duration,
}

impl FfprobeInspector {
    pub fn new(ffprobe_path: impl Into<String>, timeout: Duration) -> Result<Self, ToolError> {
        let ffprobe_path = ffprobe_path.into();
        validate_tool_path(&ffprobe_path)?;
        Ok(Self {
            ffprobe_path,
            timeout,
        })
    }
}

#[async_trait]
impl MediaInspector for FfprobeInspector {
    #[tracing::instrument(skip(self, file), fields(
        process.executable.path = %self.ffprobe_path,
        ffmpeg.operation = "probe",
        size_bytes = file.len()
    ))]
    async fn inspect(&self, file: &StagedFile) -> Result<AspectClass, ProbeError> {
        let args: Vec<OsString> = vec![
            "-v".into(),
            "error".into(),
            "-of".into(),
            "json".into(),
            "-show_streams".into(),
            file.path().as_os_str().to_owned(),
        ];
        let output = run_tool(&self.ffprobe_path, args, self.timeout).await?;
        let class = classify_probe_output(&output.stdout)?;
        tracing::debug!(aspect = %class, "Video inspected");
        Ok(class)
    }
}
