//! Tubely video ingestion pipeline
//!
//! An upload moves through a fixed sequence of stages:
//!
//! 1. [`LocalStager`] buffers the request body into a scratch file.
//! 2. A [`MediaInspector`] (ffprobe) classifies the display aspect ratio.
//! 3. A [`MediaRewriter`] (ffmpeg) moves the `moov` atom to the front of the container.
//! 4. [`RemoteRelocator`] uploads the rewritten file under `<aspect>/<random>.<ext>`.
//! 5. The location is persisted, and [`UrlSigner`] presents the record with a
//!    time-limited URL.
//!
//! [`VideoIngestPipeline`] sequences the stages. Scratch files are owned by
//! [`StagedFile`] values and removed when they are dropped, on every exit path.

pub mod command;
pub mod error;
pub mod faststart;
pub mod inspect;
pub mod pipeline;
pub mod relocate;
pub mod signer;
pub mod staging;

pub use command::{run_tool, ToolError, ToolTimeout};
pub use error::{
    PipelineError, PipelineStage, ProbeError, RemuxError, SigningError, StageError, UploadError,
    ValidationError,
};
pub use faststart::{FfmpegFastStart, MediaRewriter};
pub use inspect::{FfprobeInspector, MediaInspector};
pub use pipeline::{IngestRequest, VideoIngestPipeline};
pub use relocate::RemoteRelocator;
pub use signer::UrlSigner;
pub use staging::{LocalStager, StagedFile};
