//! Sequencing of the ingestion stages.

use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncRead;
use tubely_core::media_type::{parse_media_type, VIDEO_MP4};
use tubely_core::{Video, VideoResponse};
use tubely_db::VideoRepository;
use uuid::Uuid;

use crate::error::{PipelineError, PipelineStage, ValidationError};
use crate::faststart::MediaRewriter;
use crate::inspect::MediaInspector;
use crate::relocate::RemoteRelocator;
use crate::signer::UrlSigner;
use crate::staging::LocalStager;

/// One upload to run through the pipeline.
pub struct IngestRequest<R> {
    pub video_id: Uuid,
    pub user_id: Uuid,
    /// Content type declared by the client for the file part.
    pub content_type: String,
    /// Upper bound on the body size announced by the client, when known.
    pub declared_size: Option<u64>,
    pub body: R,
}

pub struct VideoIngestPipeline {
    videos: Arc<dyn VideoRepository>,
    stager: LocalStager,
    inspector: Arc<dyn MediaInspector>,
    rewriter: Arc<dyn MediaRewriter>,
    relocator: RemoteRelocator,
    signer: UrlSigner,
    max_upload_bytes: u64,
}

fn enter(video_id: Uuid, stage: PipelineStage) {
    tracing::debug!(video_id = %video_id, stage = %stage, "Pipeline stage");
}

impl VideoIngestPipeline {
    pub fn new(
        videos: Arc<dyn VideoRepository>,
        stager: LocalStager,
        inspector: Arc<dyn MediaInspector>,
        rewriter: Arc<dyn MediaRewriter>,
        relocator: RemoteRelocator,
        signer: UrlSigner,
        max_upload_bytes: u64,
    ) -> Self {
        Self {
            videos,
            stager,
            inspector,
            rewriter,
            relocator,
            signer,
            max_upload_bytes,
        }
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_bytes
    }

    /// Check every precondition of an upload without touching its body.
    ///
    /// Returns the record and the normalised media type.
    pub async fn validate(
        &self,
        video_id: Uuid,
        user_id: Uuid,
        content_type: &str,
        declared_size: Option<u64>,
    ) -> Result<(Video, String), PipelineError> {
        let video = self
            .videos
            .get_video(video_id)
            .await
            .map_err(PipelineError::Lookup)?
            .ok_or(ValidationError::VideoNotFound(video_id))?;

        if !video.is_owned_by(user_id) {
            return Err(ValidationError::NotOwner { video_id, user_id }.into());
        }

        let media_type = parse_media_type(content_type)
            .ok_or_else(|| ValidationError::MalformedContentType(content_type.to_string()))?;
        if media_type != VIDEO_MP4 {
            return Err(ValidationError::UnsupportedContentType(media_type).into());
        }

        if let Some(size) = declared_size {
            if size > self.max_upload_bytes {
                return Err(ValidationError::PayloadTooLarge {
                    limit: self.max_upload_bytes,
                }
                .into());
            }
        }

        Ok((video, media_type))
    }

    /// Run one upload to completion. Scratch files are gone by the time this returns.
    #[tracing::instrument(skip(self, request), fields(video_id = %request.video_id, user_id = %request.user_id))]
    pub async fn ingest<R>(&self, request: IngestRequest<R>) -> Result<VideoResponse, PipelineError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let start = Instant::now();
        let video_id = request.video_id;
        let result = self.run(request).await;
        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

        match &result {
            Ok(_) => tracing::info!(video_id = %video_id, duration_ms, "Video ingested"),
            Err(e @ PipelineError::Validation(_)) => tracing::debug!(
                video_id = %video_id,
                stage = %e.stage(),
                error = %e,
                "Video upload rejected"
            ),
            Err(e) => tracing::warn!(
                video_id = %video_id,
                stage = %e.stage(),
                error = %e,
                duration_ms,
                "Video ingest failed"
            ),
        }
        result
    }

    async fn run<R>(&self, request: IngestRequest<R>) -> Result<VideoResponse, PipelineError>
    where
        R: AsyncRead + Unpin + Send,
    {
        let IngestRequest {
            video_id,
            user_id,
            content_type,
            declared_size,
            body,
        } = request;

        enter(video_id, PipelineStage::Validating);
        let (_, media_type) = self
            .validate(video_id, user_id, &content_type, declared_size)
            .await?;

        enter(video_id, PipelineStage::Staging);
        let staged = self.stager.stage(body, self.max_upload_bytes).await?;

        enter(video_id, PipelineStage::Inspecting);
        let class = self.inspector.inspect(&staged).await?;

        enter(video_id, PipelineStage::Rewriting);
        let rewritten = self.rewriter.rewrite(&staged).await?;
        drop(staged);

        enter(video_id, PipelineStage::Relocating);
        let reference = self
            .relocator
            .relocate(&rewritten, &media_type, class)
            .await?;
        drop(rewritten);

        enter(video_id, PipelineStage::Persisting);
        let video = match self.videos.set_video_location(video_id, &reference).await {
            Ok(video) => video,
            Err(e) => {
                self.relocator.discard(&reference).await;
                return Err(PipelineError::Persist(e));
            }
        };

        enter(video_id, PipelineStage::Signing);
        Ok(self.signer.present(video).await)
    }
}
