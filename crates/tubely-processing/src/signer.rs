//! Read-time presentation of video records.

use std::sync::Arc;
use std::time::Duration;
use tubely_core::{StorageReference, Video, VideoResponse};
use tubely_storage::Storage;

use crate::error::SigningError;

/// Turns persisted references into time-limited URLs at read time.
///
/// Signed URLs are never stored; every read signs again.
#[derive(Clone)]
pub struct UrlSigner {
    storage: Arc<dyn Storage>,
    ttl: Duration,
}

impl UrlSigner {
    pub fn new(storage: Arc<dyn Storage>, ttl: Duration) -> Self {
        Self { storage, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn sign(&self, reference: &StorageReference) -> Result<String, SigningError> {
        self.storage
            .presigned_get_url(reference, self.ttl)
            .await
            .map_err(|source| SigningError {
                reference: reference.encode(),
                source,
            })
    }

    /// Client view of a record. A record without a location gets no URL; a signing failure
    /// is reported in `video_url_error` instead of failing the read.
    pub async fn present(&self, video: Video) -> VideoResponse {
        let location = video.video_location.clone();
        let video_id = video.id;
        let response = VideoResponse::from(video);

        let Some(reference) = location else {
            return response;
        };

        match self.sign(&reference).await {
            Ok(url) => response.with_video_url(url),
            Err(e) => {
                tracing::warn!(
                    video_id = %video_id,
                    error = %e,
                    "Failed to sign video URL"
                );
                response.with_signing_error("Video URL is temporarily unavailable".to_string())
            }
        }
    }

    pub async fn present_all(&self, videos: Vec<Video>) -> Vec<VideoResponse> {
        let mut responses = Vec::with_capacity(videos.len());
        for video in videos {
            responses.push(self.present(video).await);
        }
        responses
    }
}
