use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tubely_core::{AppError, CreateVideoRequest, StorageReference, Video};
use uuid::Uuid;

use super::video::VideoRepository;

/// Process-local repository used by tests and database-less development runs.
#[derive(Default)]
pub struct InMemoryVideoRepository {
    videos: RwLock<HashMap<Uuid, Video>>,
}

impl InMemoryVideoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record as-is, replacing any record with the same id.
    pub async fn insert(&self, video: Video) {
        self.videos.write().await.insert(video.id, video);
    }

    async fn modify(&self, id: Uuid, apply: impl FnOnce(&mut Video)) -> Result<Video, AppError> {
        let mut videos = self.videos.write().await;
        let video = videos
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Video {} not found", id)))?;
        apply(video);
        video.updated_at = Utc::now();
        Ok(video.clone())
    }
}

#[async_trait::async_trait]
impl VideoRepository for InMemoryVideoRepository {
    async fn create_video(
        &self,
        user_id: Uuid,
        request: CreateVideoRequest,
    ) -> Result<Video, AppError> {
        let now = Utc::now();
        let video = Video {
            id: Uuid::new_v4(),
            user_id,
            title: request.title,
            description: request.description,
            thumbnail_url: None,
            video_location: None,
            created_at: now,
            updated_at: now,
        };
        self.videos.write().await.insert(video.id, video.clone());
        Ok(video)
    }

    async fn get_video(&self, id: Uuid) -> Result<Option<Video>, AppError> {
        Ok(self.videos.read().await.get(&id).cloned())
    }

    async fn list_videos_for_user(&self, user_id: Uuid) -> Result<Vec<Video>, AppError> {
        let mut videos: Vec<Video> = self
            .videos
            .read()
            .await
            .values()
            .filter(|v| v.user_id == user_id)
            .cloned()
            .collect();
        videos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(videos)
    }

    async fn update_video(&self, video: &Video) -> Result<(), AppError> {
        let mut videos = self.videos.write().await;
        match videos.get_mut(&video.id) {
            Some(existing) => {
                *existing = video.clone();
                Ok(())
            }
            None => Err(AppError::NotFound(format!("Video {} not found", video.id))),
        }
    }

    async fn set_video_location(
        &self,
        id: Uuid,
        location: &StorageReference,
    ) -> Result<Video, AppError> {
        self.modify(id, |v| v.video_location = Some(location.clone()))
            .await
    }

    async fn set_thumbnail_url(&self, id: Uuid, thumbnail_url: &str) -> Result<Video, AppError> {
        self.modify(id, |v| v.thumbnail_url = Some(thumbnail_url.to_string()))
            .await
    }
}
