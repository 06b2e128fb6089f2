use chrono::{DateTime, Utc};
use tubely_core::{AppError, CreateVideoRequest, StorageReference, Video};
use uuid::Uuid;

/// Metadata store for video records.
#[async_trait::async_trait]
pub trait VideoRepository: Send + Sync {
    async fn create_video(
        &self,
        user_id: Uuid,
        request: CreateVideoRequest,
    ) -> Result<Video, AppError>;

    async fn get_video(&self, id: Uuid) -> Result<Option<Video>, AppError>;

    /// Newest first.
    async fn list_videos_for_user(&self, user_id: Uuid) -> Result<Vec<Video>, AppError>;

    /// Replace the mutable fields of an existing record. Missing ids are `NotFound`.
    async fn update_video(&self, video: &Video) -> Result<(), AppError>;

    /// Point a record at its stored object, leaving every other field as currently stored.
    async fn set_video_location(
        &self,
        id: Uuid,
        location: &StorageReference,
    ) -> Result<Video, AppError>;

    /// Set only the thumbnail URL of a record.
    async fn set_thumbnail_url(&self, id: Uuid, thumbnail_url: &str) -> Result<Video, AppError>;
}

/// Row shape of the `videos` table. `video_url` holds an encoded [`StorageReference`].
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VideoRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub thumbnail_url: Option<String>,
    pub video_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VideoRow {
    pub fn into_video(self) -> Video {
        let video_location = self.video_url.as_deref().and_then(|raw| {
            StorageReference::decode(raw)
                .map_err(|e| {
                    tracing::warn!(
                        video_id = %self.id,
                        error = %e,
                        "Stored video location is not a valid reference; treating as absent"
                    );
                })
                .ok()
        });

        Video {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            description: self.description,
            thumbnail_url: self.thumbnail_url,
            video_location,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
