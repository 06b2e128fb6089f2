use chrono::Utc;
use sqlx::{PgPool, Postgres};
use tubely_core::{AppError, CreateVideoRequest, StorageReference, Video};
use uuid::Uuid;

use super::video::{VideoRepository, VideoRow};

#[derive(Clone)]
pub struct PgVideoRepository {
    pool: PgPool,
}

impl PgVideoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl VideoRepository for PgVideoRepository {
    #[tracing::instrument(skip(self, request), fields(db.table = "videos", db.operation = "insert"))]
    async fn create_video(
        &self,
        user_id: Uuid,
        request: CreateVideoRequest,
    ) -> Result<Video, AppError> {
        let row: VideoRow = sqlx::query_as::<Postgres, VideoRow>(
            r#"
            INSERT INTO videos (id, user_id, title, description)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, title, description, thumbnail_url, video_url, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&request.title)
        .bind(&request.description)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_video())
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select", db.record_id = %id))]
    async fn get_video(&self, id: Uuid) -> Result<Option<Video>, AppError> {
        let row: Option<VideoRow> = sqlx::query_as::<Postgres, VideoRow>(
            "SELECT id, user_id, title, description, thumbnail_url, video_url, created_at, updated_at \
             FROM videos WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(VideoRow::into_video))
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select"))]
    async fn list_videos_for_user(&self, user_id: Uuid) -> Result<Vec<Video>, AppError> {
        let rows: Vec<VideoRow> = sqlx::query_as::<Postgres, VideoRow>(
            "SELECT id, user_id, title, description, thumbnail_url, video_url, created_at, updated_at \
             FROM videos WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(VideoRow::into_video).collect())
    }

    #[tracing::instrument(skip(self, video), fields(db.table = "videos", db.operation = "update", db.record_id = %video.id))]
    async fn update_video(&self, video: &Video) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            UPDATE videos
            SET title = $2, description = $3, thumbnail_url = $4, video_url = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(video.id)
        .bind(&video.title)
        .bind(&video.description)
        .bind(&video.thumbnail_url)
        .bind(video.video_location.as_ref().map(|r| r.encode()))
        .bind(video.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Video {} not found", video.id)));
        }

        Ok(())
    }

    #[tracing::instrument(skip(self, location), fields(db.table = "videos", db.operation = "update", db.record_id = %id))]
    async fn set_video_location(
        &self,
        id: Uuid,
        location: &StorageReference,
    ) -> Result<Video, AppError> {
        let row: Option<VideoRow> = sqlx::query_as::<Postgres, VideoRow>(
            r#"
            UPDATE videos SET video_url = $2, updated_at = $3
            WHERE id = $1
            RETURNING id, user_id, title, description, thumbnail_url, video_url, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(location.encode())
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        row.map(VideoRow::into_video)
            .ok_or_else(|| AppError::NotFound(format!("Video {} not found", id)))
    }

    #[tracing::instrument(skip(self, thumbnail_url), fields(db.table = "videos", db.operation = "update", db.record_id = %id))]
    async fn set_thumbnail_url(&self, id: Uuid, thumbnail_url: &str) -> Result<Video, AppError> {
        let row: Option<VideoRow> = sqlx::query_as::<Postgres, VideoRow>(
            r#"
            UPDATE videos SET thumbnail_url = $2, updated_at = $3
            WHERE id = $1
            RETURNING id, user_id, title, description, thumbnail_url, video_url, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(thumbnail_url)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        row.map(VideoRow::into_video)
            .ok_or_else(|| AppError::NotFound(format!("Video {} not found", id)))
    }
}
