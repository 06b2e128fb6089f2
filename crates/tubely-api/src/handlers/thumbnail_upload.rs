use crate::auth::AuthUser;
use crate::constants::THUMBNAIL_FIELD;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Multipart, Path, State},
    response::IntoResponse,
    Json,
};
use futures::TryStreamExt;
use std::sync::Arc;
use tokio_util::io::StreamReader;
use tubely_core::media_type::{is_thumbnail_media_type, parse_media_type};
use tubely_core::{AppError, Video, VideoResponse};
use uuid::Uuid;

async fn owned_video(state: &AppState, video_id: Uuid, user: AuthUser) -> Result<Video, AppError> {
    let video = state
        .videos
        .get_video(video_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;
    if !video.is_owned_by(user.user_id) {
        return Err(AppError::Forbidden(
            "Video belongs to another user".to_string(),
        ));
    }
    Ok(video)
}

fn thumbnail_media_type(raw: Option<&str>) -> Result<String, AppError> {
    let raw = raw.unwrap_or_default();
    let media_type = parse_media_type(raw)
        .ok_or_else(|| AppError::BadRequest(format!("Malformed content type '{}'", raw)))?;
    if !is_thumbnail_media_type(&media_type) {
        return Err(AppError::UnsupportedMediaType(format!(
            "Thumbnail must be image/jpeg or image/png, got '{}'",
            media_type
        )));
    }
    Ok(media_type)
}

#[utoipa::path(
    post,
    path = "/api/thumbnail_upload/{video_id}",
    tag = "videos",
    params(
        ("video_id" = Uuid, Path, description = "Video ID")
    ),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Thumbnail stored", body = VideoResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Video belongs to another user", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 415, description = "Not a JPEG or PNG image", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, multipart),
    fields(user_id = %user.user_id, video_id = %video_id, operation = "upload_thumbnail")
)]
pub async fn upload_thumbnail(
    user: AuthUser,
    Path(video_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some(THUMBNAIL_FIELD) {
            continue;
        }

        owned_video(&state, video_id, user).await?;
        let media_type = thumbnail_media_type(field.content_type())?;

        let body = StreamReader::new(Box::pin(field.map_err(std::io::Error::other)));
        let asset_path = state
            .assets
            .save(body, &media_type, state.config.max_thumbnail_size_bytes())
            .await?;

        let video = match state
            .videos
            .set_thumbnail_url(video_id, &state.assets.url(&asset_path))
            .await
        {
            Ok(video) => video,
            Err(e) => {
                state.assets.remove(&asset_path).await;
                return Err(e.into());
            }
        };

        tracing::info!(asset = %asset_path, "Thumbnail stored");
        return Ok(Json(state.signer.present(video).await));
    }

    Err(AppError::BadRequest(format!("Missing '{}' file field", THUMBNAIL_FIELD)).into())
}
