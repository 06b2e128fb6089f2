use crate::auth::AuthUser;
use crate::constants::{MULTIPART_OVERHEAD_BYTES, VIDEO_FIELD};
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{Multipart, Path, State},
    http::{header, HeaderMap},
    response::IntoResponse,
    Json,
};
use futures::TryStreamExt;
use std::sync::Arc;
use tokio_util::io::StreamReader;
use tubely_core::{AppError, VideoResponse};
use tubely_processing::IngestRequest;
use uuid::Uuid;

/// Upper bound on the file size implied by the request's `Content-Length`.
fn declared_file_size(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .map(|len| len.saturating_sub(MULTIPART_OVERHEAD_BYTES))
}

#[utoipa::path(
    post,
    path = "/api/videos/{video_id}/upload",
    tag = "videos",
    params(
        ("video_id" = Uuid, Path, description = "Video ID")
    ),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Video ingested", body = VideoResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 403, description = "Video belongs to another user", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 415, description = "Not an MP4 file", body = ErrorResponse),
        (status = 422, description = "File could not be processed", body = ErrorResponse),
        (status = 500, description = "Media tools unavailable or internal failure", body = ErrorResponse),
        (status = 502, description = "Object storage failure", body = ErrorResponse),
        (status = 504, description = "Media tool timed out", body = ErrorResponse)
    )
)]
#[tracing::instrument(
    skip(state, headers, multipart),
    fields(user_id = %user.user_id, video_id = %video_id, operation = "upload_video")
)]
pub async fn upload_video(
    user: AuthUser,
    Path(video_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let declared_size = declared_file_size(&headers);

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some(VIDEO_FIELD) {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        let body = StreamReader::new(Box::pin(field.map_err(std::io::Error::other)));

        let response = state
            .pipeline
            .ingest(IngestRequest {
                video_id,
                user_id: user.user_id,
                content_type,
                declared_size,
                body,
            })
            .await?;
        return Ok(Json(response));
    }

    Err(AppError::BadRequest(format!("Missing '{}' file field", VIDEO_FIELD)).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn declared_size_discounts_multipart_framing() {
        let mut headers = HeaderMap::new();
        assert_eq!(declared_file_size(&headers), None);

        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("1000"));
        assert_eq!(declared_file_size(&headers), Some(0));

        let len = (MULTIPART_OVERHEAD_BYTES + 5000).to_string();
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_str(&len).unwrap());
        assert_eq!(declared_file_size(&headers), Some(5000));
    }
}
