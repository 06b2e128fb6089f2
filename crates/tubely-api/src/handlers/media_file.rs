//! Serves local-backend objects behind presigned URLs (no bearer auth).

use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, Query, Request, State},
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tubely_core::AppError;

#[derive(Debug, Deserialize)]
pub struct SignedUrlQuery {
    pub expires: i64,
    pub signature: String,
}

#[tracing::instrument(skip(state, query, request), fields(key = %key, operation = "get_media_file"))]
pub async fn get_media_file(
    Path(key): Path<String>,
    Query(query): Query<SignedUrlQuery>,
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Response, HttpAppError> {
    let storage = state
        .local_media
        .as_ref()
        .ok_or_else(|| AppError::NotFound("Not found".to_string()))?;

    storage.verify_signature(&key, query.expires, &query.signature)?;
    let path = storage.object_path(&key)?;

    let response = ServeFile::new(path)
        .oneshot(request)
        .await
        .unwrap_or_else(|never| match never {});
    Ok(response.map(Body::new))
}
