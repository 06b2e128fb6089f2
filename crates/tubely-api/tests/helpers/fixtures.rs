use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use uuid::Uuid;

use super::api_path;
use super::auth::TestUser;

/// Bytes standing in for an MP4 with its index at the end.
pub const SAMPLE_MP4: &[u8] = b"\x00\x00\x00\x18ftypmp42....mdat....moov";

/// Smallest valid PNG header, enough for content-type based handling.
pub const SAMPLE_PNG: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR";

pub fn file_form(field: &str, bytes: &[u8], file_name: &str, mime_type: &str) -> MultipartForm {
    let part = Part::bytes(bytes.to_vec())
        .file_name(file_name.to_string())
        .mime_type(mime_type.to_string());
    MultipartForm::new().add_part(field.to_string(), part)
}

pub fn video_form(bytes: &[u8], mime_type: &str) -> MultipartForm {
    file_form("video", bytes, "boots.mp4", mime_type)
}

/// Create a draft video owned by `user`, returning its id.
pub async fn create_video(client: &TestServer, user: &TestUser, title: &str) -> Uuid {
    let response = client
        .post(&api_path("/videos"))
        .add_header("Authorization", user.bearer())
        .json(&serde_json::json!({ "title": title, "description": "test video" }))
        .await;
    assert_eq!(response.status_code(), 201);

    let body: serde_json::Value = response.json();
    Uuid::parse_str(body["id"].as_str().expect("Expected 'id' in response"))
        .expect("Invalid UUID in response")
}
