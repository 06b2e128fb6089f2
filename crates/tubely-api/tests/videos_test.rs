//! Video record and upload integration tests.
//!
//! Run with: `cargo test -p tubely-api --test videos_test`

#![cfg(unix)]

mod helpers;

use helpers::auth::TestUser;
use helpers::fixtures::{self, create_video, video_form, SAMPLE_MP4};
use helpers::{api_path, local_path, setup_test_app, setup_test_app_with};
use tubely_db::VideoRepository;
use uuid::Uuid;

#[tokio::test]
async fn test_health_and_openapi_are_public() {
    let app = setup_test_app().await;
    let client = app.client();

    let response = client.get("/health").await;
    assert_eq!(response.status_code(), 200);

    let response = client.get(&api_path("/openapi.json")).await;
    assert_eq!(response.status_code(), 200);
    let doc: serde_json::Value = response.json();
    assert!(doc["paths"]["/api/videos/{video_id}/upload"].is_object());
}

#[tokio::test]
async fn test_requests_without_valid_token_are_unauthorized() {
    let app = setup_test_app().await;
    let client = app.client();

    let response = client.get(&api_path("/videos")).await;
    assert_eq!(response.status_code(), 401);

    let response = client
        .get(&api_path("/videos"))
        .add_header("Authorization", "Bearer not-a-jwt")
        .await;
    assert_eq!(response.status_code(), 401);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_create_and_list_videos() {
    let app = setup_test_app().await;
    let client = app.client();
    let user = TestUser::new();

    let first = create_video(client, &user, "first").await;
    let second = create_video(client, &user, "second").await;
    create_video(client, &TestUser::new(), "someone else's").await;

    let response = client
        .get(&api_path("/videos"))
        .add_header("Authorization", user.bearer())
        .await;
    assert_eq!(response.status_code(), 200);

    let videos: Vec<serde_json::Value> = response.json();
    let ids: Vec<Uuid> = videos
        .iter()
        .map(|v| Uuid::parse_str(v["id"].as_str().unwrap()).unwrap())
        .collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&first) && ids.contains(&second));
    assert!(videos.iter().all(|v| v["video_url"].is_null()));
}

#[tokio::test]
async fn test_create_video_rejects_empty_title() {
    let app = setup_test_app().await;
    let user = TestUser::new();

    let response = app
        .client()
        .post(&api_path("/videos"))
        .add_header("Authorization", user.bearer())
        .json(&serde_json::json!({ "title": "" }))
        .await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_other_users_video_is_not_found() {
    let app = setup_test_app().await;
    let client = app.client();
    let owner = TestUser::new();
    let video_id = create_video(client, &owner, "private").await;

    let response = client
        .get(&api_path(&format!("/videos/{}", video_id)))
        .add_header("Authorization", TestUser::new().bearer())
        .await;
    assert_eq!(response.status_code(), 404);

    let response = client
        .get(&api_path(&format!("/videos/{}", video_id)))
        .add_header("Authorization", owner.bearer())
        .await;
    assert_eq!(response.status_code(), 200);
}

#[tokio::test]
async fn test_invalid_video_id_is_bad_request() {
    let app = setup_test_app().await;
    let response = app
        .client()
        .get(&api_path("/videos/not-a-uuid"))
        .add_header("Authorization", TestUser::new().bearer())
        .await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_upload_landscape_video_and_fetch_signed_url() {
    let app = setup_test_app().await;
    let client = app.client();
    let user = TestUser::new();
    let video_id = create_video(client, &user, "boots").await;

    let response = client
        .post(&api_path(&format!("/videos/{}/upload", video_id)))
        .add_header("Authorization", user.bearer())
        .multipart(video_form(SAMPLE_MP4, "video/mp4"))
        .await;
    assert_eq!(response.status_code(), 200);

    let body: serde_json::Value = response.json();
    let video_url = body["video_url"].as_str().expect("signed video_url");
    assert!(video_url.contains("/media/landscape/"));
    assert!(body.get("video_url_error").is_none());

    let stored = app.state.videos.get_video(video_id).await.unwrap().unwrap();
    let reference = stored.video_location.expect("persisted location");
    assert_eq!(reference.bucket(), "tubely-test");
    assert!(reference.key().starts_with("landscape/"));
    assert!(reference.key().ends_with(".mp4"));

    // served bytes are the remuxed output, not the upload
    let response = client.get(&local_path(video_url)).await;
    assert_eq!(response.status_code(), 200);
    let served = response.as_bytes().to_vec();
    assert!(served.starts_with(b"moov"));
    assert!(served.ends_with(SAMPLE_MP4));

    assert_eq!(app.scratch_entries(), 0);
    assert_eq!(app.stored_objects().len(), 1);
}

#[tokio::test]
async fn test_upload_alias_route() {
    let app = setup_test_app().await;
    let client = app.client();
    let user = TestUser::new();
    let video_id = create_video(client, &user, "alias").await;

    let response = client
        .post(&api_path(&format!("/video_upload/{}", video_id)))
        .add_header("Authorization", user.bearer())
        .multipart(video_form(SAMPLE_MP4, "video/mp4"))
        .await;
    assert_eq!(response.status_code(), 200);
}

#[tokio::test]
async fn test_portrait_video_uses_portrait_prefix() {
    let app = setup_test_app_with(
        r#"echo '{"streams":[{"display_aspect_ratio":"9:16"}]}'"#,
        helpers::COPYING_FFMPEG,
    )
    .await;
    let client = app.client();
    let user = TestUser::new();
    let video_id = create_video(client, &user, "vertical").await;

    let response = client
        .post(&api_path(&format!("/videos/{}/upload", video_id)))
        .add_header("Authorization", user.bearer())
        .multipart(video_form(SAMPLE_MP4, "video/mp4"))
        .await;
    assert_eq!(response.status_code(), 200);

    let stored = app.state.videos.get_video(video_id).await.unwrap().unwrap();
    assert!(stored.video_location.unwrap().key().starts_with("portrait/"));
}

#[tokio::test]
async fn test_non_mp4_upload_is_unsupported_media_type() {
    let app = setup_test_app().await;
    let client = app.client();
    let user = TestUser::new();
    let video_id = create_video(client, &user, "gif").await;

    let response = client
        .post(&api_path(&format!("/videos/{}/upload", video_id)))
        .add_header("Authorization", user.bearer())
        .multipart(video_form(b"GIF89a", "image/gif"))
        .await;
    assert_eq!(response.status_code(), 415);

    assert_eq!(app.scratch_entries(), 0);
    assert!(app.stored_objects().is_empty());
}

#[tokio::test]
async fn test_upload_to_other_users_video_is_forbidden() {
    let app = setup_test_app().await;
    let client = app.client();
    let video_id = create_video(client, &TestUser::new(), "not yours").await;

    let response = client
        .post(&api_path(&format!("/videos/{}/upload", video_id)))
        .add_header("Authorization", TestUser::new().bearer())
        .multipart(video_form(SAMPLE_MP4, "video/mp4"))
        .await;
    assert_eq!(response.status_code(), 403);

    assert_eq!(app.scratch_entries(), 0);
    assert!(app.stored_objects().is_empty());
}

#[tokio::test]
async fn test_upload_to_missing_video_is_not_found() {
    let app = setup_test_app().await;
    let response = app
        .client()
        .post(&api_path(&format!("/videos/{}/upload", Uuid::new_v4())))
        .add_header("Authorization", TestUser::new().bearer())
        .multipart(video_form(SAMPLE_MP4, "video/mp4"))
        .await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_remux_failure_leaves_no_trace() {
    let app = setup_test_app_with(helpers::LANDSCAPE_FFPROBE, helpers::FAILING_FFMPEG).await;
    let client = app.client();
    let user = TestUser::new();
    let video_id = create_video(client, &user, "broken").await;

    let response = client
        .post(&api_path(&format!("/videos/{}/upload", video_id)))
        .add_header("Authorization", user.bearer())
        .multipart(video_form(SAMPLE_MP4, "video/mp4"))
        .await;
    assert_eq!(response.status_code(), 422);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "MEDIA_PROCESSING_ERROR");

    assert_eq!(app.scratch_entries(), 0);
    assert!(app.stored_objects().is_empty());
    let stored = app.state.videos.get_video(video_id).await.unwrap().unwrap();
    assert!(stored.video_location.is_none());
}

#[tokio::test]
async fn test_missing_tool_is_a_server_error() {
    let app = setup_test_app().await;
    std::fs::remove_file(app.dir.path().join("bin").join("ffprobe")).unwrap();
    let client = app.client();
    let user = TestUser::new();
    let video_id = create_video(client, &user, "no ffprobe").await;

    let response = client
        .post(&api_path(&format!("/videos/{}/upload", video_id)))
        .add_header("Authorization", user.bearer())
        .multipart(video_form(SAMPLE_MP4, "video/mp4"))
        .await;
    assert_eq!(response.status_code(), 500);
    let body: serde_json::Value = response.json();
    assert_eq!(body["code"], "INTERNAL_ERROR");

    assert_eq!(app.scratch_entries(), 0);
    assert!(app.stored_objects().is_empty());
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let app = setup_test_app().await;
    let client = app.client();
    let user = TestUser::new();
    let video_id = create_video(client, &user, "huge").await;

    let body = vec![0u8; (helpers::MAX_VIDEO_BYTES + 1) as usize];
    let response = client
        .post(&api_path(&format!("/videos/{}/upload", video_id)))
        .add_header("Authorization", user.bearer())
        .multipart(video_form(&body, "video/mp4"))
        .await;
    assert_eq!(response.status_code(), 413);
    assert_eq!(app.scratch_entries(), 0);
}

#[tokio::test]
async fn test_upload_without_video_field_is_bad_request() {
    let app = setup_test_app().await;
    let client = app.client();
    let user = TestUser::new();
    let video_id = create_video(client, &user, "empty").await;

    let response = client
        .post(&api_path(&format!("/videos/{}/upload", video_id)))
        .add_header("Authorization", user.bearer())
        .multipart(fixtures::file_form("file", SAMPLE_MP4, "boots.mp4", "video/mp4"))
        .await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_media_route_rejects_bad_signature() {
    let app = setup_test_app().await;
    let client = app.client();
    let user = TestUser::new();
    let video_id = create_video(client, &user, "tamper").await;

    let response = client
        .post(&api_path(&format!("/videos/{}/upload", video_id)))
        .add_header("Authorization", user.bearer())
        .multipart(video_form(SAMPLE_MP4, "video/mp4"))
        .await;
    let body: serde_json::Value = response.json();
    let path = local_path(body["video_url"].as_str().unwrap());
    let (object, _) = path.split_once('?').unwrap();

    let far_future = chrono::Utc::now().timestamp() + 3600;
    let response = client
        .get(&format!("{}?expires={}&signature={}", object, far_future, "00".repeat(32)))
        .await;
    assert_eq!(response.status_code(), 401);
}
