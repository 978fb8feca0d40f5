//! Integration tests for the upload/edit workflow API
//!
//! Drive the router with `oneshot` against zero-latency recording backends.

mod helpers;

use axum::http::StatusCode;
use serde_json::json;
use std::sync::Arc;

use helpers::{
    png_of_len, FailingAnalyzer, FailingEnhancer, RecordingEnhancer, TestApp, PNG_BYTES,
};
use pla_common::config::TomlConfig;
use pla_listing::services::{StubAnalyzer, SyntheticCatalog};
use pla_listing::workflow::preview::encode_data_url;

#[tokio::test]
async fn test_health_endpoint() {
    let app = TestApp::new();
    let (status, body) = app.send("GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "pla-listing");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_event_stream_content_type() {
    use axum::body::Body;
    use axum::http::{header, Request};
    use tower::ServiceExt;

    let app = TestApp::new();
    let request = Request::builder()
        .uri("/events")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/event-stream"
    );
}

#[tokio::test]
async fn test_new_session_is_empty() {
    let app = TestApp::new();
    let session_id = app.create_session().await;

    let (status, body) = app
        .send("GET", &format!("/api/uploads/{}", session_id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["state"]["state"], "empty");
    assert_eq!(body["images"].as_array().unwrap().len(), 0);
    assert!(body["selectedIndex"].is_null());
}

#[tokio::test]
async fn test_unknown_session_not_found() {
    let app = TestApp::new();
    let (status, body) = app
        .send("GET", &format!("/api/uploads/{}", uuid::Uuid::new_v4()), None)
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_add_files_decodes_previews() {
    let app = TestApp::new();
    let session_id = app.create_session().await;
    let body = app.add_pngs(&session_id, 3).await;

    assert_eq!(body["imageIds"].as_array().unwrap().len(), 3);
    let images = body["session"]["images"].as_array().unwrap();
    assert_eq!(images.len(), 3);
    for (i, image) in images.iter().enumerate() {
        assert_eq!(image["fileName"], format!("product-{}.png", i));
        assert_eq!(image["mimeType"], "image/png");
        assert!(image["preview"]
            .as_str()
            .unwrap()
            .starts_with("data:image/png;base64,"));
        assert!(image["editedPreview"].is_null());
    }
    assert_eq!(body["session"]["state"]["state"], "has_images");
}

#[tokio::test]
async fn test_non_image_upload_rejected() {
    let app = TestApp::new();
    let session_id = app.create_session().await;

    let (status, body) = app
        .send(
            "POST",
            &format!("/api/uploads/{}/files", session_id),
            Some(json!({
                "files": [
                    { "name": "ok.png", "data": encode_data_url("image/png", &PNG_BYTES) },
                    { "name": "notes.txt", "data": encode_data_url("text/plain", b"hello") },
                ]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"].as_str().unwrap().contains("notes.txt"));

    // Nothing from the rejected request was added
    let (_, snapshot) = app
        .send("GET", &format!("/api/uploads/{}", session_id), None)
        .await;
    assert_eq!(snapshot["images"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_submit_without_files_never_calls_analyzer() {
    let app = TestApp::new();
    let session_id = app.create_session().await;
    let mut events = app.state.event_bus.subscribe();

    let (status, body) = app
        .send("POST", &format!("/api/uploads/{}/submit", session_id), None)
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("No files selected"));
    assert!(app.analyzer.calls().is_empty());

    match events.recv().await.unwrap() {
        pla_common::PlaEvent::Notification { title, variant, .. } => {
            assert_eq!(title, "No files selected");
            assert_eq!(variant, pla_common::events::NotificationVariant::Destructive);
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn test_submit_sends_raw_preview_of_first_image() {
    let app = TestApp::new();
    let session_id = app.create_session().await;
    let added = app.add_pngs(&session_id, 2).await;
    let first_preview = added["session"]["images"][0]["preview"]
        .as_str()
        .unwrap()
        .to_string();

    let (status, body) = app
        .send("POST", &format!("/api/uploads/{}/submit", session_id), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    let analysis_id = body["analysisId"].as_str().unwrap();
    assert_eq!(analysis_id.len(), 13);
    assert_eq!(body["reviewUrl"], format!("/api/reviews/{}", analysis_id));
    assert_eq!(app.analyzer.calls(), vec![first_preview]);

    let (_, snapshot) = app
        .send("GET", &format!("/api/uploads/{}", session_id), None)
        .await;
    assert_eq!(snapshot["state"]["state"], "submitted");
    assert_eq!(snapshot["state"]["analysisId"], analysis_id);
}

#[tokio::test]
async fn test_submit_sends_edited_preview_when_present() {
    let app = TestApp::new();
    let session_id = app.create_session().await;
    app.add_pngs(&session_id, 1).await;

    let (status, enhanced) = app
        .send(
            "POST",
            &format!("/api/uploads/{}/files/0/enhance", session_id),
            Some(json!({ "mode": "auto" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let enhanced_url = enhanced["enhancedImageUrl"].as_str().unwrap().to_string();

    app.send("POST", &format!("/api/uploads/{}/submit", session_id), None)
        .await;
    assert_eq!(app.analyzer.calls(), vec![enhanced_url]);
}

#[tokio::test]
async fn test_custom_slider_sends_offsets() {
    let app = TestApp::new();
    let session_id = app.create_session().await;
    app.add_pngs(&session_id, 1).await;

    let (status, body) = app
        .send(
            "POST",
            &format!("/api/uploads/{}/files/0/enhance", session_id),
            Some(json!({
                "mode": "custom",
                "brightness": 150,
                "contrast": 100,
                "saturation": 80,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let requests = app.enhancer.requests();
    assert_eq!(requests.len(), 1);
    assert!(!requests[0].auto_enhance);
    assert!(requests[0].auto_crop);
    assert_eq!(requests[0].brightness, 50);
    assert_eq!(requests[0].contrast, 0);
    assert_eq!(requests[0].saturation, -20);

    let image = &body["session"]["images"][0];
    assert!(image["editedPreview"]
        .as_str()
        .unwrap()
        .contains("enhanced=true"));
}

#[tokio::test]
async fn test_enhancement_touches_only_its_image() {
    let app = TestApp::new();
    let session_id = app.create_session().await;
    app.add_pngs(&session_id, 3).await;

    let (_, body) = app
        .send(
            "POST",
            &format!("/api/uploads/{}/files/1/enhance", session_id),
            Some(json!({ "mode": "auto" })),
        )
        .await;

    let images = body["session"]["images"].as_array().unwrap();
    assert!(images[0]["editedPreview"].is_null());
    assert!(images[1]["editedPreview"]
        .as_str()
        .unwrap()
        .contains("enhanced=true"));
    assert!(images[2]["editedPreview"].is_null());

    // Reset drops the enhancement again
    let (status, snapshot) = app
        .send(
            "DELETE",
            &format!("/api/uploads/{}/files/1/enhance", session_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(snapshot["images"][1]["editedPreview"].is_null());
}

#[tokio::test]
async fn test_concurrent_enhancements_commit_independently() {
    let app = TestApp::new();
    let session_id = app.create_session().await;
    app.add_pngs(&session_id, 2).await;

    // Image 0 takes 50ms in the enhancer, image 1 returns at once
    let slow_uri = format!("/api/uploads/{}/files/0/enhance", session_id);
    let fast_uri = format!("/api/uploads/{}/files/1/enhance", session_id);
    let slow = app.send(
        "POST",
        &slow_uri,
        Some(json!({ "mode": "custom", "brightness": 150, "contrast": 100, "saturation": 100 })),
    );
    let fast = app.send(
        "POST",
        &fast_uri,
        Some(json!({ "mode": "auto" })),
    );
    let ((slow_status, slow_body), (fast_status, fast_body)) = tokio::join!(slow, fast);
    assert_eq!(slow_status, StatusCode::OK);
    assert_eq!(fast_status, StatusCode::OK);

    let (_, snapshot) = app
        .send("GET", &format!("/api/uploads/{}", session_id), None)
        .await;
    assert_eq!(
        snapshot["images"][0]["editedPreview"],
        slow_body["enhancedImageUrl"]
    );
    assert_eq!(
        snapshot["images"][1]["editedPreview"],
        fast_body["enhancedImageUrl"]
    );
}

#[tokio::test]
async fn test_failed_enhancement_leaves_image_unchanged() {
    let app = TestApp::with_backends(
        Arc::new(StubAnalyzer::new()),
        Arc::new(FailingEnhancer),
        Arc::new(SyntheticCatalog::new()),
    );
    let session_id = app.create_session().await;
    app.add_pngs(&session_id, 1).await;

    let (status, body) = app
        .send(
            "POST",
            &format!("/api/uploads/{}/files/0/enhance", session_id),
            Some(json!({ "mode": "auto" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "SERVICE_FAILURE");

    let (_, snapshot) = app
        .send("GET", &format!("/api/uploads/{}", session_id), None)
        .await;
    assert!(snapshot["images"][0]["editedPreview"].is_null());
}

#[tokio::test]
async fn test_failed_submit_keeps_images() {
    let app = TestApp::with_backends(
        Arc::new(FailingAnalyzer),
        Arc::new(RecordingEnhancer::default()),
        Arc::new(SyntheticCatalog::new()),
    );
    let session_id = app.create_session().await;
    app.add_pngs(&session_id, 2).await;

    let (status, _) = app
        .send("POST", &format!("/api/uploads/{}/submit", session_id), None)
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let (_, snapshot) = app
        .send("GET", &format!("/api/uploads/{}", session_id), None)
        .await;
    assert_eq!(snapshot["state"]["state"], "has_images");
    assert_eq!(snapshot["images"].as_array().unwrap().len(), 2);

    // The session is still usable and can be submitted again
    let (status, _) = app
        .send("DELETE", &format!("/api/uploads/{}/files/1", session_id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_edit_selection_follows_removals() {
    let app = TestApp::new();
    let session_id = app.create_session().await;
    app.add_pngs(&session_id, 3).await;

    let (status, snapshot) = app
        .send("POST", &format!("/api/uploads/{}/select/2", session_id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot["state"]["state"], "editing");
    assert_eq!(snapshot["state"]["index"], 2);
    let selected_id = snapshot["images"][2]["id"].clone();

    // Removing an earlier image keeps the same image selected
    let (_, snapshot) = app
        .send("DELETE", &format!("/api/uploads/{}/files/0", session_id), None)
        .await;
    assert_eq!(snapshot["selectedIndex"], 1);
    assert_eq!(snapshot["images"][1]["id"], selected_id);

    // Removing the selected image clears the selection
    let (_, snapshot) = app
        .send("DELETE", &format!("/api/uploads/{}/files/1", session_id), None)
        .await;
    assert!(snapshot["selectedIndex"].is_null());
    assert_eq!(snapshot["view"], "preview");
    assert_eq!(snapshot["state"]["state"], "has_images");
}

#[tokio::test]
async fn test_view_preview_keeps_selection() {
    let app = TestApp::new();
    let session_id = app.create_session().await;
    app.add_pngs(&session_id, 2).await;

    app.send("POST", &format!("/api/uploads/{}/select/1", session_id), None)
        .await;
    let (status, snapshot) = app
        .send("POST", &format!("/api/uploads/{}/preview", session_id), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot["view"], "preview");
    assert_eq!(snapshot["selectedIndex"], 1);
    assert_eq!(snapshot["state"]["state"], "has_images");
}

#[tokio::test]
async fn test_out_of_range_index_rejected() {
    let app = TestApp::new();
    let session_id = app.create_session().await;
    app.add_pngs(&session_id, 1).await;

    let (status, _) = app
        .send("DELETE", &format!("/api/uploads/{}/files/5", session_id), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send("POST", &format!("/api/uploads/{}/select/1", session_id), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_submitted_session_is_closed() {
    let app = TestApp::new();
    let session_id = app.create_session().await;
    app.add_pngs(&session_id, 1).await;
    app.send("POST", &format!("/api/uploads/{}/submit", session_id), None)
        .await;

    let (status, body) = app
        .send("POST", &format!("/api/uploads/{}/submit", session_id), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");
    assert_eq!(app.analyzer.calls().len(), 1);
}

#[tokio::test]
async fn test_discard_session() {
    let app = TestApp::new();
    let session_id = app.create_session().await;

    let (status, _) = app
        .send("DELETE", &format!("/api/uploads/{}", session_id), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app
        .send("GET", &format!("/api/uploads/{}", session_id), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_multi_megabyte_photo_accepted_under_default_limits() {
    let app = TestApp::new();
    let session_id = app.create_session().await;
    let photo = png_of_len(3 * 1024 * 1024);

    let (status, body) = app
        .send(
            "POST",
            &format!("/api/uploads/{}/files", session_id),
            Some(json!({
                "files": [{ "name": "camera.png", "data": encode_data_url("image/png", &photo) }],
                "waitForPreviews": true,
            })),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "upload failed: {}", body);
    let preview = body["session"]["images"][0]["preview"].as_str().unwrap();
    assert_eq!(preview, encode_data_url("image/png", &photo));
}

#[tokio::test]
async fn test_oversized_body_rejected_with_json_error() {
    let mut config = TomlConfig::default();
    config.uploads.max_file_bytes = 64 * 1024;
    config.uploads.max_files_per_request = 1;
    let app = TestApp::with_config(config);
    let session_id = app.create_session().await;

    let (status, body) = app
        .send(
            "POST",
            &format!("/api/uploads/{}/files", session_id),
            Some(json!({
                "files": [{
                    "name": "huge.png",
                    "data": encode_data_url("image/png", &png_of_len(256 * 1024)),
                }],
            })),
        )
        .await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["error"]["code"], "PAYLOAD_TOO_LARGE");
    assert!(body["error"]["message"].is_string());

    let (_, snapshot) = app
        .send("GET", &format!("/api/uploads/{}", session_id), None)
        .await;
    assert_eq!(snapshot["images"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_file_over_size_limit_rejected() {
    let mut config = TomlConfig::default();
    config.uploads.max_file_bytes = 1024;
    let app = TestApp::with_config(config);
    let session_id = app.create_session().await;

    // Fits the request body limit, fails the per-file check
    let (status, body) = app
        .send(
            "POST",
            &format!("/api/uploads/{}/files", session_id),
            Some(json!({
                "files": [{ "name": "big.png", "data": encode_data_url("image/png", &png_of_len(2048)) }],
            })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"].as_str().unwrap().contains("big.png"));
}

#[tokio::test]
async fn test_too_many_files_in_one_request_rejected() {
    let mut config = TomlConfig::default();
    config.uploads.max_files_per_request = 2;
    let app = TestApp::with_config(config);
    let session_id = app.create_session().await;

    let files: Vec<_> = (0..3)
        .map(|i| json!({ "name": format!("{}.png", i), "data": encode_data_url("image/png", &PNG_BYTES) }))
        .collect();
    let (status, body) = app
        .send(
            "POST",
            &format!("/api/uploads/{}/files", session_id),
            Some(json!({ "files": files })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("Too many files"));
}

#[tokio::test]
async fn test_malformed_files_body_is_bad_request() {
    let app = TestApp::new();
    let session_id = app.create_session().await;

    let (status, body) = app
        .send(
            "POST",
            &format!("/api/uploads/{}/files", session_id),
            Some(json!({ "files": "not-a-list" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_submit_releases_upload_session() {
    let app = TestApp::new();
    let session_id = app.create_session().await;
    app.add_pngs(&session_id, 2).await;
    assert_eq!(app.state.uploads.session_count().await, 1);

    let (status, _) = app
        .send("POST", &format!("/api/uploads/{}/submit", session_id), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(app.state.uploads.session_count().await, 0);
    let (_, health) = app.send("GET", "/health", None).await;
    assert_eq!(health["upload_sessions"], 0);
    assert_eq!(health["submitted_sessions"], 1);

    // The submitted id still answers, without image data
    let (status, snapshot) = app
        .send("GET", &format!("/api/uploads/{}", session_id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(snapshot["state"]["state"], "submitted");
    assert_eq!(snapshot["images"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_review_sessions_bounded_by_capacity() {
    let mut config = TomlConfig::default();
    config.sessions.capacity = 3;
    let app = TestApp::with_config(config);

    for i in 0..10 {
        let (status, _) = app
            .send("POST", &format!("/api/reviews/id-{}", i), None)
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    assert_eq!(app.state.reviews.session_count().await, 3);
    let (status, _) = app.send("GET", "/api/reviews/id-0", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.send("GET", "/api/reviews/id-9", None).await;
    assert_eq!(status, StatusCode::OK);
}

