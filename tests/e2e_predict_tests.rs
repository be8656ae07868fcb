//! End-to-end tests for sketch classification
//!
//! Tests the predict endpoint, saved uploads and the tracks it points to.

mod common;

use common::{black_sketch, transparent_sketch, white_sketch, TestClient, TestServer};
use reqwest::StatusCode;
use serde_json::json;
use sketch_mood_server::history::HistoryStore;

#[tokio::test]
async fn test_white_sketch_is_calm_or_happy() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let body = client.predict_ok(&white_sketch()).await;

    let mood = body["mood"].as_str().unwrap();
    assert!(mood == "calm" || mood == "happy", "got {}", mood);
    assert!((body["confidence"].as_f64().unwrap() - 0.99).abs() < 1e-9);
    assert!(body["history_id"].as_i64().unwrap() >= 1);
    let track_url = body["track_url"].as_str().unwrap();
    assert!(
        track_url.starts_with(&format!("/static/audio/{}", mood)),
        "unexpected track {}",
        track_url
    );
    assert!(track_url.ends_with(".wav"));
}

#[tokio::test]
async fn test_black_sketch_is_sad_or_energetic() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let body = client.predict_ok(&black_sketch()).await;

    let mood = body["mood"].as_str().unwrap();
    assert!(mood == "sad" || mood == "energetic", "got {}", mood);
    assert!((body["confidence"].as_f64().unwrap() - 0.55).abs() < 1e-9);
}

#[tokio::test]
async fn test_blank_canvas_reads_as_white() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let body = client.predict_ok(&transparent_sketch()).await;

    let mood = body["mood"].as_str().unwrap();
    assert!(mood == "calm" || mood == "happy", "got {}", mood);
}

#[tokio::test]
async fn test_prediction_is_recorded_with_saved_upload() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let body = client.predict_ok(&black_sketch()).await;

    let id = body["history_id"].as_i64().unwrap();
    let entry = server.history_store.get_entry(id).unwrap().unwrap();
    assert_eq!(entry.mood_pred.as_str(), body["mood"].as_str().unwrap());
    assert_eq!(format!("/{}", entry.track_path), body["track_url"].as_str().unwrap());
    assert_eq!(entry.rating, None);
    let image_path = std::path::Path::new(&entry.image_path);
    assert!(image_path.starts_with(&server.uploads_dir));
    assert!(image_path.is_file());
    let file_name = image_path.file_name().unwrap().to_string_lossy();
    assert!(file_name.starts_with("sketch_") && file_name.ends_with(".png"));
}

#[tokio::test]
async fn test_track_url_serves_wav() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());
    let body = client.predict_ok(&white_sketch()).await;

    let response = client.get(body["track_url"].as_str().unwrap()).await;

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.bytes().await.unwrap();
    assert_eq!(&bytes[..4], b"RIFF");
    assert_eq!(&bytes[8..12], b"WAVE");
}

#[tokio::test]
async fn test_missing_image_is_rejected() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    for body in [json!({}), json!({ "image": "" }), json!({ "image": null })] {
        let response = client.post_json("/predict", &body).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json: serde_json::Value = response.json().await.unwrap();
        assert_eq!(json["error"], "no image received");
    }
    assert_eq!(server.history_store.count_entries().unwrap(), 0);
}

#[tokio::test]
async fn test_garbage_payload_is_rejected_and_not_saved() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.predict("data:image/png;base64,not base64!!").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json: serde_json::Value = response.json().await.unwrap();
    assert!(json["error"].is_string());

    let response = client.predict("data:image/png;base64,aGVsbG8gd29ybGQ=").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(server.history_store.count_entries().unwrap(), 0);
    assert_eq!(std::fs::read_dir(&server.uploads_dir).unwrap().count(), 0);
}
