//! End-to-end tests for rating predictions and exporting the history

mod common;

use common::{black_sketch, white_sketch, TestClient, TestServer, CSV_HEADER_LINE};
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn test_rate_prediction() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());
    let id = client.predict_ok(&white_sketch()).await["history_id"]
        .as_i64()
        .unwrap();

    let response = client
        .rate(&json!({ "history_id": id, "rating": 4, "relabel": "sad" }))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["ok"], true);
    assert_eq!(body["entry"]["id"], id);
    assert_eq!(body["entry"]["rating"], 4);
    assert_eq!(body["entry"]["relabel"], "sad");
}

#[tokio::test]
async fn test_rating_keeps_existing_relabel() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());
    let id = client.predict_ok(&black_sketch()).await["history_id"]
        .as_i64()
        .unwrap();

    client
        .rate(&json!({ "history_id": id, "relabel": "calm" }))
        .await;
    let response = client
        .rate(&json!({ "history_id": id.to_string(), "rating": "2" }))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["entry"]["rating"], 2);
    assert_eq!(body["entry"]["relabel"], "calm");
}

#[tokio::test]
async fn test_rate_unknown_entry_is_not_found() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    for body in [
        json!({ "history_id": 404, "rating": 3 }),
        json!({ "history_id": "abc", "rating": 3 }),
        json!({ "rating": 3 }),
    ] {
        let response = client.rate(&body).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json: Value = response.json().await.unwrap();
        assert_eq!(json["error"], "not found");
    }
}

#[tokio::test]
async fn test_export_empty_history() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.export_csv().await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "text/csv; charset=utf-8"
    );
    assert!(response.headers()["content-disposition"]
        .to_str()
        .unwrap()
        .contains("history.csv"));
    let text = response.text().await.unwrap();
    assert_eq!(text, format!("{}\r\n", CSV_HEADER_LINE));
}

#[tokio::test]
async fn test_export_lists_entries_oldest_first() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());
    let first = client.predict_ok(&white_sketch()).await;
    let second = client.predict_ok(&black_sketch()).await;
    client
        .rate(&json!({ "history_id": second["history_id"], "rating": 5 }))
        .await;

    let text = client.export_csv().await.text().await.unwrap();

    let lines: Vec<&str> = text.split("\r\n").filter(|l| !l.is_empty()).collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], CSV_HEADER_LINE);

    let first_row: Vec<&str> = lines[1].split(',').collect();
    assert_eq!(first_row[0], first["history_id"].to_string());
    assert_eq!(first_row[2], first["mood"].as_str().unwrap());
    assert_eq!(first_row[6], "");
    assert_eq!(first_row[7], "");

    let second_row: Vec<&str> = lines[2].split(',').collect();
    assert_eq!(second_row[0], second["history_id"].to_string());
    assert_eq!(second_row[3], "0.55");
    assert_eq!(second_row[6], "5");
}
