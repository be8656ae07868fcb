//! HTTP client for end-to-end tests
//!
//! Wraps reqwest with one method per server endpoint.

use super::constants::*;
use reqwest::Response;
use serde_json::{json, Value};
use std::time::Duration;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Request failed")
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Request failed")
    }

    pub async fn predict(&self, image: &str) -> Response {
        self.post_json("/predict", &json!({ "image": image })).await
    }

    /// Predicts and returns the JSON body, asserting success.
    pub async fn predict_ok(&self, image: &str) -> Value {
        let response = self.predict(image).await;
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        response.json().await.expect("Invalid predict response")
    }

    pub async fn rate(&self, body: &Value) -> Response {
        self.post_json("/rate", body).await
    }

    pub async fn export_csv(&self) -> Response {
        self.get("/export.csv").await
    }

    pub async fn status(&self) -> Response {
        self.get("/v1/status").await
    }
}
