//! Common test infrastructure
//!
//! Tests import from this module only.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{white_sketch, TestClient, TestServer};
//! use reqwest::StatusCode;
//!
//! #[tokio::test]
//! async fn test_predict() {
//!     let server = TestServer::spawn().await;
//!     let client = TestClient::new(server.base_url.clone());
//!
//!     let response = client.predict(&white_sketch()).await;
//!     assert_eq!(response.status(), StatusCode::OK);
//! }
//! ```

mod client;
mod constants;
mod fixtures;
mod server;

pub use client::TestClient;
pub use constants::*;
#[allow(unused_imports)]
pub use fixtures::{black_sketch, sketch_data_url, transparent_sketch, white_sketch};
pub use server::TestServer;
