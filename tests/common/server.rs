//! Test server lifecycle management
//!
//! Each test gets an isolated server with its own database, uploads folder
//! and static directory.

use super::constants::*;
use super::fixtures::{create_test_dirs, TestDirs};
use sketch_mood_server::audio::{ensure_tracks, AUDIO_SUBDIR};
use sketch_mood_server::history::SqliteHistoryStore;
use sketch_mood_server::mood::BrightnessClassifier;
use sketch_mood_server::server::{make_app, RequestsLoggingLevel, ServerConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

/// Test server instance with isolated storage
///
/// When dropped, the server gracefully shuts down and the temporary
/// directories are removed.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// History store for direct database access in tests
    pub history_store: Arc<SqliteHistoryStore>,

    pub uploads_dir: PathBuf,

    pub static_dir: PathBuf,

    _dirs: TestDirs,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a new test server on a random port, with the mood tracks
    /// already synthesized and the brightness classifier.
    pub async fn spawn() -> Self {
        let dirs = create_test_dirs().expect("Failed to create test directories");
        ensure_tracks(&dirs.static_dir.join(AUDIO_SUBDIR)).expect("Failed to synthesize tracks");

        let history_store =
            Arc::new(SqliteHistoryStore::new(&dirs.db_path).expect("Failed to open history store"));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            requests_logging_level: RequestsLoggingLevel::None,
            port,
            metrics_port: 0,
            content_cache_age_sec: 0,
            uploads_dir: dirs.uploads_dir.clone(),
            static_dir: dirs.static_dir.clone(),
        };
        let app = make_app(config, history_store.clone(), Arc::new(BrightnessClassifier))
            .expect("Failed to build app");

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            history_store,
            uploads_dir: dirs.uploads_dir.clone(),
            static_dir: dirs.static_dir.clone(),
            _dirs: dirs,
            _shutdown_tx: Some(shutdown_tx),
        };
        server.wait_for_ready().await;
        server
    }

    /// Polls the status endpoint until the server answers.
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client
                .get(format!("{}/v1/status", self.base_url))
                .send()
                .await
            {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
