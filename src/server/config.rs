use super::RequestsLoggingLevel;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub port: u16,
    pub metrics_port: u16,
    pub content_cache_age_sec: usize,
    /// Where raw sketch uploads are written.
    pub uploads_dir: PathBuf,
    /// Root served under `/static`, holding the page script and synthesized audio.
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            port: 5000,
            metrics_port: 9091,
            content_cache_age_sec: 3600,
            uploads_dir: PathBuf::from("uploads"),
            static_dir: PathBuf::from("static"),
        }
    }
}
