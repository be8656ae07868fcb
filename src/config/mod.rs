mod file_config;

pub use file_config::{ClassifierConfig, FileConfig};

use crate::audio::AUDIO_SUBDIR;
use crate::mood::{ClassifierKind, DEFAULT_MODEL_PATH};
use crate::server::{RequestsLoggingLevel, ServerConfig};
use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use std::path::{Path, PathBuf};

pub const DEFAULT_DB_PATH: &str = "mood_app.db";
pub const DEFAULT_UPLOADS_DIR: &str = "uploads";
pub const DEFAULT_STATIC_DIR: &str = "static";

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
    pub uploads_dir: Option<PathBuf>,
    pub static_dir: Option<PathBuf>,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub content_cache_age_sec: usize,
    pub synthesize_missing_audio: bool,
    pub classifier: ClassifierKind,
    pub model_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub uploads_dir: PathBuf,
    pub static_dir: PathBuf,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub content_cache_age_sec: usize,
    pub synthesize_missing_audio: bool,

    pub classifier: ClassifierSettings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierSettings {
    pub kind: ClassifierKind,
    pub model_path: PathBuf,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .or_else(|| cli.db_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));
        if db_path.is_dir() {
            bail!("db_path is a directory: {:?}", db_path);
        }
        if let Some(parent) = non_empty_parent(&db_path) {
            if !parent.is_dir() {
                bail!("Database directory does not exist: {:?}", parent);
            }
        }

        let uploads_dir = file
            .uploads_dir
            .map(PathBuf::from)
            .or_else(|| cli.uploads_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOADS_DIR));
        if uploads_dir.exists() && !uploads_dir.is_dir() {
            bail!("uploads_dir is not a directory: {:?}", uploads_dir);
        }

        let static_dir = file
            .static_dir
            .map(PathBuf::from)
            .or_else(|| cli.static_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR));
        if static_dir.exists() && !static_dir.is_dir() {
            bail!("static_dir is not a directory: {:?}", static_dir);
        }

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let content_cache_age_sec = file
            .content_cache_age_sec
            .unwrap_or(cli.content_cache_age_sec);
        let synthesize_missing_audio = file
            .synthesize_missing_audio
            .unwrap_or(cli.synthesize_missing_audio);

        let classifier_file = file.classifier.unwrap_or_default();
        let kind = match classifier_file.kind {
            Some(s) => ClassifierKind::from_str(&s, true)
                .map_err(|_| anyhow::anyhow!("Unknown classifier kind: {}", s))?,
            None => cli.classifier,
        };
        let model_path = classifier_file
            .model_path
            .map(PathBuf::from)
            .or_else(|| cli.model_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH));

        Ok(Self {
            db_path,
            uploads_dir,
            static_dir,
            port,
            metrics_port,
            logging_level,
            content_cache_age_sec,
            synthesize_missing_audio,
            classifier: ClassifierSettings { kind, model_path },
        })
    }

    pub fn audio_dir(&self) -> PathBuf {
        self.static_dir.join(AUDIO_SUBDIR)
    }

    /// Creates the uploads and audio directories when missing.
    pub fn ensure_runtime_dirs(&self) -> Result<()> {
        for dir in [self.uploads_dir.clone(), self.audio_dir()] {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create directory {:?}", dir))?;
        }
        Ok(())
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            requests_logging_level: self.logging_level.clone(),
            port: self.port,
            metrics_port: self.metrics_port,
            content_cache_age_sec: self.content_cache_age_sec,
            uploads_dir: self.uploads_dir.clone(),
            static_dir: self.static_dir.clone(),
        }
    }
}

fn non_empty_parent(path: &Path) -> Option<&Path> {
    path.parent().filter(|p| !p.as_os_str().is_empty())
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}

/// Value parser for path arguments of the binaries.
pub fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => path_buf,
        Err(err) => return Err(err).with_context(|| format!("Error resolving path: {}", s)),
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    Ok(std::env::current_dir()?.join(original_path))
}
