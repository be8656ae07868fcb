use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use sketch_mood_server::audio;
use sketch_mood_server::cli_style::get_styles;
use sketch_mood_server::config::{parse_path, AppConfig, CliConfig, FileConfig};
use sketch_mood_server::history::{HistoryStore, SqliteHistoryStore};
use sketch_mood_server::logging::init_logging;
use sketch_mood_server::mood::{load_classifier, ClassifierKind};
use sketch_mood_server::server::{metrics, run_server, RequestsLoggingLevel};

#[derive(Parser, Debug)]
#[command(styles = get_styles())]
struct CliArgs {
    /// Path to a TOML config file. Values in the file override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Path to the SQLite history database file.
    #[clap(long, env = "MOOD_DB_PATH", value_parser = parse_path)]
    pub db_path: Option<PathBuf>,

    /// Directory where submitted sketches are saved.
    #[clap(long, value_parser = parse_path)]
    pub uploads_dir: Option<PathBuf>,

    /// Directory served under /static (page script and synthesized audio).
    #[clap(long, value_parser = parse_path)]
    pub static_dir: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// The maximum age of static assets in the cache in seconds.
    #[clap(long, default_value_t = 3600)]
    pub content_cache_age_sec: usize,

    /// Which classifier labels the sketches.
    #[clap(long, value_enum, default_value = "brightness")]
    pub classifier: ClassifierKind,

    /// Trained model file, used with `--classifier trained`.
    #[clap(long, value_parser = parse_path)]
    pub model_path: Option<PathBuf>,

    /// Do not synthesize missing mood tracks at startup.
    #[clap(long)]
    pub no_audio_synthesis: bool,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            db_path: self.db_path.clone(),
            uploads_dir: self.uploads_dir.clone(),
            static_dir: self.static_dir.clone(),
            port: self.port,
            metrics_port: self.metrics_port,
            logging_level: self.logging_level.clone(),
            content_cache_age_sec: self.content_cache_age_sec,
            synthesize_missing_audio: !self.no_audio_synthesis,
            classifier: self.classifier,
            model_path: self.model_path.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    init_logging()?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let app_config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;
    info!("Resolved configuration: {:?}", app_config);

    app_config.ensure_runtime_dirs()?;

    if app_config.synthesize_missing_audio {
        let audio_dir = app_config.audio_dir();
        match audio::ensure_tracks(&audio_dir) {
            Ok(0) => info!("All mood tracks present in {:?}", audio_dir),
            Ok(_) => {}
            Err(err) => warn!("Could not synthesize mood tracks: {}", err),
        }
    }

    info!("Opening history database at {:?}...", app_config.db_path);
    let history_store = Arc::new(SqliteHistoryStore::new(&app_config.db_path)?);

    info!("Initializing metrics...");
    metrics::init_metrics();
    metrics::init_history_metrics(history_store.count_entries()?);

    let classifier = load_classifier(
        app_config.classifier.kind,
        Some(app_config.classifier.model_path.as_path()),
    );
    info!("Using {} classifier", classifier.name());

    run_server(
        app_config.server_config(),
        history_store,
        Arc::from(classifier),
    )
    .await
}
