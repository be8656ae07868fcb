use anyhow::{Context, Result};
use std::sync::Arc;

use tower_http::services::ServeDir;
use tracing::{error, info};

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use super::metrics::metrics_handler;
use super::pages::{self, Pages};
use super::routes;
use super::{http_cache, log_requests, state::*, ServerConfig};

pub fn make_app(
    config: ServerConfig,
    history_store: GuardedHistoryStore,
    classifier: GuardedClassifier,
) -> Result<Router> {
    let pages = Arc::new(Pages::new().context("Failed to load page templates")?);
    let state = ServerState::new(config.clone(), history_store, classifier, pages);

    let page_routes: Router = Router::new()
        .route("/", get(pages::index))
        .route("/history", get(pages::history))
        .with_state(state.clone());

    let api_routes: Router = Router::new()
        .route("/predict", post(routes::predict))
        .route("/rate", post(routes::rate))
        .route("/export.csv", get(routes::export_history_csv))
        .route("/v1/status", get(routes::status))
        .with_state(state.clone());

    let static_routes: Router = Router::new()
        .nest_service("/static", ServeDir::new(&config.static_dir))
        .layer(middleware::from_fn_with_state(
            config.content_cache_age_sec,
            http_cache,
        ));

    let app: Router = page_routes
        .merge(api_routes)
        .merge(static_routes)
        .layer(middleware::from_fn_with_state(state, log_requests));

    Ok(app)
}

fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}

pub async fn run_server(
    config: ServerConfig,
    history_store: GuardedHistoryStore,
    classifier: GuardedClassifier,
) -> Result<()> {
    let app = make_app(config.clone(), history_store, classifier)?;

    let metrics_listener = tokio::net::TcpListener::bind(("0.0.0.0", config.metrics_port))
        .await
        .with_context(|| format!("Failed to bind metrics port {}", config.metrics_port))?;
    tokio::spawn(async move {
        if let Err(err) = axum::serve(metrics_listener, make_metrics_app()).await {
            error!("Metrics server stopped: {}", err);
        }
    });

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;
    info!("Ready to serve at port {}!", config.port);
    info!("Metrics available at port {}!", config.metrics_port);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", err);
            }
            info!("Shutting down");
        })
        .await?;
    Ok(())
}
