use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, error};

use super::metrics::{record_error, record_prediction, record_rating};
use super::state::{GuardedHistoryStore, ServerState};
use crate::audio::{choose_track, track_url};
use crate::history::{export_csv, FeedbackUpdate, NewHistoryEntry, SortOrder};
use crate::mood::{sketch, MoodClassifier, MoodLabel, Prediction, SketchError};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub version: &'static str,
    pub classifier: &'static str,
    pub entries: usize,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

#[derive(Deserialize, Debug)]
pub struct PredictBody {
    pub image: Option<String>,
}

#[derive(Serialize)]
struct PredictResponse {
    mood: MoodLabel,
    confidence: f64,
    track_url: String,
    history_id: i64,
}

#[derive(Deserialize, Debug)]
pub struct RateBody {
    pub history_id: Option<Value>,
    pub rating: Option<Value>,
    pub relabel: Option<Value>,
}

#[derive(Debug, Error)]
enum PredictError {
    #[error(transparent)]
    Sketch(#[from] SketchError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Outcome of the blocking part of a prediction.
struct ClassifiedSketch {
    image_path: PathBuf,
    prediction: Prediction,
    track_path: String,
}

pub(super) fn json_error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn upload_file_name(extension: &str) -> String {
    format!("sketch_{}.{}", Utc::now().format("%Y%m%d%H%M%S%6f"), extension)
}

fn classify_sketch(
    image: &str,
    uploads_dir: &Path,
    classifier: &dyn MoodClassifier,
) -> Result<ClassifiedSketch, PredictError> {
    let upload = sketch::decode_data_url(image)?;
    let grayscale = sketch::preprocess(&upload.bytes)?;

    fs::create_dir_all(uploads_dir)
        .map_err(|err| anyhow::anyhow!("Failed to create {:?}: {}", uploads_dir, err))?;
    let image_path = uploads_dir.join(upload_file_name(upload.extension));
    fs::write(&image_path, &upload.bytes)
        .map_err(|err| anyhow::anyhow!("Failed to save upload {:?}: {}", image_path, err))?;

    let prediction = classifier
        .classify(&grayscale)
        .map_err(|err| anyhow::anyhow!("Classification failed: {}", err))?;
    let track = choose_track(prediction.mood, &mut rand::rng())
        .ok_or_else(|| anyhow::anyhow!("No track for mood {}", prediction.mood))?;

    Ok(ClassifiedSketch {
        image_path,
        prediction,
        track_path: track.stored_path(),
    })
}

pub async fn predict(State(state): State<ServerState>, Json(body): Json<PredictBody>) -> Response {
    let image = match body.image.filter(|image| !image.is_empty()) {
        Some(image) => image,
        None => {
            record_error("missing_image", "predict");
            return json_error(StatusCode::BAD_REQUEST, "no image received");
        }
    };

    let uploads_dir = state.config.uploads_dir.clone();
    let classifier = state.classifier.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        classify_sketch(&image, &uploads_dir, classifier.as_ref())
    })
    .await;

    let classified = match outcome {
        Ok(Ok(classified)) => classified,
        Ok(Err(PredictError::Sketch(err))) => {
            debug!("Rejected sketch: {}", err);
            record_error("invalid_sketch", "predict");
            return json_error(StatusCode::BAD_REQUEST, &err.to_string());
        }
        Ok(Err(PredictError::Internal(err))) => {
            error!("Prediction failed: {:#}", err);
            record_error("internal", "predict");
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, "prediction failed");
        }
        Err(err) => {
            error!("Prediction task failed: {}", err);
            record_error("internal", "predict");
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, "prediction failed");
        }
    };

    let prediction = classified.prediction;
    let new_entry = NewHistoryEntry::new(
        prediction.mood,
        prediction.confidence,
        classified.track_path,
        classified.image_path.to_string_lossy(),
    );
    match state.history_store.insert_entry(new_entry) {
        Ok(entry) => {
            record_prediction(prediction.mood, state.classifier.name(), prediction.confidence);
            Json(PredictResponse {
                mood: prediction.mood,
                confidence: prediction.confidence,
                track_url: track_url(&entry.track_path),
                history_id: entry.id,
            })
            .into_response()
        }
        Err(err) => {
            error!("Failed to store prediction: {:#}", err);
            record_error("storage", "predict");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage failure")
        }
    }
}

fn parse_history_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub async fn rate(
    State(store): State<GuardedHistoryStore>,
    Json(body): Json<RateBody>,
) -> Response {
    let id = match body.history_id.as_ref().and_then(parse_history_id) {
        Some(id) => id,
        None => return json_error(StatusCode::NOT_FOUND, "not found"),
    };
    let update = FeedbackUpdate::from_json(body.rating.as_ref(), body.relabel.as_ref());

    match store.update_feedback(id, &update) {
        Ok(Some(entry)) => {
            if update.rating.is_some() {
                record_rating();
            }
            Json(json!({ "ok": true, "entry": entry })).into_response()
        }
        Ok(None) => json_error(StatusCode::NOT_FOUND, "not found"),
        Err(err) => {
            error!("Failed to update feedback of entry {}: {:#}", id, err);
            record_error("storage", "rate");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage failure")
        }
    }
}

pub async fn export_history_csv(State(store): State<GuardedHistoryStore>) -> Response {
    let csv = store
        .list_entries(SortOrder::OldestFirst)
        .and_then(|entries| export_csv(&entries));
    match csv {
        Ok(bytes) => (
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"history.csv\"",
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(err) => {
            error!("Failed to export history: {:#}", err);
            record_error("storage", "export");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "export failed")
        }
    }
}

pub async fn status(State(state): State<ServerState>) -> Response {
    match state.history_store.count_entries() {
        Ok(entries) => Json(ServerStats {
            uptime: format_uptime(state.start_time.elapsed()),
            version: env!("CARGO_PKG_VERSION"),
            classifier: state.classifier.name(),
            entries,
        })
        .into_response(),
        Err(err) => {
            error!("Failed to count history entries: {:#}", err);
            record_error("storage", "status");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage failure")
        }
    }
}
