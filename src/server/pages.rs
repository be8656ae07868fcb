//! Server-rendered HTML pages.

use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use handlebars::Handlebars;
use serde::Serialize;
use serde_json::json;
use tracing::error;

use super::metrics::record_error;
use super::routes::json_error;
use super::state::{GuardedPages, ServerState};
use crate::audio::track_url;
use crate::history::{HistoryEntry, SortOrder};
use crate::mood::MoodLabel;

const INDEX_TEMPLATE: &str = include_str!("../../templates/index.hbs");
const HISTORY_TEMPLATE: &str = include_str!("../../templates/history.hbs");

const CANVAS_SIZE: u32 = 280;
const PEN_COLORS: [&str; 6] = [
    "#000000", "#ef4444", "#3b82f6", "#22c55e", "#eab308", "#a855f7",
];

pub struct Pages {
    registry: Handlebars<'static>,
}

#[derive(Serialize)]
struct HistoryRow {
    id: i64,
    timestamp: String,
    mood: MoodLabel,
    confidence: String,
    track_url: String,
    image_path: String,
    rating: String,
    relabel: String,
}

impl From<&HistoryEntry> for HistoryRow {
    fn from(entry: &HistoryEntry) -> Self {
        HistoryRow {
            id: entry.id,
            timestamp: entry.timestamp_iso(),
            mood: entry.mood_pred,
            confidence: format!("{:.0}%", entry.confidence * 100.0),
            track_url: track_url(&entry.track_path),
            image_path: entry.image_path.clone(),
            rating: entry.rating.map(|r| r.to_string()).unwrap_or_default(),
            relabel: entry.relabel.clone().unwrap_or_default(),
        }
    }
}

impl Pages {
    pub fn new() -> Result<Self> {
        let mut registry = Handlebars::new();
        registry.register_template_string("index", INDEX_TEMPLATE)?;
        registry.register_template_string("history", HISTORY_TEMPLATE)?;
        Ok(Pages { registry })
    }

    pub fn render_index(&self) -> Result<String> {
        let context = json!({
            "title": "Sketch Mood",
            "canvas_size": CANVAS_SIZE,
            "colors": PEN_COLORS,
            "ratings": [1, 2, 3, 4, 5],
            "moods": MoodLabel::ALL,
            "version": env!("CARGO_PKG_VERSION"),
        });
        Ok(self.registry.render("index", &context)?)
    }

    pub fn render_history(&self, entries: &[HistoryEntry]) -> Result<String> {
        let rows: Vec<HistoryRow> = entries.iter().map(HistoryRow::from).collect();
        let context = json!({
            "title": "Sketch history",
            "entries": rows,
        });
        Ok(self.registry.render("history", &context)?)
    }
}

fn render_failure(page: &str, err: anyhow::Error) -> Response {
    error!("Template rendering error on {}: {:#}", page, err);
    record_error("render", page);
    StatusCode::INTERNAL_SERVER_ERROR.into_response()
}

pub async fn index(State(pages): State<GuardedPages>) -> Response {
    match pages.render_index() {
        Ok(body) => Html(body).into_response(),
        Err(err) => render_failure("index", err),
    }
}

pub async fn history(State(state): State<ServerState>) -> Response {
    let entries = match state.history_store.list_entries(SortOrder::NewestFirst) {
        Ok(entries) => entries,
        Err(err) => {
            error!("Failed to list history: {:#}", err);
            record_error("storage", "history");
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, "storage failure");
        }
    };
    match state.pages.render_history(&entries) {
        Ok(body) => Html(body).into_response(),
        Err(err) => render_failure("history", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn index_page_has_canvas_and_tools() {
        let pages = Pages::new().unwrap();

        let html = pages.render_index().unwrap();

        assert!(html.contains("<canvas id=\"sketch\""));
        assert!(html.contains("id=\"submit\""));
        assert!(html.contains("value=\"energetic\""));
        assert!(html.contains("/static/js/app.js"));
    }

    #[test]
    fn history_page_lists_rows() {
        let pages = Pages::new().unwrap();
        let entry = HistoryEntry {
            id: 7,
            timestamp: Utc.with_ymd_and_hms(2024, 6, 1, 8, 30, 0).unwrap(),
            mood_pred: MoodLabel::Sad,
            confidence: 0.55,
            track_path: "static/audio/sad2.wav".to_string(),
            image_path: "uploads/sketch_1.png".to_string(),
            rating: Some(3),
            relabel: Some("<calm>".to_string()),
        };

        let html = pages.render_history(&[entry]).unwrap();

        assert!(html.contains("history-row-7"));
        assert!(html.contains("2024-06-01T08:30:00"));
        assert!(html.contains("55%"));
        assert!(html.contains("src=\"/static/audio/sad2.wav\""));
        assert!(html.contains("&lt;calm&gt;"));
        assert!(!html.contains("empty-history"));
    }

    #[test]
    fn empty_history_page() {
        let pages = Pages::new().unwrap();

        let html = pages.render_history(&[]).unwrap();

        assert!(html.contains("empty-history"));
    }
}
