//! Prediction history: the stored record, its SQLite store and the CSV export.

mod export;
mod models;
mod schema;
mod store;

pub use export::{export_csv, CSV_HEADER};
pub use models::{FeedbackUpdate, HistoryEntry, NewHistoryEntry, SortOrder};
pub use store::{HistoryStore, SqliteHistoryStore};
