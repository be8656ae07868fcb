//! Sketch Mood Server Library
//!
//! Exposes the classifier, audio, history and tooling modules to the
//! binaries and the end-to-end tests.

pub mod audio;
pub mod cli_style;
pub mod config;
pub mod dataset;
pub mod history;
pub mod logging;
pub mod mood;
pub mod server;
pub mod sqlite_persistence;
pub mod training;

// Re-export commonly used types for convenience
pub use history::{HistoryStore, SqliteHistoryStore};
pub use mood::{MoodClassifier, MoodLabel, Prediction};
pub use server::{run_server, RequestsLoggingLevel};
