//! Dataset tooling: folder layout, synthetic doodles and labeling helpers.
//!
//! A dataset is a directory with one subdirectory per mood, each holding
//! the images labeled with that mood.

mod labeling;
mod layout;
mod synthetic;

use std::path::{Path, PathBuf};
use thiserror::Error;

pub use labeling::{
    batch_move, detect_mood_from_name, interactive_label, LabelOutcome, LabelPrompt,
};
pub use layout::{count_images, create_structure, mood_instructions, write_instructions};
pub use synthetic::{generate_synthetic, render_doodle, SYNTHETIC_SIZE};

pub const DEFAULT_DATASET_DIR: &str = "ml/dataset";

/// Extensions picked up by training and batch moves.
pub const TRAINING_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Extensions offered during interactive labeling.
pub const LABELING_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("source folder does not exist: {0:?}")]
    MissingSource(PathBuf),

    #[error("no image files found in {0:?}")]
    NoImages(PathBuf),
}

/// Case-insensitive extension check.
pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            extensions
                .iter()
                .any(|candidate| ext.eq_ignore_ascii_case(candidate))
        })
        .unwrap_or(false)
}
