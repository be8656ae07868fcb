use anyhow::{bail, Context, Result};
use image::{imageops, imageops::FilterType, GrayImage};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::dataset::{has_extension, TRAINING_EXTENSIONS};
use crate::mood::{normalize_pixels, MoodCounts, MoodLabel, SKETCH_SIZE};

/// A normalized `SKETCH_SIZE` x `SKETCH_SIZE` grayscale image and its label.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub pixels: Vec<f32>,
    pub label: MoodLabel,
}

impl Sample {
    pub fn from_image(image: &GrayImage, label: MoodLabel) -> Self {
        Sample {
            pixels: normalize_pixels(image),
            label,
        }
    }
}

pub fn load_sample(path: &Path, label: MoodLabel) -> Result<Sample> {
    let gray = image::open(path)
        .with_context(|| format!("Failed to open {:?}", path))?
        .to_luma8();
    let resized = if gray.dimensions() == (SKETCH_SIZE, SKETCH_SIZE) {
        gray
    } else {
        imageops::resize(&gray, SKETCH_SIZE, SKETCH_SIZE, FilterType::Triangle)
    };
    Ok(Sample::from_image(&resized, label))
}

fn labeled_files(root: &Path) -> Vec<(PathBuf, MoodLabel)> {
    let mut files = Vec::new();
    for mood in MoodLabel::ALL {
        let dir = root.join(mood.as_str());
        if !dir.is_dir() {
            warn!("Missing mood folder {:?}", dir);
            continue;
        }
        let entries = WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    warn!("Skipping unreadable entry in {:?}: {}", dir, err);
                    None
                }
            });
        for entry in entries {
            if entry.file_type().is_file() && has_extension(entry.path(), &TRAINING_EXTENSIONS) {
                files.push((entry.into_path(), mood));
            }
        }
    }
    files
}

/// Loads every image under `<root>/<mood>/`. Unreadable images are logged
/// and skipped; a dataset with no readable image is an error.
pub fn load_dataset(root: &Path) -> Result<Vec<Sample>> {
    let files = labeled_files(root);
    info!("Found {} image files under {:?}", files.len(), root);

    let samples: Vec<Sample> = files
        .par_iter()
        .filter_map(|(path, mood)| match load_sample(path, *mood) {
            Ok(sample) => Some(sample),
            Err(err) => {
                warn!("Skipping {:?}: {:#}", path, err);
                None
            }
        })
        .collect();

    if samples.is_empty() {
        bail!("No images found in dataset {:?}", root);
    }
    Ok(samples)
}

pub fn class_distribution(samples: &[Sample]) -> MoodCounts {
    let mut counts = MoodCounts::default();
    for sample in samples {
        counts.increment(sample.label);
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb, RgbImage};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn loads_resized_normalized_samples() {
        let temp_dir = TempDir::new().unwrap();
        let happy = temp_dir.path().join("happy");
        let sad = temp_dir.path().join("sad");
        fs::create_dir_all(&happy).unwrap();
        fs::create_dir_all(&sad).unwrap();
        RgbImage::from_pixel(128, 32, Rgb([255, 255, 255]))
            .save(happy.join("a.png"))
            .unwrap();
        GrayImage::from_pixel(64, 64, Luma([0]))
            .save(sad.join("b.PNG"))
            .unwrap();
        fs::write(sad.join("broken.png"), b"nope").unwrap();
        fs::write(sad.join("notes.txt"), b"text").unwrap();

        let samples = load_dataset(temp_dir.path()).unwrap();

        assert_eq!(samples.len(), 2);
        let counts = class_distribution(&samples);
        assert_eq!(counts.get(MoodLabel::Happy), 1);
        assert_eq!(counts.get(MoodLabel::Sad), 1);
        for sample in &samples {
            assert_eq!(sample.pixels.len(), (SKETCH_SIZE * SKETCH_SIZE) as usize);
            let expected = if sample.label == MoodLabel::Happy { 1.0 } else { 0.0 };
            assert!(sample.pixels.iter().all(|&p| (p - expected).abs() < 1e-6));
        }
    }

    #[test]
    fn empty_dataset_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("calm")).unwrap();

        assert!(load_dataset(temp_dir.path()).is_err());
    }
}
