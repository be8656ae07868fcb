use image::GenericImageView;
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{info, warn};
use walkdir::WalkDir;

use super::{
    count_images, create_structure, has_extension, DatasetError, LABELING_EXTENSIONS,
    TRAINING_EXTENSIONS,
};
use crate::mood::{mean_brightness, MoodCounts, MoodLabel};

/// Line-oriented interaction used by [`interactive_label`].
pub trait LabelPrompt {
    /// Asks a question and returns the answer, or `None` once input ends.
    fn ask(&mut self, question: &str) -> Option<String>;

    fn show(&mut self, message: &str);
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct LabelOutcome {
    /// Images labeled in this session.
    pub labeled: MoodCounts,
    pub skipped: usize,
    pub failed: usize,
    pub quit: bool,
    /// Images per mood folder after the session.
    pub summary: MoodCounts,
}

enum Choice {
    Label(MoodLabel),
    Skip,
    Quit,
}

fn parse_choice(answer: &str) -> Option<Choice> {
    match answer.trim().to_ascii_lowercase().as_str() {
        "q" => Some(Choice::Quit),
        "s" => Some(Choice::Skip),
        "1" => Some(Choice::Label(MoodLabel::Happy)),
        "2" => Some(Choice::Label(MoodLabel::Calm)),
        "3" => Some(Choice::Label(MoodLabel::Sad)),
        "4" => Some(Choice::Label(MoodLabel::Energetic)),
        _ => None,
    }
}

/// First mood, in canonical order, whose name appears in the file name.
pub fn detect_mood_from_name(file_name: &str) -> Option<MoodLabel> {
    let lowered = file_name.to_lowercase();
    MoodLabel::ALL
        .into_iter()
        .find(|mood| lowered.contains(mood.as_str()))
}

fn list_images(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>, DatasetError> {
    if !dir.is_dir() {
        return Err(DatasetError::MissingSource(dir.to_path_buf()));
    }
    let mut images = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        if entry.file_type().is_file() && has_extension(entry.path(), extensions) {
            images.push(entry.into_path());
        }
    }
    Ok(images)
}

fn move_file(from: &Path, to: &Path) -> std::io::Result<()> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    // rename does not cross filesystems
    fs::copy(from, to)?;
    fs::remove_file(from)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Moves every image whose name mentions a mood into that mood's folder.
pub fn batch_move(source: &Path, root: &Path) -> Result<MoodCounts, DatasetError> {
    let images = list_images(source, &TRAINING_EXTENSIONS)?;
    create_structure(root)?;

    let mut moved = MoodCounts::default();
    for path in images {
        let name = file_name(&path);
        let Some(mood) = detect_mood_from_name(&name) else {
            continue;
        };
        move_file(&path, &root.join(mood.as_str()).join(&name))?;
        info!("Moved {} to {}/", name, mood);
        moved.increment(mood);
    }
    Ok(moved)
}

fn describe(path: &Path) -> Result<String, image::ImageError> {
    let image = image::open(path)?;
    let (width, height) = image.dimensions();
    Ok(format!(
        "{} ({}x{}, mean brightness {:.1})",
        file_name(path),
        width,
        height,
        mean_brightness(&image.to_luma8())
    ))
}

fn labeled_name(mood: MoodLabel, counter: usize, source: &Path) -> String {
    match source.extension() {
        Some(ext) => format!("{}_{:03}.{}", mood, counter, ext.to_string_lossy()),
        None => format!("{}_{:03}", mood, counter),
    }
}

/// Walks the images in `source`, asking for a mood for each one and copying
/// labeled images into the dataset as `<mood>/<mood>_<NNN>.<ext>`.
pub fn interactive_label(
    source: &Path,
    root: &Path,
    prompt: &mut dyn LabelPrompt,
) -> Result<LabelOutcome, DatasetError> {
    let images = list_images(source, &LABELING_EXTENSIONS)?;
    if images.is_empty() {
        return Err(DatasetError::NoImages(source.to_path_buf()));
    }
    create_structure(root)?;

    prompt.show(&format!("Found {} images to label", images.len()));
    prompt.show("  1 = happy\n  2 = calm\n  3 = sad\n  4 = energetic\n  s = skip\n  q = quit");

    let mut outcome = LabelOutcome::default();
    let mut counter = 0;
    'images: for (i, path) in images.iter().enumerate() {
        let name = file_name(path);
        match describe(path) {
            Ok(description) => {
                prompt.show(&format!("Image {}/{}: {}", i + 1, images.len(), description))
            }
            Err(err) => {
                warn!("Could not read {:?}: {}", path, err);
                prompt.show(&format!("Error processing {}: {}", name, err));
                outcome.failed += 1;
                continue;
            }
        }

        loop {
            let Some(answer) = prompt.ask(&format!("Label for '{}' (1-4, s, q): ", name)) else {
                outcome.quit = true;
                break 'images;
            };
            match parse_choice(&answer) {
                Some(Choice::Quit) => {
                    outcome.quit = true;
                    break 'images;
                }
                Some(Choice::Skip) => {
                    outcome.skipped += 1;
                    prompt.show("Skipped");
                    break;
                }
                Some(Choice::Label(mood)) => {
                    let destination = root
                        .join(mood.as_str())
                        .join(labeled_name(mood, counter, path));
                    match fs::copy(path, &destination) {
                        Ok(_) => {
                            prompt.show(&format!("Labeled as '{}' -> {:?}", mood, destination));
                            outcome.labeled.increment(mood);
                            counter += 1;
                        }
                        Err(err) => {
                            prompt.show(&format!("Error processing {}: {}", name, err));
                            outcome.failed += 1;
                        }
                    }
                    break;
                }
                None => prompt.show("Invalid choice. Use 1-4, s, or q"),
            }
        }
    }

    outcome.summary = count_images(root)?;
    prompt.show(&format!(
        "Labeled {} images. Dataset summary:",
        outcome.labeled.total()
    ));
    for (mood, count) in outcome.summary.iter() {
        prompt.show(&format!("  {}: {} images", mood, count));
    }
    Ok(outcome)
}
