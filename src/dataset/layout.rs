use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::info;

use super::{has_extension, DatasetError, TRAINING_EXTENSIONS};
use crate::mood::{MoodCounts, MoodLabel};

const README_FILE: &str = "README.txt";

fn drawing_suggestions(mood: MoodLabel) -> &'static str {
    match mood {
        MoodLabel::Happy => {
            "Add drawings of: smiling faces, suns, flowers, hearts, rainbows, stars, thumbs up"
        }
        MoodLabel::Calm => {
            "Add drawings of: waves, clouds, trees, mountains, meditation poses, gentle curves"
        }
        MoodLabel::Sad => {
            "Add drawings of: tears, rain, wilted flowers, downward arrows, broken hearts"
        }
        MoodLabel::Energetic => {
            "Add drawings of: lightning bolts, zigzags, explosions, exclamation marks, dynamic lines"
        }
    }
}

/// Creates `<root>/<mood>` for every mood and returns the created paths.
pub fn create_structure(root: &Path) -> Result<Vec<PathBuf>, DatasetError> {
    MoodLabel::ALL
        .iter()
        .map(|mood| {
            let dir = root.join(mood.as_str());
            fs::create_dir_all(&dir)?;
            info!("Created directory: {:?}", dir);
            Ok(dir)
        })
        .collect()
}

pub fn mood_instructions(mood: MoodLabel) -> String {
    format!(
        "MOOD: {upper}\n{rule}\n\n\
         Place your {mood} doodle images in this folder.\n\n\
         Suggested drawings:\n{suggestions}\n\n\
         Supported formats: .png, .jpg, .jpeg\n\
         Recommended size: Any size (will be resized to 64x64)\n\
         Background: Any (preferably white/light)\n",
        upper = mood.as_str().to_uppercase(),
        rule = "=".repeat(30),
        mood = mood,
        suggestions = drawing_suggestions(mood),
    )
}

/// Creates the mood folders, each with a `README.txt` describing what to
/// put in it.
pub fn write_instructions(root: &Path) -> Result<(), DatasetError> {
    create_structure(root)?;
    for mood in MoodLabel::ALL {
        fs::write(
            root.join(mood.as_str()).join(README_FILE),
            mood_instructions(mood),
        )?;
    }
    Ok(())
}

/// Number of training images in each mood folder. Missing folders count as
/// empty.
pub fn count_images(root: &Path) -> Result<MoodCounts, DatasetError> {
    let mut counts = MoodCounts::default();
    for mood in MoodLabel::ALL {
        let dir = root.join(mood.as_str());
        if !dir.is_dir() {
            continue;
        }
        let mut count = 0;
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_file() && has_extension(&path, &TRAINING_EXTENSIONS) {
                count += 1;
            }
        }
        counts.set(mood, count);
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn creates_one_folder_per_mood() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("dataset");

        let dirs = create_structure(&root).unwrap();

        assert_eq!(dirs.len(), 4);
        for mood in ["happy", "calm", "sad", "energetic"] {
            assert!(root.join(mood).is_dir());
        }
    }

    #[test]
    fn instructions_mention_mood_and_formats() {
        let text = mood_instructions(MoodLabel::Energetic);

        assert!(text.starts_with("MOOD: ENERGETIC\n=============================="));
        assert!(text.contains("Place your energetic doodle images in this folder."));
        assert!(text.contains("lightning bolts"));
        assert!(text.contains("Supported formats: .png, .jpg, .jpeg"));
    }

    #[test]
    fn writes_readme_per_mood() {
        let temp_dir = TempDir::new().unwrap();

        write_instructions(temp_dir.path()).unwrap();

        let readme = fs::read_to_string(temp_dir.path().join("calm").join(README_FILE)).unwrap();
        assert!(readme.contains("MOOD: CALM"));
        assert!(readme.contains("waves, clouds"));
    }

    #[test]
    fn counts_only_training_images() {
        let temp_dir = TempDir::new().unwrap();
        write_instructions(temp_dir.path()).unwrap();
        fs::write(temp_dir.path().join("sad").join("a.png"), b"x").unwrap();
        fs::write(temp_dir.path().join("sad").join("b.JPG"), b"x").unwrap();
        fs::write(temp_dir.path().join("sad").join("c.bmp"), b"x").unwrap();

        let counts = count_images(temp_dir.path()).unwrap();

        assert_eq!(counts.get(MoodLabel::Sad), 2);
        assert_eq!(counts.get(MoodLabel::Happy), 0);
        assert_eq!(counts.total(), 2);
    }

    #[test]
    fn missing_dataset_counts_as_empty() {
        let temp_dir = TempDir::new().unwrap();

        let counts = count_images(&temp_dir.path().join("nope")).unwrap();

        assert_eq!(counts.total(), 0);
    }
}
