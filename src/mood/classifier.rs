use super::{BrightnessClassifier, Prediction, SoftmaxClassifier, SoftmaxModel};
use image::GrayImage;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("model expects {expected} inputs, got {actual}")]
    InputShape { expected: usize, actual: usize },

    #[error("model is malformed: {0}")]
    MalformedModel(String),
}

pub trait MoodClassifier: Send + Sync {
    fn name(&self) -> &'static str;
    fn classify(&self, sketch: &GrayImage) -> Result<Prediction, ClassifyError>;
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ClassifierKind {
    /// Brightness heuristic.
    #[default]
    Brightness,

    /// Softmax model trained with cli-train.
    Trained,
}

/// Runs the primary classifier and answers with the brightness heuristic
/// whenever it fails.
pub struct FallbackClassifier {
    primary: Box<dyn MoodClassifier>,
    fallback: BrightnessClassifier,
}

impl FallbackClassifier {
    pub fn new(primary: Box<dyn MoodClassifier>) -> Self {
        Self {
            primary,
            fallback: BrightnessClassifier,
        }
    }
}

impl MoodClassifier for FallbackClassifier {
    fn name(&self) -> &'static str {
        self.primary.name()
    }

    fn classify(&self, sketch: &GrayImage) -> Result<Prediction, ClassifyError> {
        match self.primary.classify(sketch) {
            Ok(prediction) => Ok(prediction),
            Err(err) => {
                warn!(
                    "{} classifier failed, using brightness heuristic: {}",
                    self.primary.name(),
                    err
                );
                self.fallback.classify(sketch)
            }
        }
    }
}

pub fn load_classifier(kind: ClassifierKind, model_path: Option<&Path>) -> Box<dyn MoodClassifier> {
    match (kind, model_path) {
        (ClassifierKind::Brightness, _) => Box::new(BrightnessClassifier),
        (ClassifierKind::Trained, None) => {
            warn!("No model path configured, using brightness heuristic");
            Box::new(BrightnessClassifier)
        }
        (ClassifierKind::Trained, Some(path)) => match SoftmaxModel::load(path) {
            Ok(model) => {
                info!("Loaded trained model from {:?}", path);
                Box::new(FallbackClassifier::new(Box::new(SoftmaxClassifier::new(
                    model,
                ))))
            }
            Err(err) => {
                warn!(
                    "Could not load model {:?}, using brightness heuristic: {:#}",
                    path, err
                );
                Box::new(BrightnessClassifier)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mood::MoodLabel;
    use image::Luma;
    use tempfile::TempDir;

    struct BrokenClassifier;

    impl MoodClassifier for BrokenClassifier {
        fn name(&self) -> &'static str {
            "broken"
        }

        fn classify(&self, _sketch: &GrayImage) -> Result<Prediction, ClassifyError> {
            Err(ClassifyError::MalformedModel("no weights".to_string()))
        }
    }

    #[test]
    fn fallback_answers_when_primary_fails() {
        let classifier = FallbackClassifier::new(Box::new(BrokenClassifier));
        let black = GrayImage::from_pixel(64, 64, Luma([0]));

        let prediction = classifier.classify(&black).unwrap();

        assert_eq!(classifier.name(), "broken");
        assert!(matches!(
            prediction.mood,
            MoodLabel::Sad | MoodLabel::Energetic
        ));
        assert_eq!(prediction.confidence, 0.55);
    }

    #[test]
    fn missing_model_file_loads_heuristic() {
        let temp_dir = TempDir::new().unwrap();

        let classifier = load_classifier(
            ClassifierKind::Trained,
            Some(&temp_dir.path().join("missing.json")),
        );

        assert_eq!(classifier.name(), "brightness");
    }

    #[test]
    fn oversized_model_file_loads_heuristic() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("model.json");
        std::fs::write(
            &path,
            r#"{"width":65536,"height":65536,"classes":["happy"],"weights":[[]],"biases":[0.0]}"#,
        )
        .unwrap();

        let classifier = load_classifier(ClassifierKind::Trained, Some(&path));

        assert_eq!(classifier.name(), "brightness");
    }

    #[test]
    fn trained_model_is_loaded() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("model.json");
        SoftmaxModel::zeros(64, 64).save(&path).unwrap();

        let classifier = load_classifier(ClassifierKind::Trained, Some(&path));

        assert_eq!(classifier.name(), "trained");
    }

    #[test]
    fn brightness_kind_ignores_model_path() {
        let classifier = load_classifier(ClassifierKind::Brightness, None);
        assert_eq!(classifier.name(), "brightness");
    }
}
