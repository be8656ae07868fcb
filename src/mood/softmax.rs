use super::{ClassifyError, MoodClassifier, MoodLabel, Prediction, SKETCH_SIZE};
use anyhow::{Context, Result};
use image::{imageops, imageops::FilterType, GrayImage};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

pub const DEFAULT_MODEL_PATH: &str = "ml/sketch_mood_model.json";

/// Multinomial logistic regression over normalized pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoftmaxModel {
    pub width: u32,
    pub height: u32,
    pub classes: Vec<MoodLabel>,
    /// One row of `width * height` weights per class.
    pub weights: Vec<Vec<f32>>,
    pub biases: Vec<f32>,
}

impl SoftmaxModel {
    pub fn zeros(width: u32, height: u32) -> Self {
        let inputs = width as usize * height as usize;
        let classes = MoodLabel::ALL.to_vec();
        Self {
            width,
            height,
            weights: vec![vec![0.0; inputs]; classes.len()],
            biases: vec![0.0; classes.len()],
            classes,
        }
    }

    pub fn input_len(&self) -> usize {
        (self.width as usize).saturating_mul(self.height as usize)
    }

    pub fn class_index(&self, mood: MoodLabel) -> Option<usize> {
        self.classes.iter().position(|c| *c == mood)
    }

    /// Checks a deserialized model against the sketch size it will be fed.
    pub fn validate(&self) -> Result<(), ClassifyError> {
        if (self.width, self.height) != (SKETCH_SIZE, SKETCH_SIZE) {
            return Err(ClassifyError::MalformedModel(format!(
                "model is {}x{}, sketches are {}x{}",
                self.width, self.height, SKETCH_SIZE, SKETCH_SIZE
            )));
        }
        if self.classes.is_empty() {
            return Err(ClassifyError::MalformedModel("no classes".to_string()));
        }
        if self.weights.len() != self.classes.len() || self.biases.len() != self.classes.len() {
            return Err(ClassifyError::MalformedModel(format!(
                "{} classes but {} weight rows and {} biases",
                self.classes.len(),
                self.weights.len(),
                self.biases.len()
            )));
        }
        let expected = (self.width as usize)
            .checked_mul(self.height as usize)
            .ok_or_else(|| ClassifyError::MalformedModel("input size overflows".to_string()))?;
        if let Some(row) = self.weights.iter().find(|row| row.len() != expected) {
            return Err(ClassifyError::MalformedModel(format!(
                "weight row has {} entries, expected {}",
                row.len(),
                expected
            )));
        }
        Ok(())
    }

    pub fn logits(&self, input: &[f32]) -> Result<Vec<f32>, ClassifyError> {
        if input.len() != self.input_len() {
            return Err(ClassifyError::InputShape {
                expected: self.input_len(),
                actual: input.len(),
            });
        }
        Ok(self
            .weights
            .iter()
            .zip(&self.biases)
            .map(|(row, bias)| row.iter().zip(input).map(|(w, x)| w * x).sum::<f32>() + bias)
            .collect())
    }

    pub fn probabilities(&self, input: &[f32]) -> Result<Vec<f32>, ClassifyError> {
        Ok(softmax(&self.logits(input)?))
    }

    pub fn predict(&self, input: &[f32]) -> Result<Prediction, ClassifyError> {
        let probabilities = self.probabilities(input)?;
        let best = argmax(&probabilities)
            .ok_or_else(|| ClassifyError::MalformedModel("no classes".to_string()))?;
        let mood = *self
            .classes
            .get(best)
            .ok_or_else(|| ClassifyError::MalformedModel("class index out of range".to_string()))?;
        Ok(Prediction {
            mood,
            confidence: probabilities[best] as f64,
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read model file {:?}", path))?;
        let model: SoftmaxModel = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse model file {:?}", path))?;
        model.validate()?;
        Ok(model)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }
        let content = serde_json::to_string(self)?;
        fs::write(path, content).with_context(|| format!("Failed to write model file {:?}", path))
    }
}

pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// Index of the largest value; ties resolve to the first one.
pub fn argmax(values: &[f32]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f32)>, (i, &v)| match best {
            Some((_, best_value)) if best_value >= v => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

pub fn normalize_pixels(image: &GrayImage) -> Vec<f32> {
    image.as_raw().iter().map(|&p| p as f32 / 255.0).collect()
}

pub struct SoftmaxClassifier {
    model: SoftmaxModel,
}

impl SoftmaxClassifier {
    pub fn new(model: SoftmaxModel) -> Self {
        Self { model }
    }
}

impl MoodClassifier for SoftmaxClassifier {
    fn name(&self) -> &'static str {
        "trained"
    }

    fn classify(&self, sketch: &GrayImage) -> Result<Prediction, ClassifyError> {
        let input = if sketch.dimensions() == (self.model.width, self.model.height) {
            normalize_pixels(sketch)
        } else {
            let resized = imageops::resize(
                sketch,
                self.model.width,
                self.model.height,
                FilterType::Triangle,
            );
            normalize_pixels(&resized)
        };
        self.model.predict(&input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use tempfile::TempDir;

    #[test]
    fn softmax_sums_to_one() {
        let probabilities = softmax(&[1.0, 2.0, 3.0, 1000.0]);
        let sum: f32 = probabilities.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(probabilities[3] > 0.99);
    }

    #[test]
    fn argmax_prefers_first_of_ties() {
        assert_eq!(argmax(&[0.25, 0.25, 0.25, 0.25]), Some(0));
        assert_eq!(argmax(&[0.1, 0.7, 0.2]), Some(1));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn zero_model_is_uniform() {
        let model = SoftmaxModel::zeros(4, 4);

        let prediction = model.predict(&[0.5; 16]).unwrap();

        assert_eq!(prediction.mood, MoodLabel::Happy);
        assert!((prediction.confidence - 0.25).abs() < 1e-6);
    }

    #[test]
    fn bias_drives_prediction() {
        let mut model = SoftmaxModel::zeros(2, 2);
        model.biases[MoodLabel::Sad.index()] = 5.0;

        let prediction = model.predict(&[1.0; 4]).unwrap();

        assert_eq!(prediction.mood, MoodLabel::Sad);
        assert!(prediction.confidence > 0.9);
    }

    #[test]
    fn rejects_wrong_input_shape() {
        let model = SoftmaxModel::zeros(2, 2);
        assert!(matches!(
            model.predict(&[1.0; 3]),
            Err(ClassifyError::InputShape {
                expected: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn validate_catches_short_weight_rows() {
        let mut model = SoftmaxModel::zeros(SKETCH_SIZE, SKETCH_SIZE);
        model.weights[1].pop();
        assert!(matches!(
            model.validate(),
            Err(ClassifyError::MalformedModel(_))
        ));
    }

    #[test]
    fn saved_model_loads_back() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("model.json");
        let mut model = SoftmaxModel::zeros(SKETCH_SIZE, SKETCH_SIZE);
        model.weights[2][10] = 0.5;

        model.save(&path).unwrap();
        let loaded = SoftmaxModel::load(&path).unwrap();

        assert_eq!(loaded, model);
    }

    #[test]
    fn load_rejects_malformed_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("model.json");
        fs::write(
            &path,
            r#"{"width":2,"height":2,"classes":["happy"],"weights":[[0.0]],"biases":[0.0]}"#,
        )
        .unwrap();

        assert!(SoftmaxModel::load(&path).is_err());
    }

    #[test]
    fn validate_rejects_foreign_dimensions() {
        for (width, height) in [(0, 0), (8, 8), (SKETCH_SIZE, 0), (65536, 65536)] {
            let model = SoftmaxModel {
                width,
                height,
                classes: vec![MoodLabel::Happy],
                weights: vec![vec![]],
                biases: vec![0.0],
            };
            assert!(
                matches!(model.validate(), Err(ClassifyError::MalformedModel(_))),
                "{}x{} accepted",
                width,
                height
            );
        }
    }

    #[test]
    fn classifier_resizes_foreign_sizes() {
        let mut model = SoftmaxModel::zeros(4, 4);
        model.biases[MoodLabel::Energetic.index()] = 3.0;
        let classifier = SoftmaxClassifier::new(model);

        let prediction = classifier
            .classify(&GrayImage::from_pixel(64, 64, Luma([128])))
            .unwrap();

        assert_eq!(prediction.mood, MoodLabel::Energetic);
    }
}
