use super::{ClassifyError, MoodClassifier, MoodLabel, Prediction};
use image::GrayImage;
use rand::Rng;

const MAX_CONFIDENCE: f64 = 0.99;

pub fn mean_brightness(image: &GrayImage) -> f64 {
    let pixels = image.as_raw();
    if pixels.is_empty() {
        return 0.0;
    }
    pixels.iter().map(|&p| p as f64).sum::<f64>() / pixels.len() as f64
}

/// The two moods a brightness level can map to, with the confidence
/// reported for either.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrightnessBucket {
    pub candidates: [MoodLabel; 2],
    pub confidence: f64,
}

pub fn brightness_bucket(mean: f64) -> BrightnessBucket {
    let (candidates, confidence) = if mean > 220.0 {
        (
            [MoodLabel::Calm, MoodLabel::Happy],
            0.6 + (mean - 220.0) / 35.0 * 0.4,
        )
    } else if mean > 120.0 {
        (
            [MoodLabel::Happy, MoodLabel::Energetic],
            0.5 + (mean - 120.0) / 100.0 * 0.5,
        )
    } else {
        ([MoodLabel::Sad, MoodLabel::Energetic], 0.55)
    };
    BrightnessBucket {
        candidates,
        confidence: confidence.clamp(0.0, MAX_CONFIDENCE),
    }
}

/// Default classifier: light sketches read as calm or happy, dark ones as
/// sad or energetic.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrightnessClassifier;

impl BrightnessClassifier {
    pub fn classify_with_rng<R: Rng + ?Sized>(
        &self,
        sketch: &GrayImage,
        rng: &mut R,
    ) -> Prediction {
        let bucket = brightness_bucket(mean_brightness(sketch));
        let mood = bucket.candidates[rng.random_range(0..bucket.candidates.len())];
        Prediction {
            mood,
            confidence: bucket.confidence,
        }
    }
}

impl MoodClassifier for BrightnessClassifier {
    fn name(&self) -> &'static str {
        "brightness"
    }

    fn classify(&self, sketch: &GrayImage) -> Result<Prediction, ClassifyError> {
        Ok(self.classify_with_rng(sketch, &mut rand::rng()))
    }
}
