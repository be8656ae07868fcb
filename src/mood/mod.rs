//! Mood labels and the classifiers that assign them to sketches.

mod brightness;
mod classifier;
mod label;
pub mod sketch;
mod softmax;

pub use brightness::{brightness_bucket, mean_brightness, BrightnessBucket, BrightnessClassifier};
pub use classifier::{
    load_classifier, ClassifierKind, ClassifyError, FallbackClassifier, MoodClassifier,
};
pub use label::{MoodCounts, MoodLabel, Prediction, UnknownMoodLabel};
pub use sketch::{SketchError, SketchUpload, SKETCH_SIZE};
pub use softmax::{
    argmax, normalize_pixels, softmax, SoftmaxClassifier, SoftmaxModel, DEFAULT_MODEL_PATH,
};
