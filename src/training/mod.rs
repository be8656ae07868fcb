//! Training of the softmax mood model from a labeled dataset folder.

mod augment;
mod loader;
mod split;
mod trainer;

pub use augment::{augment, augment_factor, AUGMENT_TARGET};
pub use loader::{class_distribution, load_dataset, load_sample, Sample};
pub use split::stratified_split;
pub use trainer::{evaluate, train, Evaluation, TrainingConfig, TrainingReport};
