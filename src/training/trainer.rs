use anyhow::{bail, Context, Result};
use indicatif::ProgressBar;
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use tracing::{debug, info};

use super::Sample;
use crate::mood::{argmax, SoftmaxModel, SKETCH_SIZE};

const MIN_PROBABILITY: f32 = 1e-7;

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f32,
    /// Epochs without improvement before training stops.
    pub early_stopping_patience: usize,
    /// Epochs without improvement before the learning rate is reduced.
    pub lr_patience: usize,
    pub lr_factor: f32,
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            epochs: 50,
            batch_size: 32,
            learning_rate: 0.01,
            early_stopping_patience: 10,
            lr_patience: 5,
            lr_factor: 0.5,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub loss: f32,
    pub accuracy: f32,
}

#[derive(Debug, Clone)]
pub struct TrainingReport {
    /// Weights from the epoch with the lowest monitored loss.
    pub model: SoftmaxModel,
    pub epochs_run: usize,
    pub best_epoch: usize,
    pub best_evaluation: Evaluation,
    pub final_learning_rate: f32,
}

/// Mean cross-entropy and accuracy of the model over the samples.
pub fn evaluate(model: &SoftmaxModel, samples: &[Sample]) -> Result<Evaluation> {
    if samples.is_empty() {
        bail!("Cannot evaluate on an empty set");
    }
    let mut loss = 0.0;
    let mut correct = 0;
    for sample in samples {
        let probabilities = model.probabilities(&sample.pixels)?;
        let target = model
            .class_index(sample.label)
            .with_context(|| format!("Model has no class {}", sample.label))?;
        loss -= probabilities[target].max(MIN_PROBABILITY).ln();
        if argmax(&probabilities) == Some(target) {
            correct += 1;
        }
    }
    Ok(Evaluation {
        loss: loss / samples.len() as f32,
        accuracy: correct as f32 / samples.len() as f32,
    })
}

/// One gradient step of softmax cross-entropy over a mini-batch.
fn step(model: &mut SoftmaxModel, batch: &[&Sample], learning_rate: f32) -> Result<()> {
    let classes = model.classes.len();
    let inputs = model.input_len();
    let mut weight_grads = vec![vec![0.0f32; inputs]; classes];
    let mut bias_grads = vec![0.0f32; classes];

    for sample in batch {
        let probabilities = model.probabilities(&sample.pixels)?;
        let target = model
            .class_index(sample.label)
            .with_context(|| format!("Model has no class {}", sample.label))?;
        for (k, probability) in probabilities.iter().enumerate() {
            let delta = probability - if k == target { 1.0 } else { 0.0 };
            if delta == 0.0 {
                continue;
            }
            bias_grads[k] += delta;
            for (grad, x) in weight_grads[k].iter_mut().zip(&sample.pixels) {
                *grad += delta * x;
            }
        }
    }

    let scale = learning_rate / batch.len() as f32;
    for (row, grads) in model.weights.iter_mut().zip(&weight_grads) {
        for (w, g) in row.iter_mut().zip(grads) {
            *w -= scale * g;
        }
    }
    for (b, g) in model.biases.iter_mut().zip(&bias_grads) {
        *b -= scale * g;
    }
    Ok(())
}

/// Mini-batch gradient descent on a fresh model. The validation set, or the
/// training set when there is none, drives the learning rate schedule and
/// early stopping.
pub fn train(
    train: &[Sample],
    validation: Option<&[Sample]>,
    config: &TrainingConfig,
    progress: &ProgressBar,
) -> Result<TrainingReport> {
    if train.is_empty() {
        bail!("Training set is empty");
    }
    if config.epochs == 0 || config.batch_size == 0 {
        bail!("Epochs and batch size must be positive");
    }
    let mut model = SoftmaxModel::zeros(SKETCH_SIZE, SKETCH_SIZE);
    if let Some(sample) = train.iter().find(|s| s.pixels.len() != model.input_len()) {
        bail!(
            "Sample has {} pixels, expected {}",
            sample.pixels.len(),
            model.input_len()
        );
    }
    let monitored = validation.filter(|v| !v.is_empty()).unwrap_or(train);

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut order: Vec<&Sample> = train.iter().collect();
    let mut learning_rate = config.learning_rate;

    let mut best_model = model.clone();
    let mut best_evaluation = evaluate(&model, monitored)?;
    best_evaluation.loss = f32::INFINITY;
    let mut best_epoch = 0;
    let mut epochs_without_improvement = 0;
    let mut epochs_since_lr_change = 0;
    let mut epochs_run = 0;

    progress.set_length(config.epochs as u64);
    for epoch in 1..=config.epochs {
        order.shuffle(&mut rng);
        for batch in order.chunks(config.batch_size) {
            step(&mut model, batch, learning_rate)?;
        }
        epochs_run = epoch;

        let evaluation = evaluate(&model, monitored)?;
        debug!(
            "Epoch {}: loss {:.4}, accuracy {:.4}, lr {}",
            epoch, evaluation.loss, evaluation.accuracy, learning_rate
        );
        progress.set_message(format!(
            "loss {:.4} acc {:.3}",
            evaluation.loss, evaluation.accuracy
        ));
        progress.inc(1);

        if evaluation.loss < best_evaluation.loss {
            best_evaluation = evaluation;
            best_model = model.clone();
            best_epoch = epoch;
            epochs_without_improvement = 0;
            epochs_since_lr_change = 0;
        } else {
            epochs_without_improvement += 1;
            epochs_since_lr_change += 1;
        }

        if epochs_since_lr_change >= config.lr_patience {
            learning_rate *= config.lr_factor;
            epochs_since_lr_change = 0;
            info!("Epoch {}: reducing learning rate to {}", epoch, learning_rate);
        }
        if epochs_without_improvement >= config.early_stopping_patience {
            info!(
                "Early stopping at epoch {}, best epoch was {}",
                epoch, best_epoch
            );
            break;
        }
    }
    progress.finish_with_message(format!(
        "best loss {:.4} at epoch {}",
        best_evaluation.loss, best_epoch
    ));

    Ok(TrainingReport {
        model: best_model,
        epochs_run,
        best_epoch,
        best_evaluation,
        final_learning_rate: learning_rate,
    })
}
