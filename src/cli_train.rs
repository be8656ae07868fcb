use anyhow::{bail, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing::{info, warn};

use sketch_mood_server::cli_style::get_styles;
use sketch_mood_server::config::parse_path;
use sketch_mood_server::dataset::{write_instructions, DEFAULT_DATASET_DIR};
use sketch_mood_server::logging::init_logging;
use sketch_mood_server::mood::{MoodCounts, DEFAULT_MODEL_PATH};
use sketch_mood_server::training::{
    augment, augment_factor, class_distribution, evaluate, load_dataset, stratified_split,
    train, TrainingConfig,
};

const SPLIT_SEED: u64 = 42;

/// Trains the sketch mood model from a folder of labeled doodles.
#[derive(Parser, Debug)]
#[command(styles = get_styles())]
struct CliArgs {
    /// Dataset folder with one subfolder per mood.
    #[clap(long, value_parser = parse_path, default_value = DEFAULT_DATASET_DIR)]
    pub dataset_path: PathBuf,

    #[clap(long, default_value_t = 50)]
    pub epochs: usize,

    #[clap(long, default_value_t = 32)]
    pub batch_size: usize,

    /// Share of each mood held out for evaluation.
    #[clap(long, default_value_t = 0.2)]
    pub test_size: f64,

    #[clap(long, default_value_t = 0.01)]
    pub learning_rate: f32,

    /// Disable data augmentation of small datasets.
    #[clap(long)]
    pub no_augment: bool,

    /// Where the trained model is written.
    #[clap(long, value_parser = parse_path, default_value = DEFAULT_MODEL_PATH)]
    pub model_path: PathBuf,

    /// Create the dataset folder structure with instructions and exit.
    #[clap(long)]
    pub create_sample: bool,
}

fn print_distribution(counts: &MoodCounts) {
    for (mood, count) in counts.iter() {
        println!("  {}: {} images", mood, count);
    }
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();
    init_logging()?;

    if cli_args.create_sample {
        write_instructions(&cli_args.dataset_path)?;
        println!(
            "Sample dataset structure created at {}",
            cli_args.dataset_path.display()
        );
        println!("1. Add your doodle images to the mood folders");
        println!(
            "2. Run: cli-train --dataset-path {}",
            cli_args.dataset_path.display()
        );
        return Ok(());
    }

    if !cli_args.dataset_path.is_dir() {
        bail!(
            "Dataset path does not exist: {:?}. Use --create-sample to create it first",
            cli_args.dataset_path
        );
    }

    info!("Loading dataset from {:?}...", cli_args.dataset_path);
    let mut samples = load_dataset(&cli_args.dataset_path)?;
    println!("Loaded {} images", samples.len());
    print_distribution(&class_distribution(&samples));

    match augment_factor(samples.len()).filter(|_| !cli_args.no_augment) {
        Some(factor) => {
            info!("Augmenting with {} variants per image", factor);
            samples = augment(&samples, factor, &mut rand::rng());
            println!("Dataset size after augmentation: {} images", samples.len());
            print_distribution(&class_distribution(&samples));
        }
        None => info!("No augmentation"),
    }

    let (train_set, test_set) = stratified_split(samples, cli_args.test_size, SPLIT_SEED)?;
    println!(
        "Training set: {} images, test set: {} images",
        train_set.len(),
        test_set.len()
    );

    let config = TrainingConfig {
        epochs: cli_args.epochs,
        batch_size: cli_args.batch_size,
        learning_rate: cli_args.learning_rate,
        ..TrainingConfig::default()
    };
    let progress = ProgressBar::new(config.epochs as u64);
    progress.set_style(ProgressStyle::with_template(
        "{spinner} epoch {pos}/{len} [{bar:30}] {msg}",
    )?);
    let report = train(&train_set, Some(test_set.as_slice()), &config, &progress)?;
    println!(
        "Ran {} epochs, best epoch {}, final learning rate {}",
        report.epochs_run, report.best_epoch, report.final_learning_rate
    );

    if test_set.is_empty() {
        warn!("Test set is empty, skipping evaluation");
    } else {
        let evaluation = evaluate(&report.model, &test_set)?;
        println!("Test accuracy: {:.4}", evaluation.accuracy);
        println!("Test loss: {:.4}", evaluation.loss);
    }

    report.model.save(&cli_args.model_path)?;
    println!("Model saved to {}", cli_args.model_path.display());
    Ok(())
}
