use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rustyline::{error::ReadlineError, DefaultEditor};
use std::path::PathBuf;
use tracing::error;

use sketch_mood_server::cli_style::get_styles;
use sketch_mood_server::config::parse_path;
use sketch_mood_server::dataset::{
    batch_move, count_images, create_structure, generate_synthetic, interactive_label,
    write_instructions, LabelPrompt, DEFAULT_DATASET_DIR,
};
use sketch_mood_server::logging::init_logging;
use sketch_mood_server::mood::MoodCounts;

/// Builds and organizes the doodle dataset used for training.
#[derive(Parser, Debug)]
#[command(styles = get_styles())]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Creates the mood folders, optionally filled with synthetic doodles.
    Setup {
        #[clap(long, value_parser = parse_path, default_value = DEFAULT_DATASET_DIR)]
        output: PathBuf,

        /// Generate simple synthetic doodles for testing.
        #[clap(long)]
        synthetic: bool,

        /// Synthetic doodles per mood.
        #[clap(long, default_value_t = 50)]
        samples: usize,
    },

    /// Sorts images from a source folder into the mood folders.
    Label {
        #[clap(long, value_parser = parse_path)]
        source: PathBuf,

        #[clap(long, value_parser = parse_path, default_value = DEFAULT_DATASET_DIR)]
        dataset: PathBuf,

        /// Ask for the mood of each image.
        #[clap(long, conflicts_with = "batch")]
        interactive: bool,

        /// Detect the mood from each file name.
        #[clap(long)]
        batch: bool,
    },

    /// Creates the mood folders with a README describing what goes in each.
    Sample {
        #[clap(long, value_parser = parse_path, default_value = DEFAULT_DATASET_DIR)]
        dataset: PathBuf,
    },
}

struct TerminalPrompt {
    editor: DefaultEditor,
}

impl LabelPrompt for TerminalPrompt {
    fn ask(&mut self, question: &str) -> Option<String> {
        match self.editor.readline(question) {
            Ok(line) => Some(line),
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => None,
            Err(err) => {
                error!("Failed to read input: {}", err);
                None
            }
        }
    }

    fn show(&mut self, message: &str) {
        println!("{}", message);
    }
}

fn print_counts(title: &str, counts: &MoodCounts) {
    println!("\n{}", title);
    for (mood, count) in counts.iter() {
        println!("  {}: {}", mood, count);
    }
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();
    init_logging()?;

    match cli_args.command {
        Command::Setup {
            output,
            synthetic,
            samples,
        } => {
            create_structure(&output)?;
            if synthetic {
                println!("Note: synthetic doodles are simple shapes for testing only.");
                let generated = generate_synthetic(&output, samples, &mut rand::rng())?;
                print_counts("Generated doodles:", &generated);
                println!("\nTrain with: cli-train --dataset-path {}", output.display());
            } else {
                println!("Dataset structure ready at {}", output.display());
                println!("Add doodles to the mood folders, then run:");
                println!("  cli-train --dataset-path {}", output.display());
            }
        }
        Command::Label {
            source,
            dataset,
            interactive,
            batch,
        } => {
            if interactive {
                let mut prompt = TerminalPrompt {
                    editor: DefaultEditor::new().context("Failed to open the terminal")?,
                };
                let outcome = interactive_label(&source, &dataset, &mut prompt)?;
                if outcome.failed > 0 {
                    println!("{} images could not be processed", outcome.failed);
                }
            } else if batch {
                let moved = batch_move(&source, &dataset)?;
                print_counts("Batch move summary:", &moved);
            } else {
                bail!(
                    "Specify --interactive or --batch, e.g.\n  \
                     cli-dataset label --source screenshots/ --interactive"
                );
            }
        }
        Command::Sample { dataset } => {
            write_instructions(&dataset)?;
            print_counts("Images per mood:", &count_images(&dataset)?);
            println!("\nAdd your doodle images to the mood folders in {}", dataset.display());
        }
    }
    Ok(())
}
