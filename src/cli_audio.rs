use anyhow::{Context, Result};
use byte_unit::Byte;
use clap::Parser;
use std::path::PathBuf;

use sketch_mood_server::audio::{render_all, AUDIO_SUBDIR};
use sketch_mood_server::cli_style::get_styles;
use sketch_mood_server::config::parse_path;
use sketch_mood_server::logging::init_logging;

/// Synthesizes the mood tracks played back after each prediction.
#[derive(Parser, Debug)]
#[command(styles = get_styles())]
struct CliArgs {
    /// Directory the WAV files are written to.
    #[clap(long, value_parser = parse_path)]
    pub output_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();
    init_logging()?;

    let output_dir = cli_args
        .output_dir
        .unwrap_or_else(|| PathBuf::from("static").join(AUDIO_SUBDIR));
    let rendered = render_all(&output_dir)
        .with_context(|| format!("Failed to render tracks into {:?}", output_dir))?;

    for track in &rendered {
        println!("Created: {}", track.path.display());
        println!(
            "   Size: {} bytes ({:#})",
            track.size_bytes,
            Byte::from(track.size_bytes)
        );
    }
    println!("\nCreated {} audio files in {}", rendered.len(), output_dir.display());
    Ok(())
}
