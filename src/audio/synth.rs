use hound::{SampleFormat, WavSpec, WavWriter};
use std::{f64::consts::PI, path::Path};
use thiserror::Error;

pub const DEFAULT_SAMPLE_RATE: u32 = 22050;
pub const DEFAULT_AMPLITUDE: f64 = 0.3;
const I16_SCALE: f64 = 32767.0;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV encoding failed: {0}")]
    Wav(#[from] hound::Error),
}

/// Note frequencies in Hz. Zero is a rest.
pub mod notes {
    pub const REST: f64 = 0.0;
    pub const C4: f64 = 261.63;
    pub const D4: f64 = 293.66;
    pub const E4: f64 = 329.63;
    pub const F4: f64 = 349.23;
    pub const G4: f64 = 392.00;
    pub const A4: f64 = 440.00;
    pub const B4: f64 = 493.88;
    pub const C5: f64 = 523.25;
    pub const D5: f64 = 587.33;
    pub const E5: f64 = 659.25;
    pub const F5: f64 = 698.46;
}

fn frame_count(duration_secs: f64, sample_rate: u32) -> usize {
    (duration_secs * sample_rate as f64) as usize
}

pub fn sine_wave(frequency: f64, duration_secs: f64, sample_rate: u32, amplitude: f64) -> Vec<i16> {
    (0..frame_count(duration_secs, sample_rate))
        .map(|i| {
            let value = amplitude * (2.0 * PI * frequency * i as f64 / sample_rate as f64).sin();
            (value * I16_SCALE) as i16
        })
        .collect()
}

pub fn melody(frequencies: &[f64], note_duration_secs: f64, sample_rate: u32) -> Vec<i16> {
    let mut samples =
        Vec::with_capacity(frequencies.len() * frame_count(note_duration_secs, sample_rate));
    for &frequency in frequencies {
        if frequency > 0.0 {
            samples.extend(sine_wave(
                frequency,
                note_duration_secs,
                sample_rate,
                DEFAULT_AMPLITUDE,
            ));
        } else {
            samples.extend(std::iter::repeat(0).take(frame_count(note_duration_secs, sample_rate)));
        }
    }
    samples
}

/// Writes mono 16 bit PCM.
pub fn write_wav(path: &Path, samples: &[i16], sample_rate: u32) -> Result<(), AudioError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}
