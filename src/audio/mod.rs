//! Placeholder mood tracks synthesized from sine waves.

mod synth;
mod tracks;

pub use synth::{
    melody, notes, sine_wave, write_wav, AudioError, DEFAULT_AMPLITUDE, DEFAULT_SAMPLE_RATE,
};
pub use tracks::{
    choose_track, ensure_tracks, render_all, track_url, tracks_for, MoodTrack, RenderedTrack,
    AUDIO_SUBDIR, MOOD_TRACKS,
};
