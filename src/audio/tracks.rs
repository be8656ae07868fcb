use super::notes::*;
use super::{melody, write_wav, AudioError, DEFAULT_SAMPLE_RATE};
use crate::mood::MoodLabel;
use rand::{seq::IndexedRandom, Rng};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

/// Directory under the static root holding the synthesized tracks.
pub const AUDIO_SUBDIR: &str = "audio";

const STATIC_URL_PREFIX: &str = "static";

#[derive(Debug)]
pub struct MoodTrack {
    pub mood: MoodLabel,
    pub name: &'static str,
    pub notes: &'static [f64],
    pub note_duration_secs: f64,
}

impl MoodTrack {
    pub fn file_name(&self) -> String {
        format!("{}.wav", self.name)
    }

    /// Path recorded in history entries, relative to the server root.
    pub fn stored_path(&self) -> String {
        format!("{}/{}/{}", STATIC_URL_PREFIX, AUDIO_SUBDIR, self.file_name())
    }

    pub fn render(&self) -> Vec<i16> {
        melody(self.notes, self.note_duration_secs, DEFAULT_SAMPLE_RATE)
    }
}

pub const MOOD_TRACKS: &[MoodTrack] = &[
    MoodTrack {
        mood: MoodLabel::Happy,
        name: "happy1",
        notes: &[C4, E4, G4, C5, G4, E4, C4],
        note_duration_secs: 0.4,
    },
    MoodTrack {
        mood: MoodLabel::Happy,
        name: "happy2",
        notes: &[G4, A4, B4, C5, B4, A4, G4],
        note_duration_secs: 0.4,
    },
    MoodTrack {
        mood: MoodLabel::Calm,
        name: "calm1",
        notes: &[C4, F4, A4, C5, A4, F4],
        note_duration_secs: 0.8,
    },
    MoodTrack {
        mood: MoodLabel::Calm,
        name: "calm2",
        notes: &[F4, A4, C5, E5, C5, A4],
        note_duration_secs: 0.8,
    },
    MoodTrack {
        mood: MoodLabel::Sad,
        name: "sad1",
        notes: &[A4, F4, D4, A4, F4, D4],
        note_duration_secs: 0.7,
    },
    MoodTrack {
        mood: MoodLabel::Sad,
        name: "sad2",
        notes: &[D4, F4, A4, D5, A4, F4],
        note_duration_secs: 0.7,
    },
    MoodTrack {
        mood: MoodLabel::Energetic,
        name: "energetic1",
        notes: &[G4, G4, D5, D5, E5, D5, B4],
        note_duration_secs: 0.3,
    },
    MoodTrack {
        mood: MoodLabel::Energetic,
        name: "energetic2",
        notes: &[C5, G4, C5, G4, D5, C5, G4],
        note_duration_secs: 0.3,
    },
];

pub fn tracks_for(mood: MoodLabel) -> impl Iterator<Item = &'static MoodTrack> {
    MOOD_TRACKS.iter().filter(move |track| track.mood == mood)
}

pub fn choose_track<R: Rng + ?Sized>(mood: MoodLabel, rng: &mut R) -> Option<&'static MoodTrack> {
    let candidates: Vec<&'static MoodTrack> = tracks_for(mood).collect();
    candidates.choose(rng).copied()
}

/// Public URL of a stored track path.
pub fn track_url(stored_path: &str) -> String {
    format!("/{}", stored_path)
}

#[derive(Debug, Clone)]
pub struct RenderedTrack {
    pub path: PathBuf,
    pub size_bytes: u64,
}

fn render_track(track: &MoodTrack, audio_dir: &Path) -> Result<RenderedTrack, AudioError> {
    let path = audio_dir.join(track.file_name());
    write_wav(&path, &track.render(), DEFAULT_SAMPLE_RATE)?;
    let size_bytes = fs::metadata(&path)?.len();
    debug!("Rendered {:?} ({} bytes)", path, size_bytes);
    Ok(RenderedTrack { path, size_bytes })
}

pub fn render_all(audio_dir: &Path) -> Result<Vec<RenderedTrack>, AudioError> {
    fs::create_dir_all(audio_dir)?;
    MOOD_TRACKS
        .iter()
        .map(|track| render_track(track, audio_dir))
        .collect()
}

/// Renders only the tracks whose file is missing and returns how many were written.
pub fn ensure_tracks(audio_dir: &Path) -> Result<usize, AudioError> {
    fs::create_dir_all(audio_dir)?;
    let mut rendered = 0;
    for track in MOOD_TRACKS {
        if audio_dir.join(track.file_name()).exists() {
            continue;
        }
        render_track(track, audio_dir)?;
        rendered += 1;
    }
    if rendered > 0 {
        info!("Synthesized {} missing tracks in {:?}", rendered, audio_dir);
    }
    Ok(rendered)
}
