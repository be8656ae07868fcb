use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoodLabel {
    Happy,
    Calm,
    Sad,
    Energetic,
}

impl MoodLabel {
    /// Canonical class order, shared with trained models.
    pub const ALL: [MoodLabel; 4] = [
        MoodLabel::Happy,
        MoodLabel::Calm,
        MoodLabel::Sad,
        MoodLabel::Energetic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MoodLabel::Happy => "happy",
            MoodLabel::Calm => "calm",
            MoodLabel::Sad => "sad",
            MoodLabel::Energetic => "energetic",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            MoodLabel::Happy => 0,
            MoodLabel::Calm => 1,
            MoodLabel::Sad => 2,
            MoodLabel::Energetic => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for MoodLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("Unknown mood label: {0}")]
pub struct UnknownMoodLabel(pub String);

impl FromStr for MoodLabel {
    type Err = UnknownMoodLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        MoodLabel::ALL
            .into_iter()
            .find(|mood| mood.as_str() == lowered)
            .ok_or_else(|| UnknownMoodLabel(s.to_string()))
    }
}

impl ToSql for MoodLabel {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for MoodLabel {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|err| FromSqlError::Other(Box::new(err)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    pub mood: MoodLabel,
    pub confidence: f64,
}

/// Per-mood counters indexed in canonical order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoodCounts([usize; 4]);

impl MoodCounts {
    pub fn get(&self, mood: MoodLabel) -> usize {
        self.0[mood.index()]
    }

    pub fn increment(&mut self, mood: MoodLabel) {
        self.0[mood.index()] += 1;
    }

    pub fn set(&mut self, mood: MoodLabel, count: usize) {
        self.0[mood.index()] = count;
    }

    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MoodLabel, usize)> + '_ {
        MoodLabel::ALL.into_iter().map(|mood| (mood, self.get(mood)))
    }
}
