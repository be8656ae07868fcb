use crate::mood::MoodLabel;
use chrono::{DateTime, Timelike, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub id: i64,
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub mood_pred: MoodLabel,
    pub confidence: f64,
    pub track_path: String,
    pub image_path: String,
    pub rating: Option<i64>,
    pub relabel: Option<String>,
}

impl HistoryEntry {
    pub fn timestamp_iso(&self) -> String {
        format_timestamp(&self.timestamp)
    }
}

/// ISO-8601 without offset. The fraction is omitted when it is zero.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    if timestamp.nanosecond() == 0 {
        timestamp.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        timestamp.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}

fn serialize_timestamp<S: Serializer>(
    timestamp: &DateTime<Utc>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_timestamp(timestamp))
}

#[derive(Debug, Clone)]
pub struct NewHistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub mood_pred: MoodLabel,
    pub confidence: f64,
    pub track_path: String,
    pub image_path: String,
}

impl NewHistoryEntry {
    pub fn new(
        mood_pred: MoodLabel,
        confidence: f64,
        track_path: impl Into<String>,
        image_path: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            mood_pred,
            confidence,
            track_path: track_path.into(),
            image_path: image_path.into(),
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Feedback fields to apply to an entry. `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedbackUpdate {
    pub rating: Option<i64>,
    pub relabel: Option<String>,
}

impl FeedbackUpdate {
    /// Lenient interpretation of request fields: anything that is not an
    /// integer-like rating or a non-empty relabel string is ignored.
    pub fn from_json(rating: Option<&Value>, relabel: Option<&Value>) -> Self {
        Self {
            rating: rating.and_then(parse_rating),
            relabel: relabel
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rating.is_none() && self.relabel.is_none()
    }
}

fn parse_rating(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                .map(|f| f.trunc() as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(*b as i64),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    OldestFirst,
    NewestFirst,
}
