use super::HistoryEntry;
use anyhow::{anyhow, Result};
use csv::{Terminator, WriterBuilder};

pub const CSV_HEADER: [&str; 8] = [
    "id",
    "timestamp",
    "mood_pred",
    "confidence",
    "track_path",
    "image_path",
    "rating",
    "relabel",
];

/// Renders entries, in the order given, as a CSV document with a header row.
pub fn export_csv(entries: &[HistoryEntry]) -> Result<Vec<u8>> {
    let mut writer = WriterBuilder::new()
        .terminator(Terminator::CRLF)
        .from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;
    for entry in entries {
        writer.write_record([
            entry.id.to_string(),
            entry.timestamp_iso(),
            entry.mood_pred.to_string(),
            entry.confidence.to_string(),
            entry.track_path.clone(),
            entry.image_path.clone(),
            entry.rating.map(|r| r.to_string()).unwrap_or_default(),
            entry.relabel.clone().unwrap_or_default(),
        ])?;
    }
    writer
        .into_inner()
        .map_err(|err| anyhow!("Failed to flush CSV export: {}", err.error()))
}
