//! Shared constants for end-to-end tests

/// Maximum time to wait for the server to answer its status endpoint.
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 20;

pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Side of the fixture sketches, the size of the drawing canvas.
pub const SKETCH_CANVAS_SIZE: u32 = 280;

/// Synthesized tracks the server renders at startup.
pub const MOOD_TRACK_COUNT: usize = 8;

pub const CSV_HEADER_LINE: &str =
    "id,timestamp,mood_pred,confidence,track_path,image_path,rating,relabel";
