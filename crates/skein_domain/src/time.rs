use std::time::{SystemTime, UNIX_EPOCH};

pub(crate) fn now_unix_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|d| u64::try_from(d.as_millis()).ok())
        .unwrap_or(0)
}

/// Source payloads carry seconds-since-epoch; absent or non-positive values
/// fall back to the processing time.
pub(crate) fn unix_ms_from_create_time(create_time: Option<f64>, now_unix_ms: u64) -> u64 {
    match create_time {
        Some(seconds) if seconds > 0.0 => (seconds * 1000.0) as u64,
        _ => now_unix_ms,
    }
}
