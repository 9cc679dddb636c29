//! Time → service window

use chrono::{DateTime, TimeZone, Timelike};
use shared::ServiceWindow;

/// First window (in configuration order) whose inclusive hour range
/// contains `hour`.
pub fn classify(windows: &[ServiceWindow], hour: u32) -> Option<&ServiceWindow> {
    windows.iter().find(|w| w.contains_hour(hour))
}

/// Classify by the local hour of `instant`
pub fn classify_instant<'a, Z: TimeZone>(
    windows: &'a [ServiceWindow],
    instant: &DateTime<Z>,
) -> Option<&'a ServiceWindow> {
    classify(windows, instant.hour())
}

/// Pairs of windows sharing at least one hour. Overlaps resolve to the
/// earlier window; callers warn about them at startup.
pub fn overlapping_windows(windows: &[ServiceWindow]) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for (i, a) in windows.iter().enumerate() {
        for b in &windows[i + 1..] {
            if a.start_hour <= b.end_hour && b.start_hour <= a.end_hour {
                pairs.push((a.name.clone(), b.name.clone()));
            }
        }
    }
    pairs
}
