//! Unix-epoch helpers shared by storage and services

use chrono::{DateTime, Utc};

pub const SECONDS_PER_HOUR: i64 = 60 * 60;

/// Current Unix timestamp in seconds
pub fn unix_now() -> i64 {
    Utc::now().timestamp()
}

/// Round to the closest hour boundary; exactly half past rounds up
/// (negative inputs round half away from zero)
pub fn round_to_nearest_hour(epoch: i64) -> i64 {
    let half = SECONDS_PER_HOUR / 2;
    let rem = epoch.rem_euclid(SECONDS_PER_HOUR);
    let floor = epoch - rem;
    if rem > half || (rem == half && epoch >= 0) {
        floor + SECONDS_PER_HOUR
    } else {
        floor
    }
}

/// Human-readable uptime, e.g. "3d 4h" or "12m"
pub fn format_uptime(from: DateTime<Utc>, to: DateTime<Utc>) -> String {
    let secs = to.signed_duration_since(from).num_seconds().max(0);

    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3_600;
    let minutes = (secs % 3_600) / 60;

    match (days, hours, minutes) {
        (d, 0, _) if d > 0 => format!("{}d", d),
        (d, h, _) if d > 0 => format!("{}d {}h", d, h),
        (_, h, 0) if h > 0 => format!("{}h", h),
        (_, h, m) if h > 0 => format!("{}h {}m", h, m),
        (_, _, m) if m > 0 => format!("{}m", m),
        _ => format!("{}s", secs),
    }
}
