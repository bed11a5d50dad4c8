pub mod time;

pub use time::{SECONDS_PER_HOUR, format_uptime, round_to_nearest_hour, unix_now};
