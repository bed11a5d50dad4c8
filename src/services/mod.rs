//! Business logic shared by the HTTP handlers and tests

pub mod coverage;

pub use coverage::{
    CoverageError, CoveragePoint, CoverageService, MAX_LOOKBACK_HOURS, TimelineWindow,
    join_timelines, parse_hours,
};
