pub mod coverage;
pub mod health;

pub use coverage::{CoverageHandler, CoverageQuery, coverage_routes};
pub use health::{AppStartTime, HealthService, health_routes};
