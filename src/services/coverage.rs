//! Server/player coverage over a trailing window of hours
//!
//! Both timelines are read for the same window and inner-joined on epoch:
//! an hour only appears in the output when both series have a sample for it.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace};

use crate::errors::PluginMetricsError;
use crate::storage::{PluginAccessor, SeaOrmStorage};
use crate::utils::{SECONDS_PER_HOUR, round_to_nearest_hour};

/// 31 days
pub const MAX_LOOKBACK_HOURS: i64 = 31 * 24;

/// Inclusive epoch range `[minimum, maximum]` queried from both timelines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimelineWindow {
    pub minimum: i64,
    pub maximum: i64,
}

impl TimelineWindow {
    /// Window ending at `now` rounded to the nearest hour, `hours` long
    pub fn for_hours(now: i64, hours: i64) -> Self {
        let base = round_to_nearest_hour(now);
        Self {
            minimum: base - hours * SECONDS_PER_HOUR,
            maximum: base,
        }
    }
}

/// One joined sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoveragePoint {
    pub epoch: i64,
    pub servers: i64,
    pub players: i64,
}

/// Request-level failures of the coverage endpoint
#[derive(Debug)]
pub enum CoverageError {
    MissingPlugin,
    InvalidPlugin,
    MissingHours,
    UnsupportedRange,
    Storage(PluginMetricsError),
}

impl CoverageError {
    /// Plain-text response body understood by existing clients
    pub fn body(&self) -> &'static str {
        match self {
            CoverageError::MissingPlugin => "ERR No plugin provided.",
            CoverageError::InvalidPlugin => "ERR Invalid plugin.",
            CoverageError::MissingHours => "ERR No amount of days provided.",
            CoverageError::UnsupportedRange => "ERR Not supported.",
            CoverageError::Storage(e) if e.is_integrity_failure() => {
                "ERR Failed to create server for GUID."
            }
            CoverageError::Storage(_) => "ERR Internal error.",
        }
    }

    /// Server-side failure rather than a rejected request
    pub fn is_internal(&self) -> bool {
        matches!(self, CoverageError::Storage(_))
    }
}

impl fmt::Display for CoverageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoverageError::Storage(e) => write!(f, "{}", e),
            other => f.write_str(other.body()),
        }
    }
}

impl std::error::Error for CoverageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CoverageError::Storage(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PluginMetricsError> for CoverageError {
    fn from(err: PluginMetricsError) -> Self {
        CoverageError::Storage(err)
    }
}

/// Parse the `hours` parameter; only a plain integer in `1..=744` is accepted
pub fn parse_hours(raw: &str) -> Result<i64, CoverageError> {
    let hours: i64 = raw
        .trim()
        .parse()
        .map_err(|_| CoverageError::UnsupportedRange)?;

    if (1..=MAX_LOOKBACK_HOURS).contains(&hours) {
        Ok(hours)
    } else {
        Err(CoverageError::UnsupportedRange)
    }
}

/// Inner join on epoch, in ascending epoch order of the server series
pub fn join_timelines(
    servers: &BTreeMap<i64, i64>,
    players: &BTreeMap<i64, i64>,
) -> Vec<CoveragePoint> {
    servers
        .iter()
        .filter_map(|(&epoch, &server_count)| {
            players.get(&epoch).map(|&player_count| CoveragePoint {
                epoch,
                servers: server_count,
                players: player_count,
            })
        })
        .collect()
}

/// Coverage lookups against the shared storage handle
pub struct CoverageService {
    storage: Arc<SeaOrmStorage>,
}

impl CoverageService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    /// Resolve the `plugin` parameter to an accessor
    pub async fn resolve_plugin(
        &self,
        plugin: Option<&str>,
    ) -> Result<PluginAccessor, CoverageError> {
        let name = plugin.ok_or(CoverageError::MissingPlugin)?;

        match self.storage.find_plugin(name).await {
            Ok(Some(accessor)) => Ok(accessor),
            Ok(None) => {
                debug!("Coverage requested for unknown plugin: {}", name);
                Err(CoverageError::InvalidPlugin)
            }
            Err(e) => {
                error!("Plugin lookup failed for {}: {}", name, e);
                Err(CoverageError::Storage(e))
            }
        }
    }

    /// Validate both parameters, then compute coverage for the window ending at `now`
    ///
    /// Parameters are checked in the order `plugin`, `hours`; the first
    /// failure decides the error.
    pub async fn handle(
        &self,
        plugin: Option<&str>,
        hours: Option<&str>,
        now: i64,
    ) -> Result<Vec<CoveragePoint>, CoverageError> {
        let accessor = self.resolve_plugin(plugin).await?;
        let hours = parse_hours(hours.ok_or(CoverageError::MissingHours)?)?;

        Self::coverage(&accessor, hours, now).await.map_err(|e| {
            error!("Coverage query failed for {}: {}", accessor.name(), e);
            CoverageError::Storage(e)
        })
    }

    /// Joined server/player timelines of one plugin for the last `hours` hours
    pub async fn coverage(
        accessor: &PluginAccessor,
        hours: i64,
        now: i64,
    ) -> Result<Vec<CoveragePoint>, PluginMetricsError> {
        let window = TimelineWindow::for_hours(now, hours);

        let servers = accessor
            .timeline_servers(window.minimum, Some(window.maximum))
            .await?;
        let players = accessor
            .timeline_players(window.minimum, Some(window.maximum))
            .await?;

        let points = join_timelines(&servers, &players);
        trace!(
            "coverage({}, {}h): {} server samples, {} player samples, {} joined",
            accessor.name(),
            hours,
            servers.len(),
            players.len(),
            points.len()
        );
        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_is_anchored_on_nearest_hour() {
        // 10:29:59 -> 10:00, 10:30:00 -> 11:00
        let ten = 1_700_000_000 - 1_700_000_000 % 3600;
        assert_eq!(
            TimelineWindow::for_hours(ten + 1_799, 1),
            TimelineWindow {
                minimum: ten - 3600,
                maximum: ten
            }
        );
        assert_eq!(
            TimelineWindow::for_hours(ten + 1_800, 1),
            TimelineWindow {
                minimum: ten,
                maximum: ten + 3600
            }
        );
    }

    #[test]
    fn test_window_length_matches_hours() {
        let now = 1_700_001_234;
        let base = round_to_nearest_hour(now);
        for hours in [1, 24, 168, MAX_LOOKBACK_HOURS] {
            let window = TimelineWindow::for_hours(now, hours);
            assert_eq!(window.maximum, base);
            assert_eq!(window.minimum, base - hours * 3600);
        }
    }

    #[test]
    fn test_parse_hours_accepts_bounds() {
        assert_eq!(parse_hours("1").unwrap(), 1);
        assert_eq!(parse_hours("744").unwrap(), 744);
        assert_eq!(parse_hours(" 24 ").unwrap(), 24);
    }

    #[test]
    fn test_parse_hours_rejects_out_of_range_and_garbage() {
        for raw in ["0", "-5", "745", "100000", "", "abc", "12abc", "1.5", "0x10"] {
            assert!(
                matches!(parse_hours(raw), Err(CoverageError::UnsupportedRange)),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_join_drops_epochs_without_players() {
        let servers = BTreeMap::from([(100, 5), (200, 7), (300, 9)]);
        let players = BTreeMap::from([(100, 20), (300, 40)]);

        assert_eq!(
            join_timelines(&servers, &players),
            vec![
                CoveragePoint {
                    epoch: 100,
                    servers: 5,
                    players: 20
                },
                CoveragePoint {
                    epoch: 300,
                    servers: 9,
                    players: 40
                },
            ]
        );
    }

    #[test]
    fn test_join_ignores_player_only_epochs() {
        let servers = BTreeMap::from([(100, 1)]);
        let players = BTreeMap::from([(50, 3), (100, 2), (150, 4)]);

        let points = join_timelines(&servers, &players);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].players, 2);
        assert!(join_timelines(&BTreeMap::new(), &players).is_empty());
    }

    #[test]
    fn test_point_serializes_in_field_order() {
        let point = CoveragePoint {
            epoch: 3600,
            servers: 2,
            players: 11,
        };
        assert_eq!(
            serde_json::to_string(&point).unwrap(),
            r#"{"epoch":3600,"servers":2,"players":11}"#
        );
    }

    #[test]
    fn test_error_bodies() {
        assert_eq!(CoverageError::MissingPlugin.body(), "ERR No plugin provided.");
        assert_eq!(CoverageError::InvalidPlugin.body(), "ERR Invalid plugin.");
        assert_eq!(
            CoverageError::MissingHours.body(),
            "ERR No amount of days provided."
        );
        assert_eq!(CoverageError::UnsupportedRange.body(), "ERR Not supported.");
        assert_eq!(
            CoverageError::from(PluginMetricsError::data_integrity("gone")).body(),
            "ERR Failed to create server for GUID."
        );
        let storage = CoverageError::from(PluginMetricsError::database_operation("timeout"));
        assert_eq!(storage.body(), "ERR Internal error.");
        assert!(storage.is_internal());
        assert!(!CoverageError::InvalidPlugin.is_internal());
    }
}
