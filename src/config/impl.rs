use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;

use super::StaticConfig;
use crate::errors::Result;

static CONFIG: OnceLock<ArcSwap<StaticConfig>> = OnceLock::new();

/// Get the global configuration instance
///
/// Panics if `init_config_from` has not succeeded yet.
pub fn get_config() -> Arc<StaticConfig> {
    CONFIG
        .get()
        .expect("Config not initialized. Call init_config_from() first.")
        .load_full()
}

/// Load and install the global configuration from `path` (default "config.toml") + environment
///
/// Later calls are no-ops; the first loaded configuration wins.
pub fn init_config_from(path: Option<&str>) -> Result<()> {
    if CONFIG.get().is_some() {
        return Ok(());
    }
    let config = StaticConfig::load(path)?;
    let _ = CONFIG.set(ArcSwap::from_pointee(config));
    Ok(())
}
