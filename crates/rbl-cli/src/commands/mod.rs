//! Command handler modules for rbl-cli.
//!
//! Shared utilities used by multiple command paths live here.

pub mod allocate;

use anyhow::{Context, Result};
use rbl_config::{report_unused_keys, UnusedKeyPolicy};
use rbl_engine::{RebalanceConfig, CONSUMED_POINTERS};
use tracing::{info, warn};

/// Merge the config layers and map them onto engine settings.  No layers
/// means engine defaults.
pub fn load_rebalance_config(paths: &[String], strict: bool) -> Result<RebalanceConfig> {
    if paths.is_empty() {
        return Ok(RebalanceConfig::default());
    }

    let path_refs: Vec<&str> = paths.iter().map(String::as_str).collect();
    let loaded = rbl_config::load_layered_yaml(&path_refs)?;
    info!(config_hash = %loaded.config_hash, "config/loaded");

    let policy = if strict {
        UnusedKeyPolicy::Fail
    } else {
        UnusedKeyPolicy::Warn
    };
    let report = report_unused_keys(&loaded.config_json, CONSUMED_POINTERS, policy)?;
    for pointer in &report.unused_leaf_pointers {
        warn!(pointer = %pointer, "config/unused_key");
    }

    RebalanceConfig::from_config_json(&loaded.config_json).context("invalid rebalance config")
}
