use anyhow::{bail, Context, Result};
use serde_json::Value;

use crate::taxonomy::WeightType;

/// JSON pointers read by [`RebalanceConfig::from_config_json`].
pub const CONSUMED_POINTERS: &[&str] = &["/rebalance/max_search_depth", "/rebalance/iteration_limit"];

/// Search-cost knobs for one rebalance pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RebalanceConfig {
    /// Nodes deeper than this take the initial split without searching.
    pub max_search_depth: usize,
    /// Patterns tried per node.
    pub iteration_limit: u64,
}

impl Default for RebalanceConfig {
    fn default() -> Self {
        Self {
            max_search_depth: 2,
            iteration_limit: default_iteration_limit(),
        }
    }
}

/// `2^b` for the widest category fan-out `b`; enough to try every subset of
/// the widest sibling set.
pub fn default_iteration_limit() -> u64 {
    let branching = WeightType::max_branching().min(63) as u32;
    1u64 << branching
}

impl RebalanceConfig {
    /// Build from the merged config JSON.  Absent keys keep their defaults.
    pub fn from_config_json(config: &Value) -> Result<Self> {
        let mut out = Self::default();

        if let Some(v) = config.pointer("/rebalance/max_search_depth") {
            let depth = v
                .as_u64()
                .context("rebalance.max_search_depth must be a non-negative integer")?;
            out.max_search_depth =
                usize::try_from(depth).context("rebalance.max_search_depth out of range")?;
        }

        if let Some(v) = config.pointer("/rebalance/iteration_limit") {
            let limit = v
                .as_u64()
                .context("rebalance.iteration_limit must be a positive integer")?;
            if limit == 0 {
                bail!("rebalance.iteration_limit must be >= 1");
            }
            out.iteration_limit = limit;
        }

        Ok(out)
    }
}
