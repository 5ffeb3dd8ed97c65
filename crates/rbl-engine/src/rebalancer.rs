//! Per-account driver.

use rbl_currency::Currency;
use tracing::{info, info_span, warn};

use crate::config::RebalanceConfig;
use crate::context::{AccountKey, RebalanceContext};
use crate::node::{AuditMismatch, RebalanceNode};

/// Result of one account's pass.
#[derive(Clone, Debug, PartialEq)]
pub struct RebalanceOutcome {
    pub account: AccountKey,
    /// What could not be placed anywhere in the tree.
    pub residual: Currency,
    pub proposed_total: Currency,
    /// Set when a subtree fell back to pass-through or a receiver refused.
    pub problem: bool,
    pub rejected: Vec<String>,
    pub trials: u64,
    pub audit_mismatches: Vec<AuditMismatch>,
}

impl RebalanceOutcome {
    pub fn is_ok(&self) -> bool {
        !self.problem
    }
}

/// One account's tree and target for [`Rebalancer::rebalance_all`].
pub struct AccountJob<'a> {
    pub account: AccountKey,
    pub root: RebalanceNode<'a>,
    pub target: Currency,
    pub relative: bool,
}

#[derive(Clone, Debug, Default)]
pub struct Rebalancer {
    config: RebalanceConfig,
}

impl Rebalancer {
    pub fn new(config: RebalanceConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RebalanceConfig {
        &self.config
    }

    pub fn rebalance(
        &self,
        account: AccountKey,
        root: &mut RebalanceNode<'_>,
        target: Currency,
        is_relative: bool,
    ) -> RebalanceOutcome {
        let span = info_span!("rebalance", account = %account);
        let _guard = span.enter();
        info!(target_value = %target, relative = is_relative, "rebalance/start");

        root.refresh_values();
        let mut ctx = RebalanceContext::new(account, &self.config);
        let residual = root.set_proposed(target, is_relative, &mut ctx);

        let mut audit_mismatches = Vec::new();
        root.audit(&mut audit_mismatches);
        for m in &audit_mismatches {
            warn!(
                category = %m.category,
                depth = m.depth,
                value = %m.value,
                below = %m.below,
                "rebalance/audit_mismatch"
            );
        }
        let leaked = root.live_snapshots();
        if leaked > 0 {
            warn!(leaked, "rebalance/snapshots_leaked");
        }

        let outcome = RebalanceOutcome {
            account: ctx.account().clone(),
            residual,
            proposed_total: root.proposed(),
            problem: ctx.has_problem(),
            rejected: ctx.rejected().map(str::to_string).collect(),
            trials: ctx.trials(),
            audit_mismatches,
        };
        info!(
            residual = %outcome.residual,
            proposed = %outcome.proposed_total,
            problem = outcome.problem,
            trials = outcome.trials,
            "rebalance/done"
        );
        outcome
    }

    /// Accounts run one after another; each gets its own context.
    pub fn rebalance_all<'a, I>(&self, jobs: I) -> Vec<RebalanceOutcome>
    where
        I: IntoIterator<Item = AccountJob<'a>>,
    {
        jobs.into_iter()
            .map(|mut job| self.rebalance(job.account, &mut job.root, job.target, job.relative))
            .collect()
    }
}
