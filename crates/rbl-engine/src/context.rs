//! Per-pass state threaded explicitly through the tree.

use std::collections::BTreeSet;
use std::fmt;

use crate::config::RebalanceConfig;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AccountKey(pub String);

impl AccountKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for AccountKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Names one snapshot across every delegate of a pass.  Never reused within
/// a pass.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnapshotToken(u64);

impl SnapshotToken {
    pub fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
pub struct RebalanceContext<'c> {
    account: AccountKey,
    config: &'c RebalanceConfig,
    next_token: u64,
    problem: bool,
    rejected: BTreeSet<String>,
    trials: u64,
}

impl<'c> RebalanceContext<'c> {
    pub fn new(account: AccountKey, config: &'c RebalanceConfig) -> Self {
        Self {
            account,
            config,
            next_token: 0,
            problem: false,
            rejected: BTreeSet::new(),
            trials: 0,
        }
    }

    pub fn account(&self) -> &AccountKey {
        &self.account
    }

    pub fn config(&self) -> &RebalanceConfig {
        self.config
    }

    pub fn next_token(&mut self) -> SnapshotToken {
        let token = SnapshotToken(self.next_token);
        self.next_token += 1;
        token
    }

    pub fn tokens_issued(&self) -> u64 {
        self.next_token
    }

    pub fn flag_problem(&mut self) {
        self.problem = true;
    }

    pub fn has_problem(&self) -> bool {
        self.problem
    }

    /// Record a refused offer.  A refusal always flags the account.
    pub fn record_rejection(&mut self, key: &str) {
        self.problem = true;
        self.rejected.insert(key.to_string());
    }

    pub fn rejected(&self) -> impl Iterator<Item = &str> {
        self.rejected.iter().map(String::as_str)
    }

    pub fn count_trial(&mut self) {
        self.trials += 1;
    }

    pub fn trials(&self) -> u64 {
        self.trials
    }
}
