//! `rbl allocate`: read accounts YAML, rebalance each account, print
//! proposed values.

use std::fs;

use anyhow::{anyhow, Context, Result};
use rbl_currency::Currency;
use rbl_engine::{
    AccountKey, Holding, RebalanceConfig, Rebalancer, TreeBuilder, WeightMap, WeightType,
};
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Deserialize)]
pub struct AccountsFile {
    pub accounts: Vec<AccountEntry>,
}

#[derive(Debug, Deserialize)]
pub struct AccountEntry {
    pub account: String,
    pub target: Amount,
    #[serde(default)]
    pub relative: bool,
    #[serde(default)]
    pub weights: Option<WeightMap>,
    pub holdings: Vec<HoldingEntry>,
}

#[derive(Debug, Deserialize)]
pub struct HoldingEntry {
    pub ticker: String,
    #[serde(default)]
    pub path: Vec<WeightType>,
    #[serde(default = "default_holding_weight")]
    pub weight: f64,
    #[serde(default)]
    pub current: Option<Amount>,
    #[serde(default)]
    pub lot: Option<Amount>,
}

fn default_holding_weight() -> f64 {
    1.0
}

/// `"1,250.00"`, `"$12"` or a bare YAML number.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Text(String),
    Number(f64),
}

impl Amount {
    pub fn to_currency(&self) -> Result<Currency> {
        match self {
            Amount::Text(s) => s
                .parse::<Currency>()
                .with_context(|| format!("invalid amount '{s}'")),
            Amount::Number(n) => {
                Currency::try_from_dollars(*n).ok_or_else(|| anyhow!("amount {n} is out of range"))
            }
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Summary {
    pub accounts: usize,
    pub problems: usize,
}

pub fn parse_accounts(raw: &str) -> Result<AccountsFile> {
    serde_yaml::from_str(raw).context("invalid accounts yaml")
}

pub fn run(config: &RebalanceConfig, accounts_path: &str) -> Result<Summary> {
    let raw = fs::read_to_string(accounts_path)
        .with_context(|| format!("failed to read accounts file: {accounts_path}"))?;
    let file = parse_accounts(&raw)?;

    let rebalancer = Rebalancer::new(config.clone());
    let mut summary = Summary::default();
    for entry in &file.accounts {
        summary.accounts += 1;
        match allocate_account(&rebalancer, entry) {
            Ok(true) => {}
            Ok(false) => summary.problems += 1,
            Err(err) => {
                warn!(account = %entry.account, error = %format!("{err:#}"), "allocate/skipped");
                println!("account={} error={:#}", entry.account, err);
                summary.problems += 1;
            }
        }
    }
    Ok(summary)
}

fn build_holdings(entry: &AccountEntry) -> Result<Vec<Holding>> {
    entry.holdings
        .iter()
        .map(|h| -> Result<Holding> {
            let current = match &h.current {
                Some(a) => a
                    .to_currency()
                    .with_context(|| format!("{}: bad current value", h.ticker))?,
                None => Currency::ZERO,
            };
            let mut holding = Holding::new(h.ticker.clone(), h.weight, current);
            // Relative targets land on top of what is held today.
            holding.proposed = current;
            if let Some(lot) = &h.lot {
                holding = holding.with_lot(
                    lot.to_currency()
                        .with_context(|| format!("{}: bad lot value", h.ticker))?,
                );
            }
            Ok(holding)
        })
        .collect()
}

/// Returns `Ok(false)` when the account rebalanced with a problem.
fn allocate_account(rebalancer: &Rebalancer, entry: &AccountEntry) -> Result<bool> {
    let target = entry
        .target
        .to_currency()
        .with_context(|| format!("account {}: bad target", entry.account))?;
    let mut holdings = build_holdings(entry)?;

    let outcome = {
        let mut builder = TreeBuilder::new(entry.weights.clone());
        for (holding, h) in holdings.iter_mut().zip(&entry.holdings) {
            builder
                .place(&h.path, holding)
                .with_context(|| format!("{}: bad category path", h.ticker))?;
        }
        let mut root = builder.finish();
        rebalancer.rebalance(
            AccountKey::from(entry.account.as_str()),
            &mut root,
            target,
            entry.relative,
        )
    };

    for h in &holdings {
        println!(
            "account={} ticker={} current={} proposed={}",
            entry.account, h.ticker, h.current, h.proposed
        );
    }
    println!(
        "account={} residual={} problem={} trials={}",
        entry.account, outcome.residual, outcome.problem, outcome.trials
    );
    if !outcome.rejected.is_empty() {
        println!("account={} rejected={}", entry.account, outcome.rejected.join(","));
    }
    Ok(outcome.is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCOUNTS: &str = r#"
accounts:
  - account: IRA
    target: "1,200.00"
    weights:
      stock: 3
      bond: 1
    holdings:
      - ticker: VTI
        path: [stock]
      - ticker: BND
        path: [bond]
        current: 50
        lot: "25.00"
"#;

    #[test]
    fn accounts_yaml_parses_with_defaults() {
        let file = parse_accounts(ACCOUNTS).unwrap();
        let ira = &file.accounts[0];
        assert!(!ira.relative);
        assert_eq!(ira.target.to_currency().unwrap(), Currency::from_whole(1_200));
        assert_eq!(ira.weights.as_ref().unwrap()[&WeightType::Stock], 3.0);
        assert_eq!(ira.holdings[0].weight, 1.0);
        assert_eq!(ira.holdings[1].path, vec![WeightType::Bond]);
    }

    #[test]
    fn holdings_start_from_current() {
        let file = parse_accounts(ACCOUNTS).unwrap();
        let holdings = build_holdings(&file.accounts[0]).unwrap();
        assert_eq!(holdings[1].current, Currency::from_whole(50));
        assert_eq!(holdings[1].proposed, Currency::from_whole(50));
        assert_eq!(holdings[1].lot, Some(Currency::from_whole(25)));
    }

    #[test]
    fn account_allocates_by_category_weight() {
        let file = parse_accounts(ACCOUNTS).unwrap();
        let ok = allocate_account(&Rebalancer::default(), &file.accounts[0]).unwrap();
        assert!(ok);
    }

    #[test]
    fn bad_path_is_an_error() {
        let file = parse_accounts(
            r#"
accounts:
  - account: X
    target: 10
    holdings:
      - ticker: Q
        path: [stock, bond_high]
"#,
        )
        .unwrap();
        let err = allocate_account(&Rebalancer::default(), &file.accounts[0]).unwrap_err();
        assert!(format!("{err:#}").contains("does not roll up"));
    }

    #[test]
    fn unknown_category_fails_to_parse() {
        assert!(parse_accounts(
            "accounts:\n  - account: X\n    target: 1\n    holdings:\n      - ticker: Q\n        path: [crypto]\n"
        )
        .is_err());
    }
}
