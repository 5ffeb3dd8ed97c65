use rbl_engine::{
    Currency, Holding, RebalanceConfig, Rebalancer, Receiver, Rejection, TreeBuilder, WeightMap,
    WeightType,
};

use WeightType::*;

fn c(cents: i64) -> Currency {
    Currency::from_cents(cents)
}

/// Holds whatever it is given by raw write but refuses every offer.
struct Closed {
    proposed: Currency,
}

impl Receiver for Closed {
    fn key(&self) -> &str {
        "CLOSED"
    }
    fn weight(&self) -> f64 {
        1.0
    }
    fn current(&self) -> Currency {
        Currency::ZERO
    }
    fn proposed(&self) -> Currency {
        self.proposed
    }
    fn set_proposed(&mut self, value: Currency) {
        self.proposed = value;
    }
    fn offer(&mut self, _value: Currency) -> Result<Currency, Rejection> {
        Err(Rejection("market closed".into()))
    }
}

#[test]
fn scenario_search_routes_around_rejecting_receiver() {
    let mut open = Holding::new("OPEN", 1.0, Currency::ZERO);
    let mut closed = Closed {
        proposed: Currency::ZERO,
    };

    let (outcome, leaked) = {
        let mut builder = TreeBuilder::new(None);
        builder.place(&[], &mut open).unwrap();
        builder.place(&[], &mut closed).unwrap();
        let mut root = builder.finish();
        let outcome = Rebalancer::default().rebalance("acct".into(), &mut root, c(10_000), false);
        (outcome, root.live_snapshots())
    };

    // The pass terminates, places everything with the open holding and
    // still reports the refusal.
    assert_eq!(outcome.residual, Currency::ZERO);
    assert_eq!(open.proposed, c(10_000));
    assert_eq!(closed.proposed, Currency::ZERO);
    assert!(outcome.problem);
    assert_eq!(outcome.rejected, vec!["CLOSED".to_string()]);
    assert_eq!(leaked, 0);
    // 11, then 10 places everything, then 01 closes out that level.
    assert_eq!(outcome.trials, 3);
}

#[test]
fn scenario_iteration_limit_bounds_trials() {
    let mut closed: Vec<Closed> = (0..6)
        .map(|_| Closed {
            proposed: Currency::ZERO,
        })
        .collect();

    let outcome = {
        let mut builder = TreeBuilder::new(None);
        for r in closed.iter_mut() {
            builder.place(&[], r).unwrap();
        }
        let mut root = builder.finish();
        let cfg = RebalanceConfig {
            max_search_depth: 2,
            iteration_limit: 5,
        };
        Rebalancer::new(cfg).rebalance("acct".into(), &mut root, c(600), false)
    };

    assert!(outcome.problem);
    assert_eq!(outcome.residual, c(600));
    assert_eq!(outcome.trials, 5);
}

fn two_lot_tree<'a>(vti: &'a mut Holding, vxus: &'a mut Holding) -> rbl_engine::RebalanceNode<'a> {
    let weights: WeightMap = [(Stock, 1.0)].into_iter().collect();
    let mut builder = TreeBuilder::new(Some(weights));
    builder.place(&[Stock, StockDomestic], vti).unwrap();
    builder.place(&[Stock, StockForeign], vxus).unwrap();
    builder.finish()
}

#[test]
fn scenario_whole_lots_find_zero_residual_subset() {
    // 120.00 over two 40.00-lot holdings: the even split strands 20.00 with
    // each.  Sending both leftovers to one holding buys another lot.
    let mut vti = Holding::new("VTI", 1.0, Currency::ZERO).with_lot(c(4_000));
    let mut vxus = Holding::new("VXUS", 1.0, Currency::ZERO).with_lot(c(4_000));

    let outcome = {
        let mut root = two_lot_tree(&mut vti, &mut vxus);
        let outcome = Rebalancer::default().rebalance("acct".into(), &mut root, c(12_000), false);
        assert_eq!(root.live_snapshots(), 0);
        outcome
    };

    assert_eq!(outcome.residual, Currency::ZERO);
    assert!(!outcome.problem);
    assert!(outcome.audit_mismatches.is_empty());
    assert_eq!(vti.proposed, c(8_000));
    assert_eq!(vxus.proposed, c(4_000));
}

#[test]
fn scenario_depth_gate_keeps_initial_split() {
    let mut vti = Holding::new("VTI", 1.0, Currency::ZERO).with_lot(c(4_000));
    let mut vxus = Holding::new("VXUS", 1.0, Currency::ZERO).with_lot(c(4_000));

    let outcome = {
        let mut root = two_lot_tree(&mut vti, &mut vxus);
        let cfg = RebalanceConfig {
            max_search_depth: 0,
            ..RebalanceConfig::default()
        };
        Rebalancer::new(cfg).rebalance("acct".into(), &mut root, c(12_000), false)
    };

    assert_eq!(outcome.residual, c(4_000));
    assert_eq!(vti.proposed, c(4_000));
    assert_eq!(vxus.proposed, c(4_000));
    // A stranded residual is not a problem.
    assert!(!outcome.problem);
}

#[test]
fn scenario_equal_residuals_prefer_lower_deviation() {
    // 15.00 over one plain and two 10.00-lot holdings: each is due 5.00, so
    // 10.00 is left over after the even split.  Giving all of it to CASH or
    // one full lot to VTI both place everything; the lot is closer to the
    // even split and wins.
    let mut cash = Holding::new("CASH", 1.0, Currency::ZERO);
    let mut vti = Holding::new("VTI", 1.0, Currency::ZERO).with_lot(c(1_000));
    let mut vxus = Holding::new("VXUS", 1.0, Currency::ZERO).with_lot(c(1_000));

    let outcome = {
        let mut builder = TreeBuilder::new(None);
        builder.place(&[], &mut cash).unwrap();
        builder.place(&[], &mut vti).unwrap();
        builder.place(&[], &mut vxus).unwrap();
        let mut root = builder.finish();
        let outcome = Rebalancer::default().rebalance("acct".into(), &mut root, c(1_500), false);
        assert_eq!(root.live_snapshots(), 0);
        outcome
    };

    assert_eq!(outcome.residual, Currency::ZERO);
    assert!(!outcome.problem);
    assert_eq!(outcome.trials, 7);
    assert_eq!(cash.proposed, c(500));
    assert_eq!(vti.proposed, c(1_000));
    assert_eq!(vxus.proposed, Currency::ZERO);
}
