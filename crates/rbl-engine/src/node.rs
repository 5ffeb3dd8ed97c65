//! Allocation tree node and the per-node search.
//!
//! A node splits the amount it is handed across its active participants in
//! proportion to their weights.  Whatever the participants cannot absorb
//! (whole-lot truncation, refusals, deeper residuals) comes back as a
//! residual.  When the residual is non-zero and the node is shallow enough,
//! the node tries to place it again over subsets of its participants and
//! keeps the best-scoring attempt.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use rbl_currency::Currency;
use tracing::{debug, trace, warn};

use crate::context::{RebalanceContext, SnapshotToken};
use crate::error::AllocationError;
use crate::participant::{
    considered_weights, discard_snapshots, distribute, restore_snapshots, sum_current,
    sum_proposed, take_snapshots, Participant, TickerDelegate,
};
use crate::patterns::Patterns;
use crate::reallocator::Reallocator;
use crate::receiver::Receiver;
use crate::score::{DeviationTracker, ReallocationScore};
use crate::taxonomy::WeightType;

/// Node value that disagrees with the sum of what hangs below it.
#[derive(Clone, Debug, PartialEq)]
pub struct AuditMismatch {
    pub category: WeightType,
    pub depth: usize,
    pub value: Currency,
    pub below: Currency,
}

#[derive(Debug)]
pub struct RebalanceNode<'a> {
    category: WeightType,
    depth: usize,
    weight: f64,
    children: BTreeMap<WeightType, RebalanceNode<'a>>,
    leaves: Vec<TickerDelegate<'a>>,
    value: Currency,
    considered: bool,
    snapshots: BTreeMap<SnapshotToken, Currency>,
}

impl<'a> RebalanceNode<'a> {
    pub fn new(category: WeightType, weight: f64) -> Self {
        Self {
            category,
            depth: 0,
            weight,
            children: BTreeMap::new(),
            leaves: Vec::new(),
            value: Currency::ZERO,
            considered: true,
            snapshots: BTreeMap::new(),
        }
    }

    /// Top of an account's tree.
    pub fn root() -> Self {
        Self::new(WeightType::All, 1.0)
    }

    pub fn category(&self) -> WeightType {
        self.category
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Value as of the last commit.
    pub fn value(&self) -> Currency {
        self.value
    }

    pub fn is_considered(&self) -> bool {
        self.considered
    }

    pub fn set_considered(&mut self, considered: bool) {
        self.considered = considered;
    }

    /// Attach `child` under its category, keeping any existing child there.
    pub fn add_child(&mut self, mut child: RebalanceNode<'a>) -> &mut RebalanceNode<'a> {
        child.set_depth(self.depth + 1);
        self.children.entry(child.category).or_insert(child)
    }

    pub fn child(&self, category: WeightType) -> Option<&RebalanceNode<'a>> {
        self.children.get(&category)
    }

    pub fn child_mut(&mut self, category: WeightType) -> Option<&mut RebalanceNode<'a>> {
        self.children.get_mut(&category)
    }

    pub fn children(&self) -> impl Iterator<Item = &RebalanceNode<'a>> {
        self.children.values()
    }

    pub fn add_leaf(&mut self, receiver: &'a mut dyn Receiver) {
        self.leaves.push(TickerDelegate::new(receiver));
    }

    pub fn leaves(&self) -> &[TickerDelegate<'a>] {
        &self.leaves
    }

    fn set_depth(&mut self, depth: usize) {
        self.depth = depth;
        for child in self.children.values_mut() {
            child.set_depth(depth + 1);
        }
    }

    /// Sum of current values over the whole subtree.
    pub fn current(&self) -> Currency {
        let below: Currency = self.children.values().map(RebalanceNode::current).sum();
        below + self.leaves.iter().map(TickerDelegate::current).sum::<Currency>()
    }

    /// Sum of proposed values over the whole subtree, read from the leaves.
    pub fn proposed(&self) -> Currency {
        let below: Currency = self.children.values().map(RebalanceNode::proposed).sum();
        below + self.leaves.iter().map(TickerDelegate::proposed).sum::<Currency>()
    }

    fn recompute_value(&mut self) {
        let below: Currency = self.children.values().map(|c| c.value).sum();
        self.value = below + self.leaves.iter().map(TickerDelegate::proposed).sum::<Currency>();
    }

    /// Recompute every cached value bottom-up.
    pub fn refresh_values(&mut self) {
        for child in self.children.values_mut() {
            child.refresh_values();
        }
        self.recompute_value();
    }

    pub fn take_snapshot(&mut self, token: SnapshotToken) {
        self.snapshots.insert(token, self.value);
        for child in self.children.values_mut() {
            child.take_snapshot(token);
        }
        for leaf in &mut self.leaves {
            leaf.take_snapshot(token);
        }
    }

    pub fn restore_snapshot(&mut self, token: SnapshotToken) {
        if let Some(value) = self.snapshots.get(&token).copied() {
            self.value = value;
        }
        for child in self.children.values_mut() {
            child.restore_snapshot(token);
        }
        for leaf in &mut self.leaves {
            leaf.restore_snapshot(token);
        }
    }

    pub fn discard_snapshot(&mut self, token: SnapshotToken) {
        self.snapshots.remove(&token);
        for child in self.children.values_mut() {
            child.discard_snapshot(token);
        }
        for leaf in &mut self.leaves {
            leaf.discard_snapshot(token);
        }
    }

    /// Live snapshots held anywhere in the subtree.
    pub fn live_snapshots(&self) -> usize {
        self.snapshots.len()
            + self.children.values().map(RebalanceNode::live_snapshots).sum::<usize>()
            + self.leaves.iter().map(TickerDelegate::live_snapshots).sum::<usize>()
    }

    /// Every leaf below keeps its current value.
    pub fn pass_through(&mut self) {
        for child in self.children.values_mut() {
            child.pass_through();
        }
        for leaf in &mut self.leaves {
            leaf.pass_through();
        }
        self.recompute_value();
    }

    fn zero_out(&mut self) {
        for child in self.children.values_mut() {
            child.zero_out();
        }
        for leaf in &mut self.leaves {
            leaf.set_raw(Currency::ZERO);
        }
        self.value = Currency::ZERO;
    }

    /// Collect nodes whose cached value is not the sum of their children and
    /// leaves.
    pub fn audit(&self, out: &mut Vec<AuditMismatch>) {
        let below: Currency = self.children.values().map(|c| c.value).sum::<Currency>()
            + self.leaves.iter().map(TickerDelegate::proposed).sum::<Currency>();
        if below != self.value {
            out.push(AuditMismatch {
                category: self.category,
                depth: self.depth,
                value: self.value,
                below,
            });
        }
        for child in self.children.values() {
            child.audit(out);
        }
    }

    /// Direct leaves move into a same-category child when weighted children
    /// exist, so they compete as one sibling.
    fn absorb_leaves(&mut self) {
        if self.leaves.is_empty() || !self.has_weighted_children() {
            return;
        }
        let leaves = std::mem::take(&mut self.leaves);
        let weight: f64 = leaves.iter().map(TickerDelegate::weight).sum();
        let depth = self.depth + 1;

        match self.children.entry(self.category) {
            Entry::Vacant(slot) => {
                let mut synthetic = RebalanceNode::new(self.category, weight);
                synthetic.depth = depth;
                synthetic.leaves = leaves;
                synthetic.recompute_value();
                slot.insert(synthetic);
            }
            Entry::Occupied(mut slot) => {
                let existing = slot.get_mut();
                existing.weight += weight;
                existing.leaves.extend(leaves);
                existing.recompute_value();
            }
        }
    }

    fn has_weighted_children(&self) -> bool {
        self.children.values().any(|c| c.weight > 0.0)
    }

    fn participants(&mut self, use_children: bool) -> Vec<Participant<'_, 'a>> {
        if use_children {
            self.children.values_mut().map(Participant::Node).collect()
        } else {
            self.leaves.iter_mut().map(Participant::Ticker).collect()
        }
    }

    /// Place `value` into this subtree and return what could not be placed.
    ///
    /// Absolute mode sets the subtree to `value`; relative mode adds `value`
    /// on top of what is already proposed.  Never fails: malformed weights
    /// pass every leaf through at its current value and flag the context.
    pub fn set_proposed(
        &mut self,
        value: Currency,
        is_relative: bool,
        ctx: &mut RebalanceContext<'_>,
    ) -> Currency {
        let base = if is_relative {
            self.proposed()
        } else {
            Currency::ZERO
        };

        self.absorb_leaves();
        let use_children = self.has_weighted_children();
        if !use_children && !is_relative {
            for child in self.children.values_mut() {
                child.zero_out();
            }
        }

        let (category, depth) = (self.category, self.depth);
        let outcome = {
            let mut participants = self.participants(use_children);
            let outcome = search(&mut participants, value, is_relative, depth, ctx);
            if let Ok(residual) = &outcome {
                debug!(
                    category = %category,
                    depth,
                    participants = participants.len(),
                    current = %sum_current(&participants),
                    proposed = %sum_proposed(&participants),
                    residual = %residual,
                    "node/commit"
                );
            }
            outcome
        };

        let residual = match outcome {
            Ok(residual) => {
                self.recompute_value();
                residual
            }
            Err(err) => {
                warn!(
                    account = %ctx.account(),
                    category = %category,
                    depth,
                    error = %err,
                    "node/pass_through"
                );
                ctx.flag_problem();
                self.pass_through();
                value - (self.proposed() - base)
            }
        };

        let placed = self.proposed() - base;
        if placed + residual != value {
            warn!(
                account = %ctx.account(),
                category = %category,
                depth,
                value = %value,
                placed = %placed,
                residual = %residual,
                "node/conservation_mismatch"
            );
        }
        residual
    }
}

/// Initial proportional split, then (inside the depth gate) a subset search
/// over where to put the leftover.
fn search(
    participants: &mut [Participant<'_, '_>],
    value: Currency,
    is_relative: bool,
    depth: usize,
    ctx: &mut RebalanceContext<'_>,
) -> Result<Currency, AllocationError> {
    let n = participants.len();
    participants.iter_mut().for_each(|p| p.set_considered(true));

    let weights = considered_weights(participants);
    let mut shares = seeded(n, value);
    Reallocator::new(&weights).reallocate(&mut shares)?;

    let mut tracker = DeviationTracker::new(shares.clone());
    let leftover = distribute(participants, &shares, is_relative, ctx, &mut tracker);
    let initial = ReallocationScore::new(leftover, tracker.deviation());
    trace!(depth, score = %initial, "node/initial");

    if depth > ctx.config().max_search_depth || leftover.is_zero() {
        return Ok(leftover);
    }

    let first = ctx.next_token();
    let best = ctx.next_token();
    take_snapshots(participants, first);
    take_snapshots(participants, best);

    let mut best_score = initial;
    let mut patterns = Patterns::new(n);
    patterns.set_next_limit(ctx.config().iteration_limit);

    while !best_score.is_ideal() {
        let Some(pattern) = patterns.next() else {
            break;
        };
        for (i, p) in participants.iter_mut().enumerate() {
            p.set_considered(pattern.is_active(i));
        }

        let reallocator = Reallocator::new(&considered_weights(participants));
        if !reallocator.can_reallocate() {
            continue;
        }
        let mut trial = seeded(n, leftover);
        if reallocator.reallocate(&mut trial).is_err() {
            continue;
        }

        ctx.count_trial();
        let mut trial_tracker = tracker.clone();
        let trial_leftover = distribute(participants, &trial, true, ctx, &mut trial_tracker);
        let score = ReallocationScore::new(trial_leftover, trial_tracker.deviation());
        trace!(depth, %pattern, %score, "node/trial");

        if score < best_score {
            best_score = score;
            take_snapshots(participants, best);
            if trial_leftover.is_zero() {
                patterns.set_fast_forward(true);
            }
        }
        restore_snapshots(participants, first);
    }

    restore_snapshots(participants, best);
    discard_snapshots(participants, first);
    discard_snapshots(participants, best);
    participants.iter_mut().for_each(|p| p.set_considered(true));

    Ok(best_score.residual())
}

/// `n` slots holding `total` in the first one; the reallocator pools them.
fn seeded(n: usize, total: Currency) -> Vec<Currency> {
    let mut slots = vec![Currency::ZERO; n];
    if let Some(first) = slots.first_mut() {
        *first = total;
    }
    slots
}
