//! Uniform view over the two kinds of sibling a node distributes to.

use std::collections::BTreeMap;

use rbl_currency::Currency;
use tracing::warn;

use crate::context::{RebalanceContext, SnapshotToken};
use crate::node::RebalanceNode;
use crate::receiver::Receiver;
use crate::score::DeviationTracker;

/// Borrowed leaf plus the per-pass state the search needs.
pub struct TickerDelegate<'a> {
    receiver: &'a mut dyn Receiver,
    considered: bool,
    snapshots: BTreeMap<SnapshotToken, Currency>,
}

impl<'a> TickerDelegate<'a> {
    pub fn new(receiver: &'a mut dyn Receiver) -> Self {
        Self {
            receiver,
            considered: true,
            snapshots: BTreeMap::new(),
        }
    }

    pub fn key(&self) -> &str {
        self.receiver.key()
    }

    pub fn weight(&self) -> f64 {
        self.receiver.weight()
    }

    pub fn current(&self) -> Currency {
        self.receiver.current()
    }

    pub fn proposed(&self) -> Currency {
        self.receiver.proposed()
    }

    pub(crate) fn set_raw(&mut self, value: Currency) {
        self.receiver.set_proposed(value);
    }

    /// No explicit value could be computed: keep what is held now.
    pub fn pass_through(&mut self) {
        let current = self.receiver.current();
        self.receiver.set_proposed(current);
    }

    pub fn take_snapshot(&mut self, token: SnapshotToken) {
        self.snapshots.insert(token, self.receiver.proposed());
    }

    pub fn restore_snapshot(&mut self, token: SnapshotToken) {
        if let Some(value) = self.snapshots.get(&token).copied() {
            self.receiver.set_proposed(value);
        }
    }

    pub fn discard_snapshot(&mut self, token: SnapshotToken) {
        self.snapshots.remove(&token);
    }

    pub fn live_snapshots(&self) -> usize {
        self.snapshots.len()
    }

    /// Hand `share` to the receiver.  Relative shares land on top of the
    /// current proposal.  A refusal absorbs nothing.
    fn offer(&mut self, share: Currency, is_relative: bool, ctx: &mut RebalanceContext<'_>) -> Currency {
        let base = if is_relative {
            self.receiver.proposed()
        } else {
            Currency::ZERO
        };
        match self.receiver.offer(base + share) {
            Ok(residual) => residual,
            Err(rejection) => {
                warn!(
                    account = %ctx.account(),
                    ticker = self.receiver.key(),
                    %rejection,
                    "offer/rejected"
                );
                ctx.record_rejection(self.receiver.key());
                self.receiver.set_proposed(base);
                share
            }
        }
    }
}

impl std::fmt::Debug for TickerDelegate<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickerDelegate")
            .field("key", &self.key())
            .field("weight", &self.weight())
            .field("proposed", &self.proposed())
            .field("considered", &self.considered)
            .finish()
    }
}

/// One sibling in a node's distribution.
pub enum Participant<'p, 'a> {
    Ticker(&'p mut TickerDelegate<'a>),
    Node(&'p mut RebalanceNode<'a>),
}

impl Participant<'_, '_> {
    pub fn weight(&self) -> f64 {
        match self {
            Participant::Ticker(t) => t.weight(),
            Participant::Node(n) => n.weight(),
        }
    }

    pub fn current(&self) -> Currency {
        match self {
            Participant::Ticker(t) => t.current(),
            Participant::Node(n) => n.current(),
        }
    }

    pub fn proposed(&self) -> Currency {
        match self {
            Participant::Ticker(t) => t.proposed(),
            Participant::Node(n) => n.proposed(),
        }
    }

    pub fn is_considered(&self) -> bool {
        match self {
            Participant::Ticker(t) => t.considered,
            Participant::Node(n) => n.is_considered(),
        }
    }

    pub fn set_considered(&mut self, considered: bool) {
        match self {
            Participant::Ticker(t) => t.considered = considered,
            Participant::Node(n) => n.set_considered(considered),
        }
    }

    pub fn take_snapshot(&mut self, token: SnapshotToken) {
        match self {
            Participant::Ticker(t) => t.take_snapshot(token),
            Participant::Node(n) => n.take_snapshot(token),
        }
    }

    pub fn restore_snapshot(&mut self, token: SnapshotToken) {
        match self {
            Participant::Ticker(t) => t.restore_snapshot(token),
            Participant::Node(n) => n.restore_snapshot(token),
        }
    }

    pub fn discard_snapshot(&mut self, token: SnapshotToken) {
        match self {
            Participant::Ticker(t) => t.discard_snapshot(token),
            Participant::Node(n) => n.discard_snapshot(token),
        }
    }

    /// Returns the part of `share` this participant could not absorb.
    pub fn offer(&mut self, share: Currency, is_relative: bool, ctx: &mut RebalanceContext<'_>) -> Currency {
        match self {
            Participant::Ticker(t) => t.offer(share, is_relative, ctx),
            Participant::Node(n) => n.set_proposed(share, is_relative, ctx),
        }
    }
}

pub fn sum_current(participants: &[Participant<'_, '_>]) -> Currency {
    participants.iter().map(Participant::current).sum()
}

pub fn sum_proposed(participants: &[Participant<'_, '_>]) -> Currency {
    participants.iter().map(Participant::proposed).sum()
}

/// Weight per slot, zero for participants not under consideration.
pub fn considered_weights(participants: &[Participant<'_, '_>]) -> Vec<f64> {
    participants
        .iter()
        .map(|p| if p.is_considered() { p.weight() } else { 0.0 })
        .collect()
}

/// Offer `shares[i]` to every considered participant `i`, record what each
/// absorbed, and return the total left over.
pub fn distribute(
    participants: &mut [Participant<'_, '_>],
    shares: &[Currency],
    is_relative: bool,
    ctx: &mut RebalanceContext<'_>,
    tracker: &mut DeviationTracker,
) -> Currency {
    let mut residual = Currency::ZERO;
    for (i, (p, share)) in participants.iter_mut().zip(shares).enumerate() {
        if !p.is_considered() {
            continue;
        }
        let left = p.offer(*share, is_relative, ctx);
        tracker.absorb(i, *share - left);
        residual += left;
    }
    residual
}

pub fn take_snapshots(participants: &mut [Participant<'_, '_>], token: SnapshotToken) {
    participants.iter_mut().for_each(|p| p.take_snapshot(token));
}

pub fn restore_snapshots(participants: &mut [Participant<'_, '_>], token: SnapshotToken) {
    participants.iter_mut().for_each(|p| p.restore_snapshot(token));
}

pub fn discard_snapshots(participants: &mut [Participant<'_, '_>], token: SnapshotToken) {
    participants.iter_mut().for_each(|p| p.discard_snapshot(token));
}
