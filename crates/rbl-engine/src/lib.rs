//! rbl-engine
//!
//! Weighted rebalance allocation over a category tree.
//! - Proportional split with exact cent conservation (`Reallocator`)
//! - Per-node subset search over where the leftover goes (`RebalanceNode`)
//! - Snapshot/restore backtracking keyed by per-pass tokens
//! - Pure synchronous logic (no IO, no time, no globals)

mod context;
mod error;
mod node;
mod participant;
mod rebalancer;
mod score;

pub mod config;
pub mod patterns;
pub mod reallocator;
pub mod receiver;
pub mod taxonomy;
pub mod tree;

pub use config::{default_iteration_limit, RebalanceConfig, CONSUMED_POINTERS};
pub use context::{AccountKey, RebalanceContext, SnapshotToken};
pub use error::AllocationError;
pub use node::{AuditMismatch, RebalanceNode};
pub use participant::{Participant, TickerDelegate};
pub use patterns::{Pattern, Patterns};
pub use reallocator::Reallocator;
pub use rebalancer::{AccountJob, RebalanceOutcome, Rebalancer};
pub use receiver::{Holding, Receiver, Rejection};
pub use score::{DeviationTracker, ReallocationScore};
pub use taxonomy::{UnknownWeightType, WeightType};
pub use tree::{TreeBuilder, WeightMap, DEFAULT_WEIGHT};

pub use rbl_currency::Currency;
