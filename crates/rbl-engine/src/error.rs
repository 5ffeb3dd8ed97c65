use crate::taxonomy::WeightType;

/// Malformed allocation input.
///
/// Every variant is an "invalid argument" condition: the caller handed the
/// engine weights or shapes it cannot work with.  Inside a rebalance pass
/// these are caught at the node boundary and turned into a pass-through
/// outcome; they never abort the other accounts of a batch.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum AllocationError {
    #[error("weight {weight} at slot {index} is negative")]
    NegativeWeight { index: usize, weight: f64 },

    #[error("weight at slot {index} is not finite")]
    NonFiniteWeight { index: usize },

    #[error("weights sum to zero; nothing to allocate against")]
    ZeroWeightSum,

    #[error("weights are finite but their sum overflows")]
    WeightSumOverflow,

    #[error("slot count {requested} is below the {in_use} slot(s) already deactivated")]
    SlotCountTooSmall { requested: usize, in_use: usize },

    #[error("category '{child}' does not roll up into '{parent}'")]
    TaxonomyMismatch { parent: WeightType, child: WeightType },
}
