//! Proportional reallocation with exact unit conservation.
//!
//! Splitting a total across weighted slots and rounding each slot to the
//! minimum unit independently makes the slots drift away from the total by
//! up to half a unit per slot.  The reallocator measures that drift and
//! pushes it back, one unit at a time, onto the slots whose rounding moved
//! them furthest in the opposite direction.
//!
//! Postcondition of every successful [`Reallocator::reallocate`]:
//! `sum(targets_after) == sum(targets_before)` to the unit.

use rbl_currency::Currency;

use crate::error::AllocationError;

/// Weighted splitter.  Weights are copied at construction and never change;
/// build a new reallocator for a different weight configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct Reallocator {
    weights: Box<[f64]>,
}

impl Reallocator {
    pub fn new(weights: &[f64]) -> Self {
        Self {
            weights: weights.into(),
        }
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn weight_sum(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// True iff the weights sum to a positive value.
    pub fn can_reallocate(&self) -> bool {
        self.weight_sum() > 0.0
    }

    /// Redistribute the current sum of `targets` across the slots in
    /// proportion to the weights.
    ///
    /// Slots beyond the weight list get weight zero; weights beyond the slot
    /// list are ignored.
    pub fn reallocate(&self, targets: &mut [Currency]) -> Result<(), AllocationError> {
        let weights = self.effective_weights(targets.len())?;
        let weight_sum: f64 = weights.iter().sum();
        if !weight_sum.is_finite() {
            return Err(AllocationError::WeightSumOverflow);
        }
        if weight_sum <= 0.0 {
            return Err(AllocationError::ZeroWeightSum);
        }

        let before: i64 = targets.iter().map(|t| t.cents()).sum();
        let factor = before as f64 / weight_sum;

        // Signed rounding error per slot, in minimum units (stored - exact).
        let mut errors = Vec::with_capacity(targets.len());
        for (slot, weight) in targets.iter_mut().zip(&weights) {
            let exact = weight * factor;
            let stored = exact.round();
            *slot = Currency::from_cents(stored as i64);
            errors.push(stored - exact);
        }

        let after: i64 = targets.iter().map(|t| t.cents()).sum();
        let difference = before - after;
        if difference == 0 {
            return Ok(());
        }

        // Zero-weight slots must stay exactly zero.
        let mut order: Vec<usize> = (0..targets.len()).filter(|&i| weights[i] > 0.0).collect();
        if difference > 0 {
            // Adding units: most under-rounded first.
            order.sort_by(|&a, &b| errors[a].total_cmp(&errors[b]));
        } else {
            // Removing units: most over-rounded first.
            order.sort_by(|&a, &b| errors[b].total_cmp(&errors[a]));
        }

        let step = Currency::from_cents(difference.signum());
        for &i in order.iter().cycle().take(difference.unsigned_abs() as usize) {
            targets[i] += step;
        }
        Ok(())
    }

    /// Weights aligned to `len` slots, validated.
    fn effective_weights(&self, len: usize) -> Result<Vec<f64>, AllocationError> {
        let mut out = Vec::with_capacity(len);
        for index in 0..len {
            let weight = self.weights.get(index).copied().unwrap_or(0.0);
            if !weight.is_finite() {
                return Err(AllocationError::NonFiniteWeight { index });
            }
            if weight < 0.0 {
                return Err(AllocationError::NegativeWeight { index, weight });
            }
            out.push(weight);
        }
        Ok(out)
    }
}
