//! Ranking of candidate allocations.

use std::cmp::Ordering;
use std::fmt;

use rbl_currency::Currency;

/// `(residual, deviation)`.  Smaller is better: residual distance from zero
/// decides first, deviation breaks ties.
#[derive(Clone, Copy, Debug)]
pub struct ReallocationScore {
    residual: Currency,
    deviation: f64,
}

impl ReallocationScore {
    /// Zero residual, zero deviation.  A target, not a promise.
    pub const IDEAL: ReallocationScore = ReallocationScore {
        residual: Currency::ZERO,
        deviation: 0.0,
    };

    pub fn new(residual: Currency, deviation: f64) -> Self {
        Self {
            residual,
            deviation,
        }
    }

    pub fn residual(&self) -> Currency {
        self.residual
    }

    pub fn deviation(&self) -> f64 {
        self.deviation
    }

    pub fn is_ideal(&self) -> bool {
        *self == Self::IDEAL
    }
}

impl Ord for ReallocationScore {
    fn cmp(&self, other: &Self) -> Ordering {
        self.residual
            .abs()
            .cmp(&other.residual.abs())
            .then_with(|| self.deviation.total_cmp(&other.deviation))
    }
}

impl PartialOrd for ReallocationScore {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Equality follows the ordering, so +5 and -5 residuals compare equal.
impl PartialEq for ReallocationScore {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ReallocationScore {}

impl fmt::Display for ReallocationScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "residual={} deviation={:.4}", self.residual, self.deviation)
    }
}

/// Ideal versus absorbed amount per participant index.
///
/// Ideals are fixed by the initial proportional split.  Absorbed amounts
/// accumulate over the initial split and any trial redistributions.
#[derive(Clone, Debug, PartialEq)]
pub struct DeviationTracker {
    ideal: Vec<Currency>,
    absorbed: Vec<Currency>,
}

impl DeviationTracker {
    pub fn new(ideal: Vec<Currency>) -> Self {
        let absorbed = vec![Currency::ZERO; ideal.len()];
        Self { ideal, absorbed }
    }

    pub fn absorb(&mut self, index: usize, amount: Currency) {
        if let Some(slot) = self.absorbed.get_mut(index) {
            *slot += amount;
        }
    }

    pub fn absorbed(&self) -> &[Currency] {
        &self.absorbed
    }

    /// Population standard deviation of `absorbed - ideal`, in whole
    /// currency units.
    pub fn deviation(&self) -> f64 {
        let n = self.ideal.len();
        if n == 0 {
            return 0.0;
        }
        let diffs: Vec<f64> = self
            .absorbed
            .iter()
            .zip(&self.ideal)
            .map(|(a, i)| (*a - *i).to_f64())
            .collect();
        let mean = diffs.iter().sum::<f64>() / n as f64;
        let variance = diffs.iter().map(|d| (d - mean).powi(2)).sum::<f64>() / n as f64;
        variance.sqrt()
    }
}
