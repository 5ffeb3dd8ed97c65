//! Consideration patterns: which siblings take part in one trial.
//!
//! Enumeration is by level.  Level `k` deactivates `k` participants; level 0
//! is the single all-active pattern.  Within a level the last deactivation
//! walks toward slot 0 one step at a time.  When it cannot move, an earlier
//! deactivation steps down and the later ones re-pack directly behind it.
//! When no deactivation can move the level is done and the next level starts
//! with its deactivations packed at the high end.
//!
//! For three slots the order is:
//!
//! ```text
//! 111  110  101  011  100  010  001  000
//! ```

use std::fmt;

use crate::error::AllocationError;

/// One bit per participant; `true` means the participant is considered.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Pattern(Vec<bool>);

impl Pattern {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Out-of-range slots are not considered.
    pub fn is_active(&self, slot: usize) -> bool {
        self.0.get(slot).copied().unwrap_or(false)
    }

    pub fn active_count(&self) -> usize {
        self.0.iter().filter(|b| **b).count()
    }

    pub fn bits(&self) -> &[bool] {
        &self.0
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in &self.0 {
            f.write_str(if *bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct Patterns {
    slot_count: usize,
    /// Deactivated slots, strictly decreasing.
    deactivated: Vec<usize>,
    exhausted: bool,
    fast_forward: bool,
    calls: u64,
    limit: u64,
}

impl Patterns {
    pub fn new(slot_count: usize) -> Self {
        Self {
            slot_count,
            deactivated: Vec::new(),
            exhausted: false,
            fast_forward: false,
            calls: 0,
            limit: u64::MAX,
        }
    }

    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    /// Number of deactivations in the current level.
    pub fn level(&self) -> usize {
        self.deactivated.len()
    }

    /// Patterns handed out so far.
    pub fn calls(&self) -> u64 {
        self.calls
    }

    pub fn has_next(&self) -> bool {
        !self.exhausted && self.calls < self.limit
    }

    /// Cap the total number of patterns handed out.  Counts calls already
    /// made.
    pub fn set_next_limit(&mut self, limit: u64) {
        self.limit = limit;
    }

    /// Stop at the end of the current level instead of adding deactivations.
    pub fn set_fast_forward(&mut self, on: bool) {
        self.fast_forward = on;
    }

    /// Restart the current level over `slot_count` slots.  The call budget is
    /// not refunded.
    pub fn reset(&mut self, slot_count: usize) -> Result<(), AllocationError> {
        let level = self.level();
        if slot_count < level {
            return Err(AllocationError::SlotCountTooSmall {
                requested: slot_count,
                in_use: level,
            });
        }
        self.slot_count = slot_count;
        self.deactivated = packed_high(slot_count, level);
        self.exhausted = false;
        Ok(())
    }

    fn current(&self) -> Pattern {
        let mut bits = vec![true; self.slot_count];
        for &slot in &self.deactivated {
            bits[slot] = false;
        }
        Pattern(bits)
    }

    fn advance(&mut self) {
        let k = self.deactivated.len();

        // Last index first; index j needs k-1-j free slots below it.
        for j in (0..k).rev() {
            let floor = k - 1 - j;
            if self.deactivated[j] > floor {
                self.deactivated[j] -= 1;
                for l in j + 1..k {
                    self.deactivated[l] = self.deactivated[l - 1] - 1;
                }
                return;
            }
        }

        if self.fast_forward || k >= self.slot_count {
            self.exhausted = true;
            return;
        }
        self.deactivated = packed_high(self.slot_count, k + 1);
    }
}

fn packed_high(slot_count: usize, level: usize) -> Vec<usize> {
    (slot_count - level..slot_count).rev().collect()
}

impl Iterator for Patterns {
    type Item = Pattern;

    fn next(&mut self) -> Option<Pattern> {
        if !self.has_next() {
            return None;
        }
        let pattern = self.current();
        self.calls += 1;
        self.advance();
        Some(pattern)
    }
}
