//! Fixed-point currency type
//!
//! # Motivation
//!
//! Every monetary amount the rebalance engine touches is stored as a whole
//! number of cents in an `i64`.  Floating-point dollars would let the sum of
//! allocated shares drift away from the amount being allocated; a fixed
//! minimum unit makes "sum of slots == total" an exact, checkable equality.
//!
//! `Currency` wraps the raw `i64` so the type system prevents:
//! - Implicit construction from raw integers (no `From<i64>` impl).
//! - Mixing cents with unrelated counts (lots, slot indices, iteration
//!   counters) in arithmetic.
//!
//! # Scale
//!
//! 1 USD = 100 cents = `Currency::from_cents(100)`.  The minimum unit is
//! [`Currency::UNIT`] (one cent).  [`Currency::UNITS_PER_WHOLE`] is the
//! factor between the minimum unit and one whole currency unit.
//!
//! # Arithmetic
//!
//! - `Add`, `Sub`, `Neg`, `AddAssign`, `SubAssign` and `Sum` are closed over
//!   `Currency`; these panic on overflow in debug builds and wrap in release
//!   (matching Rust's standard integer semantics).
//! - `saturating_add` / `saturating_sub` clamp at the `i64` extremes.
//! - `checked_mul` / `checked_lots` return `None` instead of overflowing or
//!   dividing by a non-positive lot.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Currency newtype
// ---------------------------------------------------------------------------

/// A fixed-point monetary amount measured in cents.
///
/// # Construction
///
/// Use [`Currency::from_cents`] for exact construction, or
/// [`Currency::try_from_dollars`] when the source is a floating-point dollar
/// amount (rounded half away from zero to the nearest cent).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Currency(i64);

impl Currency {
    /// Zero monetary amount.
    pub const ZERO: Currency = Currency(0);

    /// The minimum representable increment (one cent).
    pub const UNIT: Currency = Currency(1);

    /// Number of minimum units in one whole currency unit.
    pub const UNITS_PER_WHOLE: i64 = 100;

    /// Maximum representable value.
    pub const MAX: Currency = Currency(i64::MAX);

    /// Minimum representable value.
    pub const MIN: Currency = Currency(i64::MIN);

    /// Construct from a raw count of minimum units (cents).
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Currency(cents)
    }

    /// Construct from whole currency units (dollars).
    #[inline]
    pub const fn from_whole(whole: i64) -> Self {
        Currency(whole * Self::UNITS_PER_WHOLE)
    }

    /// Construct from a floating-point dollar amount, rounding to the nearest
    /// cent.  Returns `None` for NaN, infinities and values outside the `i64`
    /// cent range.
    pub fn try_from_dollars(dollars: f64) -> Option<Self> {
        if !dollars.is_finite() {
            return None;
        }
        let units = (dollars * Self::UNITS_PER_WHOLE as f64).round();
        if units > i64::MAX as f64 || units < i64::MIN as f64 {
            return None;
        }
        Some(Currency(units as i64))
    }

    /// Extract the raw count of minimum units.
    #[inline]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Value in whole currency units as a float (for statistics only).
    #[inline]
    pub fn to_f64(self) -> f64 {
        self.0 as f64 / Self::UNITS_PER_WHOLE as f64
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    #[inline]
    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Absolute value.  `Currency::MIN.abs()` saturates to `Currency::MAX`.
    #[inline]
    pub fn abs(self) -> Currency {
        Currency(self.0.saturating_abs())
    }

    /// Sign: `1`, `0` or `-1` as a plain integer.
    #[inline]
    pub fn signum(self) -> i64 {
        self.0.signum()
    }

    #[inline]
    pub fn saturating_add(self, rhs: Currency) -> Currency {
        Currency(self.0.saturating_add(rhs.0))
    }

    #[inline]
    pub fn saturating_sub(self, rhs: Currency) -> Currency {
        Currency(self.0.saturating_sub(rhs.0))
    }

    /// Multiply by an integer count (e.g. a number of lots).
    #[inline]
    pub fn checked_mul(self, count: i64) -> Option<Currency> {
        self.0.checked_mul(count).map(Currency)
    }

    /// Number of whole `lot`s contained in this amount, truncated toward
    /// zero.  Returns `None` if `lot` is not strictly positive.
    #[inline]
    pub fn checked_lots(self, lot: Currency) -> Option<i64> {
        if lot.0 <= 0 {
            return None;
        }
        Some(self.0 / lot.0)
    }
}

// ---------------------------------------------------------------------------
// Arithmetic operators (closed over Currency)
// ---------------------------------------------------------------------------

impl Add for Currency {
    type Output = Currency;
    #[inline]
    fn add(self, rhs: Currency) -> Currency {
        Currency(self.0 + rhs.0)
    }
}

impl Sub for Currency {
    type Output = Currency;
    #[inline]
    fn sub(self, rhs: Currency) -> Currency {
        Currency(self.0 - rhs.0)
    }
}

impl Neg for Currency {
    type Output = Currency;
    #[inline]
    fn neg(self) -> Currency {
        Currency(-self.0)
    }
}

impl AddAssign for Currency {
    #[inline]
    fn add_assign(&mut self, rhs: Currency) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Currency {
    #[inline]
    fn sub_assign(&mut self, rhs: Currency) {
        self.0 -= rhs.0;
    }
}

impl Sum for Currency {
    fn sum<I: Iterator<Item = Currency>>(iter: I) -> Currency {
        iter.fold(Currency::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Currency> for Currency {
    fn sum<I: Iterator<Item = &'a Currency>>(iter: I) -> Currency {
        iter.copied().sum()
    }
}

// ---------------------------------------------------------------------------
// Display / parsing
// ---------------------------------------------------------------------------

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / Self::UNITS_PER_WHOLE;
        let frac = (self.0 % Self::UNITS_PER_WHOLE).abs();
        // -0.05 truncates to whole == 0; keep the sign.
        if self.0 < 0 && whole == 0 {
            write!(f, "-{whole}.{frac:02}")
        } else {
            write!(f, "{whole}.{frac:02}")
        }
    }
}

/// Why a currency literal could not be parsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseCurrencyError {
    Empty,
    InvalidDigit { input: String },
    /// More fractional digits than the minimum unit can hold.
    TooPrecise { input: String },
    Overflow { input: String },
}

impl fmt::Display for ParseCurrencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty currency literal"),
            Self::InvalidDigit { input } => write!(f, "invalid currency literal '{input}'"),
            Self::TooPrecise { input } => {
                write!(f, "currency literal '{input}' has more than two decimal places")
            }
            Self::Overflow { input } => write!(f, "currency literal '{input}' is out of range"),
        }
    }
}

impl std::error::Error for ParseCurrencyError {}

impl FromStr for Currency {
    type Err = ParseCurrencyError;

    /// Accepts `[-][$]digits[.digits]` with optional `,` group separators.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ParseCurrencyError::Empty);
        }
        let invalid = || ParseCurrencyError::InvalidDigit {
            input: trimmed.to_string(),
        };
        let overflow = || ParseCurrencyError::Overflow {
            input: trimmed.to_string(),
        };

        let (negative, rest) = match trimmed.strip_prefix('-') {
            Some(r) => (true, r),
            None => (false, trimmed),
        };
        let rest = rest.strip_prefix('$').unwrap_or(rest);
        let cleaned: String = rest.chars().filter(|c| *c != ',').collect();

        let (whole_str, frac_str) = match cleaned.split_once('.') {
            Some((w, f)) => (w, f),
            None => (cleaned.as_str(), ""),
        };
        if whole_str.is_empty() && frac_str.is_empty() {
            return Err(invalid());
        }
        if !whole_str.chars().all(|c| c.is_ascii_digit())
            || !frac_str.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }
        if frac_str.len() > 2 {
            return Err(ParseCurrencyError::TooPrecise {
                input: trimmed.to_string(),
            });
        }

        let whole: i64 = if whole_str.is_empty() {
            0
        } else {
            whole_str.parse().map_err(|_| overflow())?
        };
        let frac: i64 = match frac_str.len() {
            0 => 0,
            1 => frac_str.parse::<i64>().map_err(|_| invalid())? * 10,
            _ => frac_str.parse().map_err(|_| invalid())?,
        };

        let cents = whole
            .checked_mul(Self::UNITS_PER_WHOLE)
            .and_then(|c| c.checked_add(frac))
            .ok_or_else(overflow)?;
        Ok(Currency(if negative { -cents } else { cents }))
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_additive_identity() {
        let a = Currency::from_cents(4_200);
        assert_eq!(a + Currency::ZERO, a);
        assert_eq!(Currency::ZERO + a, a);
    }

    #[test]
    fn from_whole_scales_by_units_per_whole() {
        assert_eq!(Currency::from_whole(100), Currency::from_cents(10_000));
    }

    #[test]
    fn try_from_dollars_rounds_to_nearest_cent() {
        assert_eq!(
            Currency::try_from_dollars(100.006),
            Some(Currency::from_cents(10_001))
        );
        assert_eq!(
            Currency::try_from_dollars(33.333_333),
            Some(Currency::from_cents(3_333))
        );
        assert_eq!(
            Currency::try_from_dollars(-0.004),
            Some(Currency::from_cents(0))
        );
    }

    #[test]
    fn try_from_dollars_rejects_non_finite() {
        assert_eq!(Currency::try_from_dollars(f64::NAN), None);
        assert_eq!(Currency::try_from_dollars(f64::INFINITY), None);
        assert_eq!(Currency::try_from_dollars(1e300), None);
    }

    #[test]
    fn checked_lots_truncates_toward_zero() {
        let lot = Currency::from_cents(3_000);
        assert_eq!(Currency::from_cents(10_000).checked_lots(lot), Some(3));
        assert_eq!(Currency::from_cents(-10_000).checked_lots(lot), Some(-3));
        assert_eq!(Currency::from_cents(2_999).checked_lots(lot), Some(0));
        assert_eq!(Currency::from_cents(1).checked_lots(Currency::ZERO), None);
    }

    #[test]
    fn checked_mul_overflow_returns_none() {
        assert_eq!(Currency::MAX.checked_mul(2), None);
        assert_eq!(
            Currency::from_cents(2_500).checked_mul(4),
            Some(Currency::from_cents(10_000))
        );
    }

    #[test]
    fn abs_of_min_saturates_to_max() {
        assert_eq!(Currency::MIN.abs(), Currency::MAX);
    }

    #[test]
    fn sum_of_slots() {
        let slots = [
            Currency::from_cents(3_333),
            Currency::from_cents(3_334),
            Currency::from_cents(3_334),
        ];
        let total: Currency = slots.iter().sum();
        assert_eq!(total, Currency::from_cents(10_001));
    }

    #[test]
    fn display_formats_two_decimal_places() {
        assert_eq!(Currency::from_cents(10_001).to_string(), "100.01");
        assert_eq!(Currency::from_cents(-275).to_string(), "-2.75");
        assert_eq!(Currency::from_cents(-5).to_string(), "-0.05");
        assert_eq!(Currency::ZERO.to_string(), "0.00");
    }

    #[test]
    fn parse_accepts_common_forms() {
        assert_eq!("100.01".parse(), Ok(Currency::from_cents(10_001)));
        assert_eq!("$1,234.5".parse(), Ok(Currency::from_cents(123_450)));
        assert_eq!("-0.05".parse(), Ok(Currency::from_cents(-5)));
        assert_eq!("42".parse(), Ok(Currency::from_whole(42)));
        assert_eq!(".25".parse(), Ok(Currency::from_cents(25)));
    }

    #[test]
    fn parse_rejects_sub_cent_precision() {
        assert!(matches!(
            "1.005".parse::<Currency>(),
            Err(ParseCurrencyError::TooPrecise { .. })
        ));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!("".parse::<Currency>(), Err(ParseCurrencyError::Empty));
        assert!(matches!(
            "12a.00".parse::<Currency>(),
            Err(ParseCurrencyError::InvalidDigit { .. })
        ));
        assert!(matches!(
            ".".parse::<Currency>(),
            Err(ParseCurrencyError::InvalidDigit { .. })
        ));
    }

    #[test]
    fn display_parse_agree() {
        for cents in [0_i64, 1, -1, 99, 100, -12_345, 987_654_321] {
            let c = Currency::from_cents(cents);
            assert_eq!(c.to_string().parse::<Currency>(), Ok(c));
        }
    }
}
