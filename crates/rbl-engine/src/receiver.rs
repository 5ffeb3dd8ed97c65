//! The leaf seam: whatever finally holds a proposed value.

use rbl_currency::Currency;

/// A receiver refused an offer outright.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("offer rejected: {0}")]
pub struct Rejection(pub String);

/// A leaf instrument as the allocator sees it.
///
/// `set_proposed` is a raw write used for snapshot restores and
/// pass-through.  `offer` is the allocation path: the receiver keeps what it
/// can of `value` and returns the part it could not absorb.
pub trait Receiver {
    fn key(&self) -> &str;

    fn weight(&self) -> f64;

    fn current(&self) -> Currency;

    fn proposed(&self) -> Currency;

    fn set_proposed(&mut self, value: Currency);

    fn offer(&mut self, value: Currency) -> Result<Currency, Rejection> {
        self.set_proposed(value);
        Ok(Currency::ZERO)
    }
}

/// A position in one instrument.
///
/// With a `lot` the proposed value is always a whole number of lots.  Holdings
/// are long-only: a negative offer leaves the position at zero and hands the
/// whole amount back.
#[derive(Clone, Debug, PartialEq)]
pub struct Holding {
    pub ticker: String,
    pub weight: f64,
    pub current: Currency,
    pub proposed: Currency,
    pub lot: Option<Currency>,
}

impl Holding {
    pub fn new(ticker: impl Into<String>, weight: f64, current: Currency) -> Self {
        Self {
            ticker: ticker.into(),
            weight,
            current,
            proposed: Currency::ZERO,
            lot: None,
        }
    }

    pub fn with_lot(mut self, lot: Currency) -> Self {
        self.lot = Some(lot);
        self
    }
}

impl Receiver for Holding {
    fn key(&self) -> &str {
        &self.ticker
    }

    fn weight(&self) -> f64 {
        self.weight
    }

    fn current(&self) -> Currency {
        self.current
    }

    fn proposed(&self) -> Currency {
        self.proposed
    }

    fn set_proposed(&mut self, value: Currency) {
        self.proposed = value;
    }

    fn offer(&mut self, value: Currency) -> Result<Currency, Rejection> {
        if value.is_negative() {
            self.proposed = Currency::ZERO;
            return Ok(value);
        }
        let accepted = match self.lot {
            None => value,
            Some(lot) => {
                let lots = value
                    .checked_lots(lot)
                    .ok_or_else(|| Rejection(format!("{}: lot {lot} is not positive", self.ticker)))?;
                lot.checked_mul(lots)
                    .ok_or_else(|| Rejection(format!("{}: lot arithmetic overflow", self.ticker)))?
            }
        };
        self.proposed = accepted;
        Ok(value - accepted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(cents: i64) -> Currency {
        Currency::from_cents(cents)
    }

    #[test]
    fn plain_holding_absorbs_everything() {
        let mut h = Holding::new("VTI", 1.0, c(0));
        assert_eq!(h.offer(c(12_345)), Ok(c(0)));
        assert_eq!(h.proposed, c(12_345));
    }

    #[test]
    fn lot_holding_truncates_to_whole_lots() {
        let mut h = Holding::new("VTI", 1.0, c(0)).with_lot(c(2_500));
        assert_eq!(h.offer(c(10_001)), Ok(c(1)));
        assert_eq!(h.proposed, c(10_000));
        assert_eq!(h.offer(c(2_499)), Ok(c(2_499)));
        assert_eq!(h.proposed, c(0));
    }

    #[test]
    fn negative_offer_is_handed_back() {
        let mut h = Holding::new("VTI", 1.0, c(500));
        h.proposed = c(500);
        assert_eq!(h.offer(c(-300)), Ok(c(-300)));
        assert_eq!(h.proposed, c(0));
    }

    #[test]
    fn non_positive_lot_is_a_rejection() {
        let mut h = Holding::new("BAD", 1.0, c(0)).with_lot(c(0));
        assert!(h.offer(c(100)).is_err());
    }

    #[test]
    fn default_offer_takes_the_value() {
        struct Bare(Currency);
        impl Receiver for Bare {
            fn key(&self) -> &str {
                "bare"
            }
            fn weight(&self) -> f64 {
                1.0
            }
            fn current(&self) -> Currency {
                Currency::ZERO
            }
            fn proposed(&self) -> Currency {
                self.0
            }
            fn set_proposed(&mut self, value: Currency) {
                self.0 = value;
            }
        }
        let mut b = Bare(Currency::ZERO);
        assert_eq!(b.offer(c(77)), Ok(Currency::ZERO));
        assert_eq!(b.proposed(), c(77));
    }
}
