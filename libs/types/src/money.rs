//! Decimal money type for bid amounts and settlement totals
//!
//! Uses rust_decimal for deterministic arithmetic (no floating-point
//! errors). Tax computation rounds HALF_UP to 2 decimal places.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Add;
use std::str::FromStr;

/// A non-negative monetary amount in the marketplace currency.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Create from a whole currency-unit amount.
    pub fn from_u64(amount: u64) -> Self {
        Self(Decimal::from(amount))
    }

    /// Try to create from a decimal, rejecting negative amounts.
    pub fn try_new(amount: Decimal) -> Option<Self> {
        if amount.is_sign_negative() {
            None
        } else {
            Some(Self(amount))
        }
    }

    /// Try to parse from a decimal string, rejecting negative amounts.
    pub fn try_from_str(s: &str) -> Option<Self> {
        Decimal::from_str(s).ok().and_then(Self::try_new)
    }

    /// Get the inner decimal value.
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// The smaller of two amounts.
    pub fn min(self, other: Money) -> Money {
        if self <= other {
            self
        } else {
            other
        }
    }

    /// Subtraction clamped at zero; Money never goes negative.
    pub fn saturating_sub(self, other: Money) -> Money {
        if other >= self {
            Money::ZERO
        } else {
            Money(self.0 - other.0)
        }
    }

    /// Tax due on this amount at the given rate, rounded HALF_UP to
    /// 2 decimal places.
    pub fn tax(self, rate: Decimal) -> Money {
        Money((self.0 * rate).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_rejects_negative() {
        assert!(Money::try_from_str("-1").is_none());
        assert!(Money::try_from_str("0").is_some());
    }

    #[test]
    fn test_tax_at_18_percent() {
        let rate = Decimal::from_str("0.18").unwrap();
        assert_eq!(Money::from_u64(1000).tax(rate), Money::from_u64(180));
        // 999.99 * 0.18 = 179.9982 → 180.00
        let subtotal = Money::try_from_str("999.99").unwrap();
        assert_eq!(subtotal.tax(rate), Money::try_from_str("180.00").unwrap());
    }

    #[test]
    fn test_min_and_saturating_sub() {
        let a = Money::from_u64(500);
        let b = Money::from_u64(600);
        assert_eq!(a.min(b), a);
        assert_eq!(b.saturating_sub(a), Money::from_u64(100));
        assert_eq!(a.saturating_sub(b), Money::ZERO);
    }

    #[test]
    fn test_serde_transparent() {
        let m = Money::try_from_str("1180.00").unwrap();
        let json = serde_json::to_string(&m).unwrap();
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(m, back);
    }

    proptest! {
        #[test]
        fn prop_add_never_decreases(a in 0u64..1_000_000, b in 0u64..1_000_000) {
            let sum = Money::from_u64(a) + Money::from_u64(b);
            prop_assert!(sum >= Money::from_u64(a));
            prop_assert!(sum >= Money::from_u64(b));
        }

        #[test]
        fn prop_saturating_sub_non_negative(a in 0u64..1_000_000, b in 0u64..1_000_000) {
            let diff = Money::from_u64(a).saturating_sub(Money::from_u64(b));
            prop_assert!(diff >= Money::ZERO);
        }
    }
}
