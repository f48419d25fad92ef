//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Whole Pesos
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  COLOMBIAN PESOS (COP)                                                  │
//! │                                                                         │
//! │  Prices at the shop are quoted in whole pesos:                          │
//! │    Corte completo  $35.000                                              │
//! │    Barba           $15.000                                              │
//! │                                                                         │
//! │  Centavos are not used in practice, so the smallest unit here is        │
//! │  one peso. Stored as i64, never as a float.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use barberia_core::money::Money;
//!
//! let cut = Money::from_pesos(35_000);
//! let beard = Money::from_pesos(15_000);
//!
//! let subtotal = cut + beard;
//! assert_eq!(subtotal.pesos(), 50_000);
//! assert_eq!(subtotal.to_string(), "$50.000");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary amount in whole Colombian pesos.
///
/// ## Design Decisions
/// - **i64 (signed)**: ledger deltas are negative when credit is spent
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **Newtype serde**: serializes as a bare integer (`35000`)
///
/// ## Where Money is Used
/// ```text
/// Service.price ──► OrderQuote.subtotal ──► discount / credit ──► total_due
///                                                    │
///                    Customer.credit_balance ◄───────┘
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates Money from whole pesos.
    #[inline]
    pub const fn from_pesos(pesos: i64) -> Self {
        Money(pesos)
    }

    /// Returns the amount in whole pesos.
    #[inline]
    pub const fn pesos(&self) -> i64 {
        self.0
    }

    /// Zero pesos.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Clamps negative amounts to zero.
    ///
    /// ## Example
    /// ```rust
    /// use barberia_core::money::Money;
    ///
    /// let remainder = Money::from_pesos(15_000) - Money::from_pesos(25_000);
    /// assert_eq!(remainder.non_negative(), Money::zero());
    /// ```
    #[inline]
    pub const fn non_negative(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            *self
        }
    }

    /// Returns the absolute value, saturating at `i64::MAX`.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.saturating_abs())
    }

    /// Addition that returns `None` on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use barberia_core::money::Money;
    ///
    /// let max = Money::from_pesos(i64::MAX);
    /// assert!(max.checked_add(Money::from_pesos(1)).is_none());
    /// assert_eq!(
    ///     Money::from_pesos(35_000).checked_add(Money::from_pesos(15_000)),
    ///     Some(Money::from_pesos(50_000))
    /// );
    /// ```
    #[inline]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }

    /// Subtraction that returns `None` on overflow.
    #[inline]
    pub const fn checked_sub(self, other: Self) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(v) => Some(Money(v)),
            None => None,
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shop-style display: `$35.000`, `-$8.000`.
///
/// Colombian notation uses a dot as the thousands separator.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let digits = self.0.unsigned_abs().to_string();

        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }

        write!(f, "{}${}", sign, grouped)
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pesos() {
        let money = Money::from_pesos(35_000);
        assert_eq!(money.pesos(), 35_000);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_pesos(35_000).to_string(), "$35.000");
        assert_eq!(Money::from_pesos(8_000).to_string(), "$8.000");
        assert_eq!(Money::from_pesos(1_250_000).to_string(), "$1.250.000");
        assert_eq!(Money::from_pesos(-15_000).to_string(), "-$15.000");
        assert_eq!(Money::from_pesos(950).to_string(), "$950");
        assert_eq!(Money::zero().to_string(), "$0");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_pesos(35_000);
        let b = Money::from_pesos(15_000);

        assert_eq!((a + b).pesos(), 50_000);
        assert_eq!((a - b).pesos(), 20_000);
        assert_eq!((b * 3).pesos(), 45_000);

        let mut running = Money::zero();
        running += a;
        running -= b;
        assert_eq!(running.pesos(), 20_000);
    }

    #[test]
    fn test_non_negative_and_min() {
        assert_eq!(Money::from_pesos(-1).non_negative(), Money::zero());
        assert_eq!(Money::from_pesos(10).non_negative().pesos(), 10);
        assert_eq!(
            Money::from_pesos(20_000).min(Money::from_pesos(15_000)).pesos(),
            15_000
        );
    }

    #[test]
    fn test_sum() {
        let prices = [Money::from_pesos(35_000), Money::from_pesos(15_000)];
        let total: Money = prices.iter().sum();
        assert_eq!(total.pesos(), 50_000);
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let negative = Money::from_pesos(-100);
        assert!(negative.is_negative());
        assert_eq!(negative.abs().pesos(), 100);
        assert_eq!(Money::from_pesos(i64::MIN).abs().pesos(), i64::MAX);
    }

    #[test]
    fn test_checked_arithmetic() {
        let max = Money::from_pesos(i64::MAX);
        let min = Money::from_pesos(i64::MIN);
        assert_eq!(max.checked_add(Money::from_pesos(1)), None);
        assert_eq!(min.checked_sub(Money::from_pesos(1)), None);
        assert_eq!(
            Money::from_pesos(35_000).checked_sub(Money::from_pesos(50_000)),
            Some(Money::from_pesos(-15_000))
        );
    }

    #[test]
    fn test_serializes_as_plain_integer() {
        let json = serde_json::to_string(&Money::from_pesos(25_000)).unwrap();
        assert_eq!(json, "25000");
        let back: Money = serde_json::from_str("25000").unwrap();
        assert_eq!(back.pesos(), 25_000);
    }
}
