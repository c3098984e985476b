//! # Amount Module
//!
//! Provides the `Amount` type for handling monetary sums safely.
//!
//! ## Why Integer Cents?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Paying 7.5 in change with doubles:                                     │
//! │    7.5 - 5.0 - 2.0 - 0.5 may leave 1e-16 behind  ❌ "cannot make change"│
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    750 - 500 - 200 - 50 = 0                       ✅ exact              │
//! │                                                                         │
//! │  Every price, balance and change amount is an Amount.                   │
//! │  Only coin construction accepts a float face value.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use vend_core::amount::Amount;
//!
//! let price = Amount::from_cents(150); // 1.50
//! let inserted = Amount::from_cents(200);
//! assert_eq!((inserted - price).cents(), 50);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

// =============================================================================
// Amount Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents).
///
/// ## Design Decisions
/// - **i64 (signed)**: a net balance can go negative while a customer is
///   still selecting products
/// - **Transparent serde**: serializes as a plain integer number of cents
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Amount(i64);

impl Amount {
    /// Creates an amount from cents.
    ///
    /// ## Example
    /// ```rust
    /// use vend_core::amount::Amount;
    ///
    /// let price = Amount::from_cents(1099);
    /// assert_eq!(price.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Amount(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Amount(0)
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
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows the amount with two decimals (`7.50`, `-0.50`).
impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

impl Add for Amount {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Amount(self.0 + other.0)
    }
}

impl AddAssign for Amount {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Amount {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Amount(self.0 - other.0)
    }
}

impl SubAssign for Amount {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by a coin or item count.
impl Mul<u32> for Amount {
    type Output = Self;

    #[inline]
    fn mul(self, count: u32) -> Self {
        Amount(self.0 * i64::from(count))
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Amount>>(iter: I) -> Self {
        iter.fold(Amount::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Amount::from_cents(750).to_string(), "7.50");
        assert_eq!(Amount::from_cents(5).to_string(), "0.05");
        assert_eq!(Amount::from_cents(-50).to_string(), "-0.50");
        assert_eq!(Amount::zero().to_string(), "0.00");
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let a = Amount::from_cents(500);
        let b = Amount::from_cents(200);

        assert_eq!((a + b).cents(), 700);
        assert_eq!((b - a).cents(), -300);
        assert_eq!((b * 3).cents(), 600);

        let total: Amount = [a, b, Amount::from_cents(50)].iter().sum();
        assert_eq!(total.cents(), 750);
    }

    /// Repeated subtraction stays exact where f64 would drift.
    #[test]
    fn test_no_drift_on_repeated_subtraction() {
        let mut remaining = Amount::from_cents(100);
        for _ in 0..10 {
            remaining -= Amount::from_cents(10);
        }
        assert!(remaining.is_zero());
    }

    #[test]
    fn test_serializes_as_cents() {
        let json = serde_json::to_string(&Amount::from_cents(150)).unwrap();
        assert_eq!(json, "150");
    }
}
