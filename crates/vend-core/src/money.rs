//! # Money Module
//!
//! A `Money` value is one physical coin the machine accepts and pays out.
//!
//! ## Accepted Denominations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │   Denomination   Face value   Cents                                     │
//! │   ────────────   ──────────   ─────                                     │
//! │   Half              0.5          50                                     │
//! │   One               1.0         100                                     │
//! │   Two               2.0         200                                     │
//! │   Five              5.0         500                                     │
//! │   Ten              10.0        1000                                     │
//! │                                                                         │
//! │   Any other face value is rejected at construction.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use vend_core::money::{Denomination, Money};
//!
//! let coin = Money::new(2.0).unwrap();
//! assert_eq!(coin.denomination(), Denomination::Two);
//! assert!(Money::new(0.3).is_err());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::amount::Amount;
use crate::error::{CoreError, CoreResult};

// =============================================================================
// Denomination
// =============================================================================

/// Coin face values, declared in ascending order so the derived `Ord`
/// orders by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Denomination {
    Half,
    One,
    Two,
    Five,
    Ten,
}

impl Denomination {
    /// All denominations, smallest first.
    pub const ALL: [Denomination; 5] = [
        Denomination::Half,
        Denomination::One,
        Denomination::Two,
        Denomination::Five,
        Denomination::Ten,
    ];

    /// All denominations, largest first. This is the order change is paid in.
    pub const DESCENDING: [Denomination; 5] = [
        Denomination::Ten,
        Denomination::Five,
        Denomination::Two,
        Denomination::One,
        Denomination::Half,
    ];

    #[inline]
    pub const fn cents(self) -> i64 {
        match self {
            Denomination::Half => 50,
            Denomination::One => 100,
            Denomination::Two => 200,
            Denomination::Five => 500,
            Denomination::Ten => 1000,
        }
    }

    #[inline]
    pub const fn amount(self) -> Amount {
        Amount::from_cents(self.cents())
    }

    /// Face value as printed on the coin.
    #[inline]
    pub fn value(self) -> f64 {
        self.cents() as f64 / 100.0
    }

    /// Looks up the denomination with the given face value.
    ///
    /// ## Errors
    /// `CoreError::InvalidDenomination` when the value is not positive or is
    /// not one of 0.5, 1, 2, 5, 10.
    pub fn from_value(value: f64) -> CoreResult<Self> {
        let scaled = value * 100.0;
        if value.is_nan() || value <= 0.0 || !scaled.is_finite() || scaled.fract() != 0.0 {
            return Err(CoreError::InvalidDenomination { value });
        }

        let cents = scaled as i64;
        Denomination::ALL
            .into_iter()
            .find(|d| d.cents() == cents)
            .ok_or(CoreError::InvalidDenomination { value })
    }
}

impl fmt::Display for Denomination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.amount())
    }
}

// =============================================================================
// Money
// =============================================================================

/// One coin. Two coins of the same denomination are interchangeable.
///
/// Serializes as its face value (`2.0`); deserialization runs the same
/// validation as [`Money::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Money(Denomination);

impl Money {
    /// Creates a coin from its face value.
    ///
    /// ## Example
    /// ```rust
    /// use vend_core::money::Money;
    ///
    /// assert_eq!(Money::new(0.5).unwrap().amount().cents(), 50);
    /// assert!(Money::new(-1.0).is_err());
    /// assert!(Money::new(20.0).is_err());
    /// ```
    pub fn new(value: f64) -> CoreResult<Self> {
        Denomination::from_value(value).map(Money)
    }

    /// Creates a coin of a known denomination (infallible).
    #[inline]
    pub const fn of(denomination: Denomination) -> Self {
        Money(denomination)
    }

    #[inline]
    pub const fn denomination(&self) -> Denomination {
        self.0
    }

    #[inline]
    pub const fn amount(&self) -> Amount {
        self.0.amount()
    }

    #[inline]
    pub fn value(&self) -> f64 {
        self.0.value()
    }

    /// Sums the face values of a sequence of coins.
    pub fn total<'a, I>(coins: I) -> Amount
    where
        I: IntoIterator<Item = &'a Money>,
    {
        coins.into_iter().map(Money::amount).sum()
    }
}

impl From<Denomination> for Money {
    fn from(denomination: Denomination) -> Self {
        Money(denomination)
    }
}

impl TryFrom<f64> for Money {
    type Error = CoreError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Money::new(value)
    }
}

impl From<Money> for f64 {
    fn from(money: Money) -> Self {
        money.value()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
