//! # Money Module
//!
//! Provides the `Money` type and the zero-guarded ratio helpers every
//! other module uses.
//!
//! ## Rounding Policy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ROUND ONCE, AT PRESENTATION                                            │
//! │                                                                         │
//! │  Inputs are whole currency units (yen), so sums stay exact:            │
//! │    sales + sales + sales ...           → Money (i64, exact)            │
//! │                                                                         │
//! │  Divisions produce f64 and are NOT rounded inside the engine:          │
//! │    average ticket, run rate            → f64                           │
//! │                                                                         │
//! │  The presentation layer calls Money::from_rounded(x) exactly once,     │
//! │  so rounding error never compounds across sums.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Zero-Guard Rule
//! `ratio_pct(n, 0)` is `0.0`, never NaN or infinity. An empty or
//! sales-free period is a normal, displayable state.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary amount in whole currency units.
///
/// ## Design Decisions
/// - **i64 (signed)**: profit can be negative even though every input
///   amount is validated `>= 0`
/// - **Whole units**: restaurant records are entered in yen; there is no
///   minor unit to track
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from whole currency units.
    ///
    /// ## Example
    /// ```rust
    /// use tenpo_core::money::Money;
    ///
    /// let sales = Money::from_units(100_000);
    /// assert_eq!(sales.units(), 100_000);
    /// ```
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Money(units)
    }

    /// Rounds a fractional amount to the nearest whole unit.
    ///
    /// Halves round away from zero. Non-finite input maps to zero.
    ///
    /// ## Example
    /// ```rust
    /// use tenpo_core::money::Money;
    ///
    /// assert_eq!(Money::from_rounded(90_909.09).units(), 90_909);
    /// assert_eq!(Money::from_rounded(2.5).units(), 3);
    /// assert_eq!(Money::from_rounded(f64::NAN).units(), 0);
    /// ```
    pub fn from_rounded(amount: f64) -> Self {
        if !amount.is_finite() {
            return Money::zero();
        }
        Money(amount.round() as i64)
    }

    /// Returns the value in whole currency units.
    #[inline]
    pub const fn units(&self) -> i64 {
        self.0
    }

    /// Returns the value as f64 for ratio math.
    #[inline]
    pub fn as_f64(&self) -> f64 {
        self.0 as f64
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Clamps negative values to zero.
    ///
    /// Used for "remaining to target", which is never negative.
    #[inline]
    pub const fn non_negative(&self) -> Self {
        if self.0 < 0 {
            Money(0)
        } else {
            Money(self.0)
        }
    }

    /// Expresses `self` as a percentage of `whole`.
    ///
    /// ## Example
    /// ```rust
    /// use tenpo_core::money::Money;
    ///
    /// let purchase = Money::from_units(30_000);
    /// let sales = Money::from_units(100_000);
    /// assert_eq!(purchase.percent_of(sales), 30.0);
    /// assert_eq!(purchase.percent_of(Money::zero()), 0.0);
    /// ```
    #[inline]
    pub fn percent_of(&self, whole: Money) -> f64 {
        if whole.is_positive() {
            ratio_pct(self.as_f64(), whole.as_f64())
        } else {
            0.0
        }
    }

    /// Divides evenly across `parts`, returning an unrounded figure.
    ///
    /// Zero parts yields `0.0`.
    #[inline]
    pub fn per(&self, parts: u64) -> f64 {
        safe_div(self.as_f64(), parts as f64)
    }
}

// =============================================================================
// Zero-Guarded Ratio Helpers
// =============================================================================

/// `numerator / denominator`, or `0.0` when the denominator is zero.
#[inline]
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// `numerator / denominator * 100`, or `0.0` when the denominator is zero.
#[inline]
pub fn ratio_pct(numerator: f64, denominator: f64) -> f64 {
    safe_div(numerator, denominator) * 100.0
}

/// Percentage change from `previous` to `current`.
///
/// Only a positive `previous` is a usable base; zero or negative yields `0.0`.
#[inline]
pub fn growth_pct(current: Money, previous: Money) -> f64 {
    if previous.units() <= 0 {
        return 0.0;
    }
    ratio_pct((current - previous).as_f64(), previous.as_f64())
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-oriented display. Locale formatting belongs to the frontend.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 < 0 {
            write!(f, "-¥{}", self.0.unsigned_abs())
        } else {
            write!(f, "¥{}", self.0)
        }
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
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

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
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
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
