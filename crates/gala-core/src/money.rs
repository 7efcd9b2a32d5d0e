//! # Money Module
//!
//! Provides the `Money` type for every amount that flows through a quote.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE SPLIT PROBLEM                                                      │
//! │                                                                         │
//! │  Transport of 100.00 spread over 3 product lines:                       │
//! │    100.00 / 3 = 33.33 (×3 = 99.99)  → Lost 0.01!                        │
//! │                                                                         │
//! │  A quote shows BOTH the authoritative total and the per-line            │
//! │  breakdown, so a lost unit becomes two different totals on paper.     │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units + largest-remainder allocation       │
//! │    10000 / 3 → [3334, 3333, 3333]  (sum = 10000, always)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use gala_core::money::Money;
//!
//! let transport = Money::from_minor(10_000);
//! let shares = transport.split_even(3).unwrap();
//! assert_eq!(shares.iter().copied().sum::<Money>(), transport);
//! ```

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::pricing::Rate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: intermediate differences (reconciliation deltas) can be negative
/// - **Single field tuple struct**: serializes as a plain JSON number
/// - **No float constructor**: amounts enter the system already in minor units
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Catalog rate ──► PricedItem.cost ──► CostSummary.{category}           │
/// │                        │                     │                          │
/// │                        │                     └──► subtotal ──► total   │
/// │                        ▼                                                │
/// │               Redistributor shares ──► ProductLine.final_cost          │
/// │                                                                         │
/// │  Both paths must agree to the last minor unit.                         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a value from minor units (cents, centavos...).
    ///
    /// ## Example
    /// ```rust
    /// use gala_core::money::Money;
    ///
    /// let fee = Money::from_minor(150_000);
    /// assert_eq!(fee.minor(), 150_000);
    /// ```
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Creates a value from whole major units.
    #[inline]
    pub const fn from_major(major: i64) -> Self {
        Money(major * 100)
    }

    /// Returns the raw amount in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion (truncated toward zero).
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

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

    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Applies a percentage rate, rounding half away from zero.
    ///
    /// The product is exact decimal arithmetic: `amount × pct / 100`, rounded
    /// once at the end. Saturates at the `i64` range; the calculators use
    /// [`Money::checked_apply_rate`].
    ///
    /// ## Example
    /// ```rust
    /// use gala_core::money::Money;
    /// use gala_core::pricing::Rate;
    ///
    /// let subtotal = Money::from_minor(1_600_000);
    /// let margin = subtotal.apply_rate(Rate::from_bps(3000)); // 30%
    /// assert_eq!(margin.minor(), 480_000);
    /// ```
    pub fn apply_rate(&self, rate: Rate) -> Money {
        self.checked_apply_rate(rate).unwrap_or(if self.0 < 0 {
            Money(i64::MIN)
        } else {
            Money(i64::MAX)
        })
    }

    /// Applies a percentage rate, rounding half away from zero. Returns
    /// `None` when the result does not fit in `i64`.
    pub fn checked_apply_rate(&self, rate: Rate) -> Option<Money> {
        Decimal::from(self.0)
            .checked_mul(rate.as_decimal())?
            .checked_div(Decimal::ONE_HUNDRED)?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .map(Money)
    }

    /// Multiplies by a (possibly fractional) quantity, rounding half away
    /// from zero. Returns `None` when the result does not fit in `i64`.
    ///
    /// ## Example
    /// ```rust
    /// use gala_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// let hourly = Money::from_minor(2_500);
    /// let cost = hourly.checked_mul_quantity(Decimal::new(45, 1)).unwrap(); // 4.5 h
    /// assert_eq!(cost.minor(), 11_250);
    /// ```
    pub fn checked_mul_quantity(&self, quantity: Decimal) -> Option<Money> {
        Decimal::from(self.0)
            .checked_mul(quantity)?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .map(Money)
    }

    /// Adds two amounts. Returns `None` on overflow.
    #[inline]
    pub fn checked_add(&self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Multiplies by an integer count. Returns `None` on overflow.
    #[inline]
    pub fn checked_mul_count(&self, count: i64) -> Option<Money> {
        self.0.checked_mul(count).map(Money)
    }

    /// Splits the amount into shares proportional to `weights`.
    ///
    /// Shares are floored, then the leftover minor units go to the shares
    /// with the largest fractional remainder (ties: lowest index). The sum of
    /// the returned shares is always exactly `self`.
    ///
    /// Returns `None` when there are no weights, any weight is negative, or
    /// all weights are zero.
    ///
    /// ## Example
    /// ```rust
    /// use gala_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// let rental = Money::from_minor(1_000);
    /// let shares = rental
    ///     .allocate(&[Decimal::from(1), Decimal::from(2)])
    ///     .unwrap();
    /// assert_eq!(shares, vec![Money::from_minor(333), Money::from_minor(667)]);
    /// ```
    pub fn allocate(&self, weights: &[Decimal]) -> Option<Vec<Money>> {
        if weights.is_empty() || weights.iter().any(|w| w.is_sign_negative() && !w.is_zero()) {
            return None;
        }

        let total_weight = weights
            .iter()
            .try_fold(Decimal::ZERO, |acc, w| acc.checked_add(*w))?;
        if total_weight.is_zero() {
            return None;
        }

        let amount = Decimal::from(self.0);
        let mut shares = Vec::with_capacity(weights.len());
        let mut remainders = Vec::with_capacity(weights.len());
        let mut allocated: i64 = 0;

        for (index, weight) in weights.iter().enumerate() {
            let exact = amount.checked_mul(*weight)?.checked_div(total_weight)?;
            let floor = exact.floor();
            let share = floor.to_i64()?;
            allocated = allocated.checked_add(share)?;
            remainders.push((exact - floor, index));
            shares.push(share);
        }

        // Fractional parts sum to the leftover, so it is always < weights.len()
        let leftover = usize::try_from(self.0 - allocated).ok()?;
        remainders.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        for (_, index) in remainders.iter().take(leftover) {
            shares[*index] += 1;
        }

        Some(shares.into_iter().map(Money).collect())
    }

    /// Splits the amount into `parts` equal shares (see [`Money::allocate`]).
    pub fn split_even(&self, parts: usize) -> Option<Vec<Money>> {
        self.allocate(&vec![Decimal::ONE; parts])
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-oriented rendering (`-1234.56`). Currency symbols and locale
/// grouping belong to the document layer.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor_part())
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
    fn mul(self, count: i64) -> Self {
        Money(self.0 * count)
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_minor() {
        let money = Money::from_minor(1099);
        assert_eq!(money.minor(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor_part(), 99);
        assert_eq!(Money::from_major(15).minor(), 1500);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_minor(1099).to_string(), "10.99");
        assert_eq!(Money::from_minor(-550).to_string(), "-5.50");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let a = Money::from_minor(1000);
        let b = Money::from_minor(500);

        assert_eq!((a + b).minor(), 1500);
        assert_eq!((a - b).minor(), 500);
        assert_eq!((a * 3).minor(), 3000);
        assert_eq!([a, b, b].iter().sum::<Money>().minor(), 2000);
    }

    #[test]
    fn test_apply_rate_rounds_half_away_from_zero() {
        // 1000 × 8.25% = 82.5 → 83
        assert_eq!(Money::from_minor(1000).apply_rate(Rate::from_bps(825)).minor(), 83);
        assert_eq!(Money::from_minor(-1000).apply_rate(Rate::from_bps(825)).minor(), -83);
        assert_eq!(Money::from_minor(1000).apply_rate(Rate::zero()).minor(), 0);
    }

    #[test]
    fn test_apply_rate_uses_the_exact_percentage() {
        // 800_000 × 33.333% = 266_664, not 800_000 × 33.33%
        let rate = Rate::from_percentage(33.333);
        assert_eq!(Money::from_minor(800_000).apply_rate(rate).minor(), 266_664);
        // 1 × 0.005% = 0.00005 → 0; 10_000 × 0.005% = 0.5 → 1
        let tiny = Rate::from_percentage(0.005);
        assert_eq!(Money::from_minor(1).apply_rate(tiny).minor(), 0);
        assert_eq!(Money::from_minor(10_000).apply_rate(tiny).minor(), 1);
    }

    #[test]
    fn test_checked_apply_rate_overflow() {
        let max = Money::from_minor(i64::MAX);
        assert!(max.checked_apply_rate(Rate::from_bps(20_000)).is_none());
        assert_eq!(max.apply_rate(Rate::from_bps(20_000)), max);
        assert_eq!(max.checked_apply_rate(Rate::from_bps(10_000)), Some(max));
    }

    #[test]
    fn test_checked_mul_quantity() {
        let hourly = Money::from_minor(333);
        // 333 × 1.5 = 499.5 → 500
        assert_eq!(
            hourly.checked_mul_quantity(Decimal::new(15, 1)),
            Some(Money::from_minor(500))
        );
        assert!(Money::from_minor(i64::MAX)
            .checked_mul_quantity(Decimal::from(10))
            .is_none());
    }

    #[test]
    fn test_split_even_keeps_every_unit() {
        let shares = Money::from_minor(10_000).split_even(3).unwrap();
        assert_eq!(
            shares,
            vec![
                Money::from_minor(3334),
                Money::from_minor(3333),
                Money::from_minor(3333)
            ]
        );
        assert_eq!(shares.iter().sum::<Money>().minor(), 10_000);
    }

    #[test]
    fn test_allocate_largest_remainder() {
        // 100 over weights 1:1:1:1:3 → exact 14.28.. ×4, 42.85..
        let weights = [1, 1, 1, 1, 3].map(Decimal::from);
        let shares = Money::from_minor(100).allocate(&weights).unwrap();
        assert_eq!(shares.iter().sum::<Money>().minor(), 100);
        assert_eq!(shares[4].minor(), 43);
    }

    #[test]
    fn test_allocate_zero_weight_never_receives_units() {
        let weights = [Decimal::ZERO, Decimal::ONE, Decimal::ONE];
        let shares = Money::from_minor(5).allocate(&weights).unwrap();
        assert_eq!(shares[0], Money::zero());
        assert_eq!(shares.iter().sum::<Money>().minor(), 5);
    }

    #[test]
    fn test_allocate_rejects_degenerate_weights() {
        let amount = Money::from_minor(100);
        assert!(amount.allocate(&[]).is_none());
        assert!(amount.allocate(&[Decimal::ZERO, Decimal::ZERO]).is_none());
        assert!(amount.allocate(&[Decimal::ONE, Decimal::NEGATIVE_ONE]).is_none());
        assert!(amount.split_even(0).is_none());
    }

    /// Naive division drops a unit, largest-remainder allocation does not.
    #[test]
    fn test_naive_division_loses_a_unit() {
        let naive: Money = Money::from_minor(1000 / 3) * 3;
        assert_eq!(naive.minor(), 999);

        let allocated: Money = Money::from_minor(1000).split_even(3).unwrap().into_iter().sum();
        assert_eq!(allocated.minor(), 1000);
    }
}
