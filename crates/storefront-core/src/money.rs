//! # Money Module
//!
//! Provides the `Money` type for rupee amounts and the `TaxAccumulator`
//! used to sum GST at full precision.
//!
//! ## Why Integer Paise?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  The checkout page used to do:                                          │
//! │    1500 * 18 / 100 + 99 * 0.18 = 287.82000000000005  ❌                 │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Paise + Basis Points                            │
//! │    150000 paise × 1800 bps = 270000000 (exact, in 1/10000 paise)       │
//! │    Sum every line exactly, divide by 10000 ONCE at the end             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use storefront_core::money::Money;
//!
//! let price = Money::from_paise(49_900); // ₹499.00
//! let line = price * 3;                  // ₹1497.00
//! assert_eq!(line.to_string(), "₹1497.00");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

use crate::types::TaxRate;

/// Basis points in 100%.
const BPS_SCALE: i128 = 10_000;

/// Divides a value expressed in 1/10000 paise back to paise, rounding half
/// away from zero.
fn round_scaled(scaled: i128) -> i64 {
    let half = BPS_SCALE / 2;
    let rounded = if scaled >= 0 {
        (scaled + half) / BPS_SCALE
    } else {
        (scaled - half) / BPS_SCALE
    };
    rounded as i64
}

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in paise (1/100 of a rupee).
///
/// ## Design Decisions
/// - **i64 (signed)**: discounts can push a total below zero and that must
///   be representable rather than silently saturated
/// - **Single field tuple struct**: zero-cost abstraction over i64
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Product price ──► CartLine.unit_price ──► line total ──► subtotal     │
/// │                                                                         │
/// │  Placement / print surcharges ──► custom unit price                    │
/// │                                                                         │
/// │  subtotal ──► tax, shipping, wallet cap ──► CheckoutBreakdown.total    │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from paise.
    ///
    /// ```rust
    /// use storefront_core::money::Money;
    ///
    /// let price = Money::from_paise(99_900); // ₹999.00
    /// assert_eq!(price.paise(), 99_900);
    /// ```
    #[inline]
    pub const fn from_paise(paise: i64) -> Self {
        Money(paise)
    }

    /// Creates a Money value from whole rupees.
    #[inline]
    pub const fn from_rupees(rupees: i64) -> Self {
        Money(rupees * 100)
    }

    /// Converts a decimal rupee amount received from a remote service.
    ///
    /// Rounds half away from zero to the nearest paisa. This is only meant
    /// for the boundary where JSON numbers enter the system; arithmetic
    /// inside the crate never goes through `f64`.
    ///
    /// ```rust
    /// use storefront_core::money::Money;
    ///
    /// assert_eq!(Money::from_decimal(149.5).paise(), 14_950);
    /// assert_eq!(Money::from_decimal(0.1 + 0.2).paise(), 30);
    /// ```
    pub fn from_decimal(rupees: f64) -> Self {
        Money((rupees * 100.0).round() as i64)
    }

    /// Returns the value as a decimal rupee amount (for wire output only).
    pub fn to_decimal(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Returns the value in paise.
    #[inline]
    pub const fn paise(&self) -> i64 {
        self.0
    }

    /// Returns the whole-rupee portion (truncated toward zero).
    #[inline]
    pub const fn rupees(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the paise portion (always 0-99).
    #[inline]
    pub const fn paise_part(&self) -> i64 {
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

    /// Returns the smaller of two amounts.
    #[inline]
    pub fn min(self, other: Money) -> Money {
        Money(self.0.min(other.0))
    }

    /// Returns the larger of two amounts.
    #[inline]
    pub fn max(self, other: Money) -> Money {
        Money(self.0.max(other.0))
    }

    /// Applies a rate to this amount and rounds to the nearest paisa.
    ///
    /// Use this for a single, standalone percentage (the wallet cap, a
    /// per-line display figure). When several taxed amounts are summed,
    /// use [`TaxAccumulator`] instead so rounding happens once.
    ///
    /// ```rust
    /// use storefront_core::money::Money;
    /// use storefront_core::types::TaxRate;
    ///
    /// let subtotal = Money::from_rupees(2000);
    /// let cap = subtotal.percentage(TaxRate::from_bps(1000)); // 10%
    /// assert_eq!(cap, Money::from_rupees(200));
    /// ```
    pub fn percentage(&self, rate: TaxRate) -> Money {
        Money(round_scaled(self.0 as i128 * rate.bps() as i128))
    }

    /// Multiplies money by a quantity.
    #[inline]
    pub const fn multiply_quantity(&self, qty: u32) -> Self {
        Money(self.0 * qty as i64)
    }
}

// =============================================================================
// Tax Accumulator
// =============================================================================

/// Sums `amount × rate` terms without intermediate rounding.
///
/// Internally the running sum is kept in 1/10000 paise, which is exact for
/// any basis-point rate. [`TaxAccumulator::total`] rounds once.
///
/// ## Why?
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Three lines, each ₹0.03 at 18% = ₹0.0054                               │
/// │                                                                         │
/// │  Round per line:  0.01 + 0.01 + 0.01 = ₹0.03   ❌ (compounded)          │
/// │  Round once:      0.0162 → ₹0.02               ✅                        │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaxAccumulator {
    scaled: i128,
}

impl TaxAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `amount × rate` to the running sum.
    pub fn add(&mut self, amount: Money, rate: TaxRate) {
        self.scaled += amount.paise() as i128 * rate.bps() as i128;
    }

    /// Returns the accumulated tax rounded to the nearest paisa.
    pub fn total(&self) -> Money {
        Money(round_scaled(self.scaled))
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows the amount as `₹1770.00`. The client pages do their own
/// locale-aware formatting; this is for logs and receipts.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}₹{}.{:02}",
            sign,
            self.rupees().abs(),
            self.paise_part()
        )
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

/// Multiplication by a line quantity.
impl Mul<u32> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: u32) -> Self {
        Money(self.0 * qty as i64)
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
