//! # Money
//!
//! Amounts are integer centavos in an `i64`. Float arithmetic would let
//! a contrafactura balance drift by fractions and never reach exactly
//! zero, leaving a client blocked forever; with integers a paid-off
//! balance is exactly 0 and the delinquency gate opens.
//!
//! ## Usage
//! ```rust
//! use reparto_core::money::Money;
//!
//! let sale = Money::from_cents(10_000); // $100.00
//! let paid = Money::from_cents(4_000);  // $40.00
//!
//! // Balances clamp at zero instead of going negative
//! assert_eq!(sale.saturating_sub(paid).cents(), 6_000);
//! assert_eq!(paid.saturating_sub(sale), Money::zero());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary amount in centavos.
///
/// Signed because intermediate arithmetic may dip negative (the
/// creation-time `sale - payment` probe); stored values never do.
/// Serializes as a bare integer, which is what every `*Cents` wire
/// field carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
pub struct Money(i64);

impl Money {
    /// Wraps a centavo count.
    ///
    /// ## Example
    /// ```rust
    /// use reparto_core::money::Money;
    ///
    /// let amount = Money::from_cents(1099); // $10.99
    /// assert_eq!(amount.cents(), 1099);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// The raw centavo count, as it goes over the wire.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Whole-peso portion.
    #[inline]
    pub const fn pesos(&self) -> i64 {
        self.0 / 100
    }

    /// Centavo remainder, 0-99.
    #[inline]
    pub const fn centavos(&self) -> i64 {
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

    /// Subtracts, clamping the result at zero.
    ///
    /// This is the balance rule for payment postings: an outstanding
    /// balance is `sale_amount.saturating_sub(payment_amount)` and can
    /// never be observed negative.
    ///
    /// ## Example
    /// ```rust
    /// use reparto_core::money::Money;
    ///
    /// let sale = Money::from_cents(10_000);
    /// let paid = Money::from_cents(12_000);
    /// assert_eq!(sale.saturating_sub(paid), Money::zero());
    /// ```
    #[inline]
    pub const fn saturating_sub(self, other: Self) -> Self {
        let diff = self.0 - other.0;
        if diff < 0 {
            Money(0)
        } else {
            Money(diff)
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// `$123.45`, used in log lines and report output.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}.{:02}", sign, self.pesos().abs(), self.centavos())
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

/// Unclamped; the result may be negative. Balance computations that must
/// stay non-negative go through [`Money::saturating_sub`] instead.
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

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centavo_accessors() {
        let money = Money::from_cents(12_750);
        assert_eq!(money.cents(), 12_750);
        assert_eq!(money.pesos(), 127);
        assert_eq!(money.centavos(), 50);
    }

    #[test]
    fn test_display_formats_pesos() {
        assert_eq!(format!("{}", Money::from_cents(12_750)), "$127.50");
        assert_eq!(format!("{}", Money::from_cents(300)), "$3.00");
        assert_eq!(format!("{}", Money::from_cents(-1_205)), "-$12.05");
        assert_eq!(format!("{}", Money::zero()), "$0.00");
    }

    #[test]
    fn test_add_and_sub() {
        let a = Money::from_cents(8_000);
        let b = Money::from_cents(3_000);

        assert_eq!((a + b).cents(), 11_000);
        assert_eq!((a - b).cents(), 5_000);

        let mut c = a;
        c += b;
        assert_eq!(c.cents(), 11_000);
        c -= b;
        assert_eq!(c.cents(), 8_000);
    }

    #[test]
    fn test_unclamped_sub_can_go_negative() {
        let a = Money::from_cents(1_000);
        let b = Money::from_cents(1_500);
        assert_eq!((a - b).cents(), -500);
        assert!((a - b).is_negative());
    }

    #[test]
    fn test_saturating_sub_clamps_at_zero() {
        let sale = Money::from_cents(10_000);
        let partial = Money::from_cents(4_000);
        let over = Money::from_cents(12_000);

        assert_eq!(sale.saturating_sub(partial).cents(), 6_000);
        assert_eq!(sale.saturating_sub(over), Money::zero());
        assert_eq!(sale.saturating_sub(sale), Money::zero());
    }

    #[test]
    fn test_sign_probes() {
        assert!(Money::zero().is_zero());
        assert!(!Money::zero().is_positive());
        assert!(!Money::zero().is_negative());
        assert!(Money::from_cents(1).is_positive());
        assert!(Money::from_cents(-1).is_negative());
    }

    #[test]
    fn test_ordering() {
        // PartialOrd drives the over-payment check (amount > balance)
        assert!(Money::from_cents(7_000) > Money::from_cents(6_000));
        assert!(Money::from_cents(6_000) <= Money::from_cents(6_000));
    }
}
