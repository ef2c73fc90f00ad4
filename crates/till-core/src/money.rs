//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Drawer reconciliation must balance to the last unit:                   │
//! │    opening + cash sales - expenses = closing                            │
//! │                                                                         │
//! │  With floats, 0.1 + 0.2 = 0.30000000000000004 and the drawer never     │
//! │  balances. With integer minor units it always does.                    │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units (i64)                                │
//! │    500000 + 250000 - 50000 = 700000, exactly                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use till_core::money::Money;
//!
//! let opening = Money::from_minor(500_000);
//! let sales = Money::from_minor(250_000);
//! let expenses = Money::from_minor(50_000);
//!
//! assert_eq!((opening + sales - expenses).minor(), 700_000);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::types::RevenueRatio;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest unit of the drawer's currency.
///
/// ## Design Decisions
/// - **i64 (signed)**: a drawer can go negative if expenses exceed cash
/// - **Single field tuple struct**: serializes as a bare JSON number
///
/// ## Where Money Flows
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Shift.opening_float ─────────┐                                         │
/// │  Ledger cash payments ──► Shift.cash_sales_total ──┬──► closing_cash    │
/// │  Expense.amount ──► ExpenseLedger.total() ─────────┘                    │
/// │                                                                         │
/// │  Shift.cash_sales_total ──► split() ──► provider / business shares      │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::Money;
    ///
    /// let float = Money::from_minor(500_000);
    /// assert_eq!(float.minor(), 500_000);
    /// ```
    #[inline]
    pub const fn from_minor(amount: i64) -> Self {
        Money(amount)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
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

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Addition that returns `None` instead of overflowing.
    #[inline]
    pub const fn checked_add(&self, other: Money) -> Option<Money> {
        match self.0.checked_add(other.0) {
            Some(sum) => Some(Money(sum)),
            None => None,
        }
    }

    /// Addition clamped to the `i64` range.
    #[inline]
    pub const fn saturating_add(&self, other: Money) -> Money {
        Money(self.0.saturating_add(other.0))
    }

    /// Applies a basis-point ratio, rounding half away from zero.
    ///
    /// ## Implementation
    /// Integer math in i128: `(|amount| * bps + 5000) / 10000`, sign restored
    /// afterwards so that `-x` rounds to exactly `-(x rounded)`.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::Money;
    /// use till_core::types::RevenueRatio;
    ///
    /// let sales = Money::from_minor(250_000);
    /// let provider = sales.apply_ratio(RevenueRatio::from_bps(7000));
    /// assert_eq!(provider.minor(), 175_000);
    ///
    /// // 0.70 * 5 = 3.5 rounds away from zero
    /// assert_eq!(Money::from_minor(5).apply_ratio(RevenueRatio::from_bps(7000)).minor(), 4);
    /// ```
    pub fn apply_ratio(&self, ratio: RevenueRatio) -> Money {
        let magnitude = (self.0 as i128).abs();
        let scaled = (magnitude * ratio.bps() as i128 + 5000) / 10000;
        let signed = if self.0 < 0 { -scaled } else { scaled };
        Money(signed as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Minor units with thousands separators, e.g. `-1,250,000`.
///
/// For logs only; the frontend owns currency formatting.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }
        if self.0 < 0 {
            write!(f, "-{}", grouped)
        } else {
            write!(f, "{}", grouped)
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

/// Saturates at the `i64` bounds rather than overflowing, so totals over
/// untrusted ledger rows never panic. Validated figures stay far below them.
impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc.saturating_add(m))
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
