//! Integer Money
//!
//! All monetary amounts are whole cents stored as `u64`. Percentages are
//! basis points (1/100 of a percent). No floating point touches money.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  $30.00 pool  = Cents(3000)                   │
//! │  7% share     = 700 bp                        │
//! │  payout       = 3000 * 700 / 10000 = 210      │
//! │               = $2.10                         │
//! └──────────────────────────────────────────────┘
//! ```

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub, AddAssign};
use serde::{Serialize, Deserialize};

/// Basis points: 10000 bp = 100%.
pub type BasisPoints = u32;

/// 100% in basis points.
pub const BPS_SCALE: BasisPoints = 10_000;

/// Monetary amount in whole cents.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cents(pub u64);

impl Cents {
    /// Zero amount.
    pub const ZERO: Self = Cents(0);

    /// Create from whole dollars.
    #[inline]
    pub const fn from_dollars(dollars: u64) -> Self {
        Cents(dollars * 100)
    }

    /// Check for zero.
    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Floor of `self * bps / 10000`.
    ///
    /// Computed in u128 so large pools cannot overflow.
    #[inline]
    pub fn share(self, bps: BasisPoints) -> Self {
        Cents(((self.0 as u128 * bps as u128) / BPS_SCALE as u128) as u64)
    }

    /// Subtraction that stops at zero.
    #[inline]
    pub fn saturating_sub(self, other: Self) -> Self {
        Cents(self.0.saturating_sub(other.0))
    }
}

impl fmt::Debug for Cents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cents({})", self.0)
    }
}

impl fmt::Display for Cents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Add for Cents {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Cents(self.0 + other.0)
    }
}

impl AddAssign for Cents {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Cents {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Cents(self.0 - other.0)
    }
}

impl Sum for Cents {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Cents::ZERO, |acc, c| acc + c)
    }
}
