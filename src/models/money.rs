//! Money amounts in whole cents.

use serde::{Deserialize, Serialize};

/// Number of cents in a dollar.
const CENTS_PER_DOLLAR: u64 = 100;

/// A non-negative amount of US dollars, stored as cents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    /// Zero dollars.
    pub const ZERO: Self = Self(0);

    /// Creates an amount from cents.
    #[inline]
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Creates an amount from whole dollars.
    #[inline]
    #[must_use]
    pub const fn from_dollars(dollars: u64) -> Self {
        Self(dollars.saturating_mul(CENTS_PER_DOLLAR))
    }

    /// Returns the amount in cents.
    #[inline]
    #[must_use]
    pub const fn cents(self) -> u64 {
        self.0
    }

    /// Adds two amounts, saturating at the maximum.
    #[inline]
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl core::fmt::Display for Money {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let dollars = self.0.div_euclid(CENTS_PER_DOLLAR);
        let cents = self.0.rem_euclid(CENTS_PER_DOLLAR);
        write!(f, "${dollars}.{cents:02}")
    }
}

impl core::ops::Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        self.saturating_add(rhs)
    }
}

impl core::iter::Sum for Money {
    #[inline]
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Self::saturating_add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_pads_cents() {
        assert_eq!(Money::from_cents(2_505).to_string(), "$25.05");
        assert_eq!(Money::from_dollars(3).to_string(), "$3.00");
        assert_eq!(Money::ZERO.to_string(), "$0.00");
    }

    #[test]
    fn sum_adds_amounts() {
        let total: Money = [Money::from_cents(150), Money::from_dollars(2)].into_iter().sum();
        assert_eq!(total.cents(), 350);
    }
}
