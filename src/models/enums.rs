//! Enumeration types for constrained values.

use serde::{Deserialize, Serialize};

/// Kind of product a purchase grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PassType {
    /// Single day of play.
    Day,
    /// Seven days of play.
    Weekly,
    /// Thirty days of play.
    Monthly,
    /// Scheduled party package.
    Party,
    /// Café item, not an admission.
    Food,
}

impl PassType {
    /// All pass types, in catalog order.
    pub const ALL: [Self; 5] = [Self::Day, Self::Weekly, Self::Monthly, Self::Party, Self::Food];

    /// Returns `true` if this type grants entry to the play floor.
    #[inline]
    #[must_use]
    pub const fn is_admission(self) -> bool {
        !matches!(self, Self::Food)
    }

    /// Returns `true` if auto-renewal may be toggled for this type.
    #[inline]
    #[must_use]
    pub const fn is_renewable(self) -> bool {
        matches!(self, Self::Weekly | Self::Monthly)
    }

    /// Returns a short human-readable label.
    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Party => "party",
            Self::Food => "food",
        }
    }
}

impl core::fmt::Display for PassType {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

/// Stored status of a purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PurchaseStatus {
    /// Usable (possibly not yet used).
    Active,
    /// Past its expiry date. Terminal.
    Expired,
    /// All sessions consumed. Terminal.
    Used,
}

impl PurchaseStatus {
    /// Returns `true` for the terminal states.
    #[inline]
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Expired | Self::Used)
    }
}

impl core::fmt::Display for PurchaseStatus {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match *self {
            Self::Active => "active",
            Self::Expired => "expired",
            Self::Used => "used",
        })
    }
}

/// Card network, detected from the card number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CardBrand {
    /// Visa (prefix 4).
    Visa,
    /// Mastercard (prefixes 51-55, 2221-2720).
    Mastercard,
    /// American Express (prefixes 34, 37).
    Amex,
    /// Discover (prefixes 6011, 65).
    Discover,
    /// Any other network.
    Other,
}

impl core::fmt::Display for CardBrand {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match *self {
            Self::Visa => "Visa",
            Self::Mastercard => "Mastercard",
            Self::Amex => "Amex",
            Self::Discover => "Discover",
            Self::Other => "Card",
        })
    }
}

/// How a session was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CheckoutReason {
    /// Staff checked the visitor out.
    Manual,
    /// The session reached its auto-checkout time.
    Auto,
}
