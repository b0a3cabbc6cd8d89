//! Purchase (pass) model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Money, PassType, Product, ProductId, PurchaseId, PurchaseStatus};

/// Number of check-ins a pass grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "count")]
pub enum SessionAllowance {
    /// Unlimited check-ins until the pass expires.
    Unlimited,
    /// A fixed number of check-ins.
    Limited(u32),
}

impl SessionAllowance {
    /// Returns `true` when the allowance is consumed by session count
    /// rather than only by time.
    ///
    /// Single-use and unlimited passes stay active until they expire;
    /// only multi-session packs become `used`.
    #[inline]
    #[must_use]
    pub const fn exhausts_by_count(self) -> bool {
        matches!(self, Self::Limited(total) if total > 1)
    }

    /// Returns how many check-ins remain after `used`, or `None` when
    /// unlimited.
    #[inline]
    #[must_use]
    pub const fn remaining(self, used: u32) -> Option<u32> {
        match self {
            Self::Unlimited => None,
            Self::Limited(total) => Some(total.saturating_sub(used)),
        }
    }
}

impl core::fmt::Display for SessionAllowance {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match *self {
            Self::Unlimited => f.write_str("unlimited"),
            Self::Limited(total) => write!(f, "{total}"),
        }
    }
}

/// Date, time and guest list attached to a party package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyDetails {
    /// Scheduled start of the party.
    pub start: DateTime<Utc>,
    /// Number of child guests.
    pub guests: u32,
    /// Name of the birthday child, if given.
    pub child_name: Option<String>,
    /// Free-form notes for the party host.
    pub notes: Option<String>,
}

/// Scheduling sub-state of a party package.
///
/// `schedule` is `None` while the party still needs scheduling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyBooking {
    /// Largest guest count included in the package.
    pub max_guests: u32,
    /// Date and guest details, once scheduled.
    pub schedule: Option<PartyDetails>,
}

impl PartyBooking {
    /// Returns `true` while no date has been chosen.
    #[inline]
    #[must_use]
    pub const fn needs_scheduling(&self) -> bool {
        self.schedule.is_none()
    }
}

/// A purchased pass or item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    /// Unique identifier.
    pub id: PurchaseId,
    /// Catalog product this purchase was made from.
    pub product: ProductId,
    /// Display name copied from the catalog at purchase time.
    pub name: String,
    /// Kind of product.
    #[serde(rename = "type")]
    pub pass_type: PassType,
    /// Price paid.
    pub price: Money,
    /// When the purchase was made.
    pub purchase_date: DateTime<Utc>,
    /// First check-in. Set once and never changed.
    pub first_use_date: Option<DateTime<Utc>>,
    /// Expiry computed from the first check-in.
    pub actual_expiry_date: Option<DateTime<Utc>>,
    /// Check-ins made so far.
    pub used_sessions: u32,
    /// Check-ins granted.
    pub total_sessions: SessionAllowance,
    /// Stored status.
    pub status: PurchaseStatus,
    /// Auto-renewal preference. Stored only; no renewal is performed.
    #[serde(default)]
    pub auto_renew: bool,
    /// Scheduling state for party packages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party: Option<PartyBooking>,
}

impl Purchase {
    /// Creates a fresh, unused purchase of `product` made at `now`.
    ///
    /// Food is consumed at the counter and is recorded as `used` straight
    /// away.
    #[inline]
    #[must_use]
    pub fn from_product(product: &Product, now: DateTime<Utc>) -> Self {
        let status = if product.pass_type.is_admission() {
            PurchaseStatus::Active
        } else {
            PurchaseStatus::Used
        };
        Self {
            id: PurchaseId::generate(),
            product: product.id.clone(),
            name: product.name.clone(),
            pass_type: product.pass_type,
            price: product.price,
            purchase_date: now,
            first_use_date: None,
            actual_expiry_date: None,
            used_sessions: 0,
            total_sessions: product.sessions,
            status,
            auto_renew: false,
            party: product.max_guests.map(|max_guests| PartyBooking {
                max_guests,
                schedule: None,
            }),
        }
    }

    /// Returns `true` if the pass has never been checked in.
    #[inline]
    #[must_use]
    pub const fn is_unused(&self) -> bool {
        self.first_use_date.is_none()
    }

    /// Returns `true` if the stored status is `active`.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == PurchaseStatus::Active
    }

    /// Returns the scheduled party details, if any.
    #[inline]
    #[must_use]
    pub fn party_details(&self) -> Option<&PartyDetails> {
        self.party.as_ref().and_then(|booking| booking.schedule.as_ref())
    }

    /// Check-ins left, or `None` when unlimited.
    #[inline]
    #[must_use]
    pub const fn remaining_sessions(&self) -> Option<u32> {
        self.total_sessions.remaining(self.used_sessions)
    }
}
