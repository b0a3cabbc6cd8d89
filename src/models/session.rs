//! Check-in session models.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::{CheckoutReason, PhoneNumber, PurchaseId, SessionId};

/// An open visit on the play floor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Unique identifier.
    pub id: SessionId,
    /// Pass the visitor checked in with.
    pub purchase_id: PurchaseId,
    /// Pass name at check-in, for display.
    pub pass_name: String,
    /// Check-in time.
    pub start_time: DateTime<Utc>,
    /// Time at which the session is closed automatically.
    pub auto_checkout_time: DateTime<Utc>,
}

impl Session {
    /// Returns `true` once `now` is past the auto-checkout time.
    #[inline]
    #[must_use]
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        now > self.auto_checkout_time
    }

    /// Time spent so far, never negative.
    #[inline]
    #[must_use]
    pub fn elapsed(&self, now: DateTime<Utc>) -> TimeDelta {
        (now - self.start_time).max(TimeDelta::zero())
    }
}

/// A closed visit, kept in the visit log for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedVisit {
    /// Identifier of the session that was closed.
    pub session_id: SessionId,
    /// Customer the session belonged to.
    pub customer: PhoneNumber,
    /// Pass the visitor checked in with.
    pub purchase_id: PurchaseId,
    /// Pass name at check-in.
    pub pass_name: String,
    /// Check-in time.
    pub start_time: DateTime<Utc>,
    /// Checkout time. Never earlier than `start_time`.
    pub end_time: DateTime<Utc>,
    /// How the session was closed.
    pub reason: CheckoutReason,
}

impl CompletedVisit {
    /// Length of the visit.
    #[inline]
    #[must_use]
    pub fn duration(&self) -> TimeDelta {
        self.end_time - self.start_time
    }
}
