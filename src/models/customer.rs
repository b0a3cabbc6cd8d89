//! Customer model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CardId, PhoneNumber, Purchase, PurchaseId, SavedCard, Session, SessionId};

/// A registered customer and everything they own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    /// Login key.
    pub phone: PhoneNumber,
    /// Full name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Registration time.
    pub created_at: DateTime<Utc>,
    /// Passes and items bought, oldest first.
    #[serde(default)]
    pub purchases: Vec<Purchase>,
    /// Open sessions.
    #[serde(default)]
    pub active_sessions: Vec<Session>,
    /// Cards on file.
    #[serde(default)]
    pub saved_cards: Vec<SavedCard>,
}

impl Customer {
    /// Creates a customer with no purchases, sessions or cards.
    #[inline]
    #[must_use]
    pub const fn new(
        phone: PhoneNumber,
        name: String,
        email: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            phone,
            name,
            email,
            created_at,
            purchases: Vec::new(),
            active_sessions: Vec::new(),
            saved_cards: Vec::new(),
        }
    }

    /// Looks up a purchase by ID.
    #[inline]
    #[must_use]
    pub fn purchase(&self, id: &PurchaseId) -> Option<&Purchase> {
        self.purchases.iter().find(|p| p.id == *id)
    }

    /// Looks up a purchase by full ID or unambiguous ID prefix.
    #[inline]
    #[must_use]
    pub fn purchase_by_prefix(&self, query: &str) -> Option<&Purchase> {
        unique(self.purchases.iter().filter(|p| p.id.matches_prefix(query)))
    }

    /// Looks up an open session by ID.
    #[inline]
    #[must_use]
    pub fn session(&self, id: &SessionId) -> Option<&Session> {
        self.active_sessions.iter().find(|s| s.id == *id)
    }

    /// Looks up an open session by full ID or unambiguous ID prefix.
    #[inline]
    #[must_use]
    pub fn session_by_prefix(&self, query: &str) -> Option<&Session> {
        unique(self.active_sessions.iter().filter(|s| s.id.matches_prefix(query)))
    }

    /// Returns the open session on a given pass, if any.
    #[inline]
    #[must_use]
    pub fn open_session_for(&self, purchase_id: &PurchaseId) -> Option<&Session> {
        self.active_sessions
            .iter()
            .find(|s| s.purchase_id == *purchase_id)
    }

    /// Looks up a saved card by ID.
    #[inline]
    #[must_use]
    pub fn card(&self, id: &CardId) -> Option<&SavedCard> {
        self.saved_cards.iter().find(|c| c.id == *id)
    }

    /// Looks up a saved card by full ID or unambiguous ID prefix.
    #[inline]
    #[must_use]
    pub fn card_by_prefix(&self, query: &str) -> Option<&SavedCard> {
        unique(self.saved_cards.iter().filter(|c| c.id.matches_prefix(query)))
    }

    /// Returns the default card, if any.
    #[inline]
    #[must_use]
    pub fn default_card(&self) -> Option<&SavedCard> {
        self.saved_cards.iter().find(|c| c.is_default)
    }

    /// Returns a copy with `purchase` replacing the stored purchase of the
    /// same ID, or appended if new.
    #[inline]
    #[must_use]
    pub fn with_purchase(mut self, purchase: Purchase) -> Self {
        if let Some(slot) = self.purchases.iter_mut().find(|p| p.id == purchase.id) {
            *slot = purchase;
        } else {
            self.purchases.push(purchase);
        }
        self
    }
}

/// Returns the single item of `iter`, or `None` if it is empty or
/// ambiguous.
fn unique<T, I: Iterator<Item = T>>(mut iter: I) -> Option<T> {
    let first = iter.next()?;
    iter.next().is_none().then_some(first)
}
