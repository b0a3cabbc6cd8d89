//! Saved payment card model.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{CardBrand, CardId};

/// A card on file. Only display details are kept; the number is never
/// stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedCard {
    /// Unique identifier.
    pub id: CardId,
    /// Last four digits of the card number.
    pub last4: String,
    /// Card network.
    pub brand: CardBrand,
    /// Expiry month (1-12).
    pub exp_month: u32,
    /// Expiry year (four digits).
    pub exp_year: i32,
    /// Whether this card is charged when no card is chosen.
    pub is_default: bool,
}

impl SavedCard {
    /// Returns `true` if the card is past its expiry month on `today`.
    ///
    /// Cards are valid through the last day of the expiry month.
    #[inline]
    #[must_use]
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        (today.year(), today.month()) > (self.exp_year, self.exp_month)
    }

    /// Returns a label such as `Visa ending 4242`.
    #[inline]
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} ending {}", self.brand, self.last4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(exp_month: u32, exp_year: i32) -> SavedCard {
        SavedCard {
            id: CardId::new("card_1".to_owned()),
            last4: "4242".to_owned(),
            brand: CardBrand::Visa,
            exp_month,
            exp_year,
            is_default: true,
        }
    }

    #[test]
    fn valid_through_end_of_month() {
        let c = card(6, 2025);
        assert!(!c.is_expired(NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()));
        assert!(c.is_expired(NaiveDate::from_ymd_opt(2025, 7, 1).unwrap()));
        assert!(!c.is_expired(NaiveDate::from_ymd_opt(2024, 12, 1).unwrap()));
    }

    #[test]
    fn label_shows_brand_and_last4() {
        assert_eq!(card(1, 2030).label(), "Visa ending 4242");
    }
}
