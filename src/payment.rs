//! Simulated payment processing.
//!
//! Nothing is charged. A payment is "authorized" once its method passes
//! validation; the artificial processing delay is applied by the front end.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PlayPassError, ValidationError};
use crate::models::{CardId, Customer, Money, ReceiptId, SavedCard};
use crate::validation::{card_brand, validate_card_expiry, validate_card_number, validate_cvc};

/// Card details typed at the counter.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardInput {
    /// Full card number. Spaces and dashes are allowed.
    pub number: String,
    /// Expiry month (1-12).
    pub exp_month: u32,
    /// Expiry year, two or four digits.
    pub exp_year: i32,
    /// Security code.
    pub cvc: String,
}

impl core::fmt::Debug for CardInput {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CardInput")
            .field("number", &"[REDACTED]")
            .field("exp_month", &self.exp_month)
            .field("exp_year", &self.exp_year)
            .field("cvc", &"[REDACTED]")
            .finish()
    }
}

impl CardInput {
    /// Validates the card and turns it into a saved card record.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] if the number, security code or
    /// expiry is invalid on `today`.
    #[inline]
    pub fn validate(
        &self,
        today: NaiveDate,
        is_default: bool,
    ) -> Result<SavedCard, ValidationError> {
        let digits = validate_card_number(&self.number)?;
        validate_cvc(&self.cvc)?;
        let (exp_month, exp_year) = validate_card_expiry(self.exp_month, self.exp_year, today)?;
        let last4: String = digits
            .chars()
            .skip(digits.len().saturating_sub(4))
            .collect();
        Ok(SavedCard {
            id: CardId::generate(),
            last4,
            brand: card_brand(&digits),
            exp_month,
            exp_year,
            is_default,
        })
    }
}

/// How a purchase is paid for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "method")]
pub enum PaymentMethod {
    /// Cash at the counter.
    Cash,
    /// A card already on file.
    SavedCard {
        /// Card to charge.
        card: CardId,
    },
    /// A card typed in for this purchase.
    NewCard {
        /// Card details.
        card: CardInput,
        /// Keep the card on file after the purchase.
        save: bool,
    },
}

/// Proof of a simulated payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    /// Unique receipt identifier.
    pub id: ReceiptId,
    /// Amount charged.
    pub amount: Money,
    /// Human-readable payment method, e.g. `Visa ending 4242`.
    pub method: String,
    /// Short authorization code printed on the receipt.
    pub authorization_code: String,
    /// When the payment was authorized.
    pub authorized_at: DateTime<Utc>,
}

/// Result of authorizing a payment for a customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorization {
    /// Receipt for the payment.
    pub receipt: PaymentReceipt,
    /// A new card to store on the customer, when requested.
    pub card_to_save: Option<SavedCard>,
}

/// Authorizes `amount` from `customer` using `method`.
///
/// # Errors
///
/// - [`PlayPassError::CardNotFound`] if a saved card does not exist.
/// - [`ValidationError::CardExpiry`] if a saved card has expired.
/// - Any [`ValidationError`] from a new card's details.
#[inline]
pub fn authorize(
    customer: &Customer,
    amount: Money,
    method: &PaymentMethod,
    now: DateTime<Utc>,
) -> Result<Authorization, PlayPassError> {
    let today = now.date_naive();
    let (label, card_to_save) = match method.clone() {
        PaymentMethod::Cash => ("Cash".to_owned(), None),
        PaymentMethod::SavedCard { card } => {
            let saved = customer
                .card(&card)
                .ok_or(PlayPassError::CardNotFound(card))?;
            if saved.is_expired(today) {
                return Err(ValidationError::CardExpiry.into());
            }
            (saved.label(), None)
        }
        PaymentMethod::NewCard { card, save } => {
            let is_default = customer.saved_cards.is_empty();
            let validated = card.validate(today, is_default)?;
            (validated.label(), save.then_some(validated))
        }
    };
    let id = ReceiptId::generate();
    let authorization_code: String = id
        .as_inner()
        .chars()
        .rev()
        .take(6)
        .collect::<String>()
        .to_uppercase();
    tracing::debug!(receipt = %id, %amount, method = %label, "payment authorized");
    Ok(Authorization {
        receipt: PaymentReceipt {
            id,
            amount,
            method: label,
            authorization_code,
            authorized_at: now,
        },
        card_to_save,
    })
}
