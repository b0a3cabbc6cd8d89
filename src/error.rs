//! Error types for the playpass library.

use crate::models::{CardId, PhoneNumber, ProductId, PurchaseId, SessionId};
use crate::party::Countdown;

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, PlayPassError>;

/// All errors that can occur when operating a play center.
#[derive(Debug, thiserror::Error)]
pub enum PlayPassError {
    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Storage backend failed.
    #[error("storage error: {0}")]
    Storage(Box<dyn core::error::Error + Send + Sync>),

    /// User-supplied input was rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A check-in attempt was refused.
    #[error(transparent)]
    CheckIn(#[from] CheckInError),

    /// No customer is registered under the phone number.
    #[error("no customer registered for {0}")]
    CustomerNotFound(PhoneNumber),

    /// A customer is already registered under the phone number.
    #[error("a customer is already registered for {0}")]
    CustomerExists(PhoneNumber),

    /// The customer owns no purchase with this identifier.
    #[error("purchase not found: {0}")]
    PurchaseNotFound(PurchaseId),

    /// The customer has no open session with this identifier.
    #[error("no open session: {0}")]
    SessionNotFound(SessionId),

    /// The catalog has no product with this identifier.
    #[error("unknown product: {0}")]
    ProductNotFound(ProductId),

    /// The customer has no saved card with this identifier.
    #[error("saved card not found: {0}")]
    CardNotFound(CardId),

    /// The purchase is not a party package.
    #[error("purchase {0} is not a party package")]
    NotAParty(PurchaseId),

    /// The party has already been redeemed and cannot be rescheduled.
    #[error("party {0} has already been redeemed")]
    PartyRedeemed(PurchaseId),

    /// Auto-renewal was requested for a pass type that does not support it.
    #[error("auto-renewal is only offered on weekly and monthly passes")]
    RenewalUnsupported,
}

/// Rejected form input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Phone number is not a 10-digit US number.
    #[error("invalid phone number: {0}")]
    Phone(String),

    /// Email address is malformed.
    #[error("invalid email address: {0}")]
    Email(String),

    /// Name is blank or too long.
    #[error("name must be between 1 and 80 characters")]
    Name,

    /// Card number failed the checksum or has an unsupported length.
    #[error("card number is not valid")]
    CardNumber,

    /// Card security code is not 3 or 4 digits.
    #[error("card security code must be 3 or 4 digits")]
    CardCvc,

    /// Card expiry is malformed or in the past.
    #[error("card is expired or has an invalid expiry date")]
    CardExpiry,

    /// Guest count is outside the package limit.
    #[error("guest count must be between 1 and {max}")]
    GuestCount {
        /// Largest allowed guest count for the package.
        max: u32,
    },

    /// Party start is not in the future.
    #[error("party must be scheduled in the future")]
    PartyInPast,

    /// A lifecycle timing is outside its allowed range.
    #[error("config value {field} is out of range: {value} minutes")]
    ConfigRange {
        /// Config key as written in the JSON file.
        field: &'static str,
        /// Rejected value.
        value: i64,
    },

    /// A built-in pattern failed to compile.
    #[error("validation pattern error: {0}")]
    Pattern(String),
}

/// Reasons a pass cannot be used for check-in right now.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckInError {
    /// The purchase is not an admission (e.g. food).
    #[error("this purchase is not valid for admission")]
    NotAdmission,

    /// The pass has passed its expiry date.
    #[error("this pass has expired")]
    Expired,

    /// All sessions on the pass have been used.
    #[error("all sessions on this pass have been used")]
    Used,

    /// The pass already has an open session.
    #[error("already checked in on this pass")]
    AlreadyCheckedIn,

    /// The party has not been given a date yet.
    #[error("party needs to be scheduled before check-in")]
    NeedsScheduling,

    /// The party check-in window has not opened yet.
    #[error("too early: check-in opens in {0}")]
    TooEarly(Countdown),

    /// The party check-in window has closed.
    #[error("party check-in window closed")]
    WindowClosed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_from_serde_json() {
        let serde_err = serde_json::from_str::<String>("not json").unwrap_err();
        let err = PlayPassError::from(serde_err);
        assert!(matches!(err, PlayPassError::Serialization(_)));
        assert!(err.to_string().contains("serialization error"));
    }

    #[test]
    fn error_storage_display() {
        let inner = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err = PlayPassError::Storage(Box::new(inner));
        let msg = err.to_string();
        assert!(msg.contains("storage error"));
        assert!(msg.contains("file missing"));
    }

    #[test]
    fn validation_is_transparent() {
        let err = PlayPassError::from(ValidationError::GuestCount { max: 15 });
        assert_eq!(err.to_string(), "guest count must be between 1 and 15");
    }

    #[test]
    fn too_early_shows_countdown() {
        let err = CheckInError::TooEarly(Countdown::from_minutes(65));
        assert_eq!(err.to_string(), "too early: check-in opens in 1 hour, 5 minutes");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PlayPassError>();
    }
}
