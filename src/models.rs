//! Data models for play center entities.
//!
//! This module contains strongly-typed representations of customers,
//! purchases, sessions and cards, newtype ID wrappers, and enumeration
//! types for constrained values.

mod card;
mod customer;
mod enums;
mod ids;
mod money;
mod phone;
mod product;
mod purchase;
mod session;

pub use card::SavedCard;
pub use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
pub use customer::Customer;
pub use enums::{CardBrand, CheckoutReason, PassType, PurchaseStatus};
pub use ids::{CardId, ProductId, PurchaseId, ReceiptId, SessionId};
pub use money::Money;
pub use phone::PhoneNumber;
pub use product::Product;
pub use purchase::{PartyBooking, PartyDetails, Purchase, SessionAllowance};
pub use session::{CompletedVisit, Session};
