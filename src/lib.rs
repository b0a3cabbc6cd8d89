//! Pass and session lifecycle for a children's play center front desk.
//!
//! The crate sells admission passes, party packages and café items,
//! checks visitors in and out, expires passes on schedule and aggregates
//! the admin dashboard. [`play_center::PlayCenter`] and
//! [`play_center::PlayCenterBlocking`] tie the pure lifecycle rules in
//! [`lifecycle`] and [`party`] to a pluggable [`storage`] backend.
//!
//! ```rust
//! # fn main() -> playpass::error::Result<()> {
//! use playpass::models::ProductId;
//! use playpass::payment::PaymentMethod;
//! use playpass::play_center::PlayCenterBlocking;
//! use playpass::storage::InMemoryStorage;
//!
//! let center = PlayCenterBlocking::builder()
//!     .storage(InMemoryStorage::new())
//!     .build()?;
//! let ada = center.register_customer("555-123-4567", "Ada Park", "ada@example.com")?;
//! let sale = center.purchase(&ada.phone, &ProductId::from("day-pass"), &PaymentMethod::Cash)?;
//! let session = center.check_in(&ada.phone, &sale.purchase.id)?;
//! let visit = center.check_out(&ada.phone, &session.id)?;
//! assert_eq!(visit.purchase_id, sale.purchase.id);
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod clock;
pub mod config;
pub mod demo;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod party;
pub mod payment;
pub mod play_center;
pub mod report;
pub mod storage;
pub mod validation;
