//! High-level play center facade with integrated storage.
//!
//! [`PlayCenter`] (async) and [`PlayCenterBlocking`] expose every front
//! desk operation. Each one loads the affected customer, brings expiry and
//! auto-checkout up to date, applies the transition and writes the result
//! back.

use chrono::{DateTime, NaiveDate, Utc};

use crate::catalog::Catalog;
use crate::error::{PlayPassError, Result};
use crate::lifecycle::refresh_customer;
use crate::models::{
    CardId, CompletedVisit, Customer, PartyDetails, ProductId, Purchase, PurchaseId, SavedCard,
};
use crate::party::schedule;
use crate::payment::{CardInput, PaymentMethod, PaymentReceipt, authorize};
use crate::validation::{validate_email, validate_name};

/// A completed sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sale {
    /// The new purchase as stored on the customer.
    pub purchase: Purchase,
    /// Payment receipt.
    pub receipt: PaymentReceipt,
}

/// Outcome of sweeping all customers for expiry and auto-checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepReport {
    /// When the sweep ran.
    pub at: DateTime<Utc>,
    /// When the sweep before this one ran, if any.
    pub previous: Option<DateTime<Utc>>,
    /// Customers examined.
    pub customers: usize,
    /// Passes that expired.
    pub expired: Vec<PurchaseId>,
    /// Sessions closed automatically.
    pub auto_checked_out: Vec<CompletedVisit>,
}

/// Refreshes every customer, returning the changed ones and the report.
fn sweep_customers(
    customers: &[Customer],
    now: DateTime<Utc>,
    previous: Option<DateTime<Utc>>,
) -> (Vec<Customer>, SweepReport) {
    let mut changed = Vec::new();
    let mut report = SweepReport {
        at: now,
        previous,
        customers: customers.len(),
        expired: Vec::new(),
        auto_checked_out: Vec::new(),
    };
    for customer in customers {
        let refresh = refresh_customer(customer, now);
        if refresh.changed() {
            report.expired.extend(refresh.expired);
            report.auto_checked_out.extend(refresh.auto_checked_out);
            changed.push(refresh.customer);
        }
    }
    (changed, report)
}

/// Sells `product` to `customer`.
fn sell(
    customer: &Customer,
    catalog: &Catalog,
    product: &ProductId,
    method: &PaymentMethod,
    now: DateTime<Utc>,
) -> Result<(Customer, Sale)> {
    let item = catalog
        .find(product)
        .ok_or_else(|| PlayPassError::ProductNotFound(product.clone()))?;
    let auth = authorize(customer, item.price, method, now)?;
    let purchase = Purchase::from_product(item, now);
    let mut updated = customer.clone();
    if let Some(card) = auth.card_to_save {
        updated.saved_cards.push(card);
    }
    updated.purchases.push(purchase.clone());
    tracing::info!(
        customer = %customer.phone,
        purchase = %purchase.id,
        product = %item.id,
        amount = %item.price,
        "sold"
    );
    Ok((
        updated,
        Sale {
            purchase,
            receipt: auth.receipt,
        },
    ))
}

/// Applies a profile edit.
fn with_profile(customer: &Customer, name: Option<&str>, email: Option<&str>) -> Result<Customer> {
    let mut updated = customer.clone();
    if let Some(raw) = name {
        updated.name = validate_name(raw)?;
    }
    if let Some(raw) = email {
        updated.email = validate_email(raw)?;
    }
    Ok(updated)
}

/// Adds a validated card. The first card on file becomes the default.
fn with_card(
    customer: &Customer,
    input: &CardInput,
    today: NaiveDate,
) -> Result<(Customer, SavedCard)> {
    let card = input.validate(today, customer.saved_cards.is_empty())?;
    let mut updated = customer.clone();
    updated.saved_cards.push(card.clone());
    Ok((updated, card))
}

/// Removes a card, promoting the next one if the default was removed.
fn without_card(customer: &Customer, card: &CardId) -> Result<Customer> {
    let was_default = customer
        .card(card)
        .ok_or_else(|| PlayPassError::CardNotFound(card.clone()))?
        .is_default;
    let mut updated = customer.clone();
    updated.saved_cards.retain(|c| c.id != *card);
    if was_default && let Some(next) = updated.saved_cards.first_mut() {
        next.is_default = true;
    }
    Ok(updated)
}

/// Makes `card` the only default card.
fn with_default_card(customer: &Customer, card: &CardId) -> Result<Customer> {
    if customer.card(card).is_none() {
        return Err(PlayPassError::CardNotFound(card.clone()));
    }
    let mut updated = customer.clone();
    for saved in &mut updated.saved_cards {
        saved.is_default = saved.id == *card;
    }
    Ok(updated)
}

/// Stores the auto-renew preference on a weekly or monthly pass.
fn with_auto_renew(
    customer: &Customer,
    purchase: &PurchaseId,
    enabled: bool,
) -> Result<(Customer, Purchase)> {
    let current = customer
        .purchase(purchase)
        .ok_or_else(|| PlayPassError::PurchaseNotFound(purchase.clone()))?;
    if !current.pass_type.is_renewable() {
        return Err(PlayPassError::RenewalUnsupported);
    }
    let updated = Purchase {
        auto_renew: enabled,
        ..current.clone()
    };
    Ok((customer.clone().with_purchase(updated.clone()), updated))
}

/// Schedules a party package owned by `customer`.
fn with_party_schedule(
    customer: &Customer,
    purchase: &PurchaseId,
    details: PartyDetails,
    now: DateTime<Utc>,
) -> Result<(Customer, Purchase)> {
    let current = customer
        .purchase(purchase)
        .ok_or_else(|| PlayPassError::PurchaseNotFound(purchase.clone()))?;
    let scheduled = schedule(current, details, now)?;
    Ok((customer.clone().with_purchase(scheduled.clone()), scheduled))
}

/// Generates a play center facade (async or blocking).
macro_rules! define_play_center {
    (
        center_name: $center:ident,
        builder_name: $builder:ident,
        storage_trait: $storage_trait:ident,
        center_doc: $center_doc:expr,
        builder_doc: $builder_doc:expr,
        $(async_kw: $async_kw:tt,)?
        $(await_kw: $await_ext:tt,)?
    ) => {
        #[doc = $builder_doc]
        #[derive(Debug)]
        pub struct $builder<S: $storage_trait> {
            /// Storage backend.
            storage: Option<S>,
            /// Timing rules.
            config: Option<LifecycleConfig>,
            /// Products on sale.
            catalog: Option<Catalog>,
            /// Source of "now".
            clock: Option<Box<dyn Clock>>,
        }

        impl<S: $storage_trait> $builder<S> {
            /// Sets the storage backend.
            #[inline]
            #[must_use]
            pub fn storage(mut self, storage: S) -> Self {
                self.storage = Some(storage);
                self
            }

            /// Overrides the timing rules.
            #[inline]
            #[must_use]
            pub fn config(mut self, config: LifecycleConfig) -> Self {
                self.config = Some(config);
                self
            }

            /// Overrides the product catalog.
            #[inline]
            #[must_use]
            pub fn catalog(mut self, catalog: Catalog) -> Self {
                self.catalog = Some(catalog);
                self
            }

            /// Overrides the clock (defaults to the system clock).
            #[inline]
            #[must_use]
            pub fn clock<C: Clock + 'static>(mut self, clock: C) -> Self {
                self.clock = Some(Box::new(clock));
                self
            }

            /// Builds the play center.
            ///
            /// # Errors
            ///
            /// - [`PlayPassError::Storage`] if no storage was provided.
            /// - [`PlayPassError::Validation`] if a timing in the config is
            ///   out of range.
            #[inline]
            pub fn build(self) -> Result<$center<S>> {
                let storage = self.storage.ok_or_else(|| {
                    PlayPassError::Storage("storage backend is required".into())
                })?;
                let config = self.config.unwrap_or_default();
                config.validate()?;
                Ok($center {
                    storage,
                    config,
                    catalog: self.catalog.unwrap_or_default(),
                    clock: self.clock.unwrap_or_else(|| Box::new(SystemClock)),
                })
            }
        }

        #[doc = $center_doc]
        #[derive(Debug)]
        pub struct $center<S: $storage_trait> {
            /// Storage backend.
            storage: S,
            /// Timing rules.
            config: LifecycleConfig,
            /// Products on sale.
            catalog: Catalog,
            /// Source of "now".
            clock: Box<dyn Clock>,
        }

        impl<S: $storage_trait> $center<S> {
            /// Creates a new builder for configuring the play center.
            #[inline]
            #[must_use]
            pub const fn builder() -> $builder<S> {
                $builder {
                    storage: None,
                    config: None,
                    catalog: None,
                    clock: None,
                }
            }

            /// Returns the current time according to the configured clock.
            #[inline]
            #[must_use]
            pub fn now(&self) -> DateTime<Utc> {
                self.clock.now()
            }

            /// Returns the timing rules.
            #[inline]
            #[must_use]
            pub const fn config(&self) -> &LifecycleConfig {
                &self.config
            }

            /// Returns the products on sale.
            #[inline]
            #[must_use]
            pub const fn catalog(&self) -> &Catalog {
                &self.catalog
            }

            /// Returns a reference to the storage backend.
            #[inline]
            #[must_use]
            pub const fn storage(&self) -> &S {
                &self.storage
            }

            // ── Customers ────────────────────────────────────────────

            /// Registers a new customer.
            ///
            /// # Errors
            ///
            /// - [`PlayPassError::Validation`] if phone, name or email is
            ///   invalid.
            /// - [`PlayPassError::CustomerExists`] if the phone number is
            ///   already registered.
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn register_customer(
                &self,
                phone: &str,
                name: &str,
                email: &str,
            ) -> Result<Customer> {
                let phone_number = PhoneNumber::parse(phone)?;
                let customer = Customer::new(
                    phone_number.clone(),
                    validate_name(name)?,
                    validate_email(email)?,
                    self.now(),
                );
                if self.storage.customer(&phone_number) $( .$await_ext )? ?.is_some() {
                    return Err(PlayPassError::CustomerExists(phone_number));
                }
                self.storage.upsert_customers(vec![customer.clone()]) $( .$await_ext )? ?;
                tracing::info!(customer = %phone_number, "registered customer");
                Ok(customer)
            }

            /// Looks up a customer by phone number, with expiry and
            /// auto-checkout applied.
            ///
            /// # Errors
            ///
            /// Returns [`PlayPassError::CustomerNotFound`] if no customer
            /// is registered under the number.
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn find_customer(&self, phone: &PhoneNumber) -> Result<Customer> {
                self.load(phone, self.now()) $( .$await_ext )?
            }

            /// Changes a customer's name and/or email.
            ///
            /// # Errors
            ///
            /// Returns an error if the customer does not exist or the new
            /// values are invalid.
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn update_profile(
                &self,
                phone: &PhoneNumber,
                name: Option<&str>,
                email: Option<&str>,
            ) -> Result<Customer> {
                let customer = self.load(phone, self.now()) $( .$await_ext )? ?;
                let updated = with_profile(&customer, name, email)?;
                self.save(updated.clone()) $( .$await_ext )? ?;
                Ok(updated)
            }

            /// Returns customers matching `filter`, after sweeping all
            /// customers.
            ///
            /// # Errors
            ///
            /// Returns an error if the storage backend fails.
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn customers(
                &self,
                filter: &CustomerFilter,
            ) -> Result<Vec<Customer>> {
                let _report = self.sweep() $( .$await_ext )? ?;
                let all = self.storage.customers() $( .$await_ext )? ?;
                Ok(filter.apply(&all).into_iter().cloned().collect())
            }

            // ── Sales ────────────────────────────────────────────────

            /// Sells a catalog product to a customer.
            ///
            /// # Errors
            ///
            /// - [`PlayPassError::CustomerNotFound`] /
            ///   [`PlayPassError::ProductNotFound`] for unknown IDs.
            /// - Payment errors from [`crate::payment::authorize`].
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn purchase(
                &self,
                phone: &PhoneNumber,
                product: &ProductId,
                method: &PaymentMethod,
            ) -> Result<Sale> {
                let now = self.now();
                let customer = self.load(phone, now) $( .$await_ext )? ?;
                let (updated, sale) = sell(&customer, &self.catalog, product, method, now)?;
                self.save(updated) $( .$await_ext )? ?;
                Ok(sale)
            }

            // ── Check-in / out ───────────────────────────────────────

            /// Checks a customer in on one of their passes.
            ///
            /// # Errors
            ///
            /// - [`PlayPassError::CustomerNotFound`] /
            ///   [`PlayPassError::PurchaseNotFound`] for unknown IDs.
            /// - [`PlayPassError::CheckIn`] if the pass cannot be used now.
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn check_in(
                &self,
                phone: &PhoneNumber,
                purchase: &PurchaseId,
            ) -> Result<Session> {
                let now = self.now();
                let customer = self.load(phone, now) $( .$await_ext )? ?;
                let (updated, session) = check_in_customer(&customer, purchase, now, &self.config)?;
                self.save(updated) $( .$await_ext )? ?;
                tracing::info!(customer = %phone, session = %session.id, "checked in");
                Ok(session)
            }

            /// Checks a customer out of an open session and logs the visit.
            ///
            /// # Errors
            ///
            /// Returns [`PlayPassError::SessionNotFound`] if the session is
            /// not open (including sessions already auto-checked-out).
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn check_out(
                &self,
                phone: &PhoneNumber,
                session: &SessionId,
            ) -> Result<CompletedVisit> {
                let now = self.now();
                let customer = self.load(phone, now) $( .$await_ext )? ?;
                let (updated, visit) = check_out_customer(&customer, session, now)?;
                self.storage.record_visits(vec![visit.clone()]) $( .$await_ext )? ?;
                self.save(updated) $( .$await_ext )? ?;
                tracing::info!(
                    customer = %phone,
                    session = %visit.session_id,
                    minutes = visit.duration().num_minutes(),
                    "checked out"
                );
                Ok(visit)
            }

            // ── Parties ──────────────────────────────────────────────

            /// Attaches a date and guest details to a party package.
            ///
            /// # Errors
            ///
            /// Returns an error if the purchase is unknown, not a party,
            /// already redeemed, or the details are invalid.
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn schedule_party(
                &self,
                phone: &PhoneNumber,
                purchase: &PurchaseId,
                details: PartyDetails,
            ) -> Result<Purchase> {
                let now = self.now();
                let customer = self.load(phone, now) $( .$await_ext )? ?;
                let (updated, party) = with_party_schedule(&customer, purchase, details, now)?;
                self.save(updated) $( .$await_ext )? ?;
                Ok(party)
            }

            /// Reports whether a party can be checked in right now.
            ///
            /// # Errors
            ///
            /// Returns [`PlayPassError::NotAParty`] if the purchase is not a
            /// party package, or a lookup error for unknown IDs.
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn party_window(
                &self,
                phone: &PhoneNumber,
                purchase: &PurchaseId,
            ) -> Result<CheckInWindow> {
                let now = self.now();
                let customer = self.load(phone, now) $( .$await_ext )? ?;
                let party = customer
                    .purchase(purchase)
                    .ok_or_else(|| PlayPassError::PurchaseNotFound(purchase.clone()))?;
                CheckInWindow::for_purchase(party, now, &self.config)
                    .ok_or_else(|| PlayPassError::NotAParty(purchase.clone()))
            }

            // ── Cards and preferences ────────────────────────────────

            /// Saves a card on file. The first card becomes the default.
            ///
            /// # Errors
            ///
            /// Returns a validation error for a bad card, or a lookup error.
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn add_card(
                &self,
                phone: &PhoneNumber,
                input: &CardInput,
            ) -> Result<SavedCard> {
                let now = self.now();
                let customer = self.load(phone, now) $( .$await_ext )? ?;
                let (updated, card) = with_card(&customer, input, now.date_naive())?;
                self.save(updated) $( .$await_ext )? ?;
                Ok(card)
            }

            /// Removes a card on file, promoting the next card if the
            /// default was removed.
            ///
            /// # Errors
            ///
            /// Returns [`PlayPassError::CardNotFound`] for an unknown card.
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn remove_card(
                &self,
                phone: &PhoneNumber,
                card: &CardId,
            ) -> Result<Customer> {
                let customer = self.load(phone, self.now()) $( .$await_ext )? ?;
                let updated = without_card(&customer, card)?;
                self.save(updated.clone()) $( .$await_ext )? ?;
                Ok(updated)
            }

            /// Makes a card the default payment card.
            ///
            /// # Errors
            ///
            /// Returns [`PlayPassError::CardNotFound`] for an unknown card.
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn set_default_card(
                &self,
                phone: &PhoneNumber,
                card: &CardId,
            ) -> Result<Customer> {
                let customer = self.load(phone, self.now()) $( .$await_ext )? ?;
                let updated = with_default_card(&customer, card)?;
                self.save(updated.clone()) $( .$await_ext )? ?;
                Ok(updated)
            }

            /// Stores the auto-renew preference on a weekly or monthly pass.
            ///
            /// The preference is recorded only; passes are never renewed.
            ///
            /// # Errors
            ///
            /// Returns [`PlayPassError::RenewalUnsupported`] for other pass
            /// types, or a lookup error.
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn set_auto_renew(
                &self,
                phone: &PhoneNumber,
                purchase: &PurchaseId,
                enabled: bool,
            ) -> Result<Purchase> {
                let customer = self.load(phone, self.now()) $( .$await_ext )? ?;
                let (updated, pass) = with_auto_renew(&customer, purchase, enabled)?;
                self.save(updated) $( .$await_ext )? ?;
                Ok(pass)
            }

            // ── Maintenance and reporting ────────────────────────────

            /// Expires due passes and closes overdue sessions for every
            /// customer.
            ///
            /// # Errors
            ///
            /// Returns an error if the storage backend fails.
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn sweep(&self) -> Result<SweepReport> {
                let now = self.now();
                let previous = self.storage.last_sweep() $( .$await_ext )? ?;
                let customers = self.storage.customers() $( .$await_ext )? ?;
                let (changed, report) = sweep_customers(&customers, now, previous);
                self.storage.record_visits(report.auto_checked_out.clone()) $( .$await_ext )? ?;
                self.storage.upsert_customers(changed) $( .$await_ext )? ?;
                self.storage.set_last_sweep(now) $( .$await_ext )? ?;
                tracing::debug!(
                    customers = report.customers,
                    expired = report.expired.len(),
                    auto_checked_out = report.auto_checked_out.len(),
                    "sweep finished"
                );
                Ok(report)
            }

            /// Returns the completed visit log, oldest first.
            ///
            /// # Errors
            ///
            /// Returns an error if the storage backend fails to read.
            #[inline]
            pub $($async_kw)? fn visits(&self) -> Result<Vec<CompletedVisit>> {
                self.storage.visits() $( .$await_ext )?
            }

            /// Computes the admin dashboard, after sweeping all customers.
            ///
            /// # Errors
            ///
            /// Returns an error if the storage backend fails.
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn dashboard(&self) -> Result<DashboardStats> {
                let report = self.sweep() $( .$await_ext )? ?;
                let customers = self.storage.customers() $( .$await_ext )? ?;
                let visits = self.storage.visits() $( .$await_ext )? ?;
                Ok(DashboardStats::compute(
                    &customers,
                    &visits,
                    report.at,
                    self.config.party_window(),
                ))
            }

            /// Loads the development seed into storage.
            ///
            /// Existing customers with the same phone numbers are replaced.
            /// Returns the number of customers written.
            ///
            /// # Errors
            ///
            /// Returns an error if the catalog lacks a standard product or
            /// the storage backend fails.
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn load_demo(&self) -> Result<usize> {
                let data = demo::seed(self.now(), &self.catalog, &self.config)?;
                let count = data.customers.len();
                self.storage.upsert_customers(data.customers) $( .$await_ext )? ?;
                self.storage.record_visits(data.visits) $( .$await_ext )? ?;
                Ok(count)
            }

            /// Deletes every customer, the visit log and the sweep time.
            ///
            /// # Errors
            ///
            /// Returns an error if the storage backend fails to write.
            #[tracing::instrument(skip_all)]
            pub $($async_kw)? fn reset(&self) -> Result<()> {
                self.storage.clear() $( .$await_ext )? ?;
                tracing::warn!("all play center data removed");
                Ok(())
            }

            // ── Private helpers ──────────────────────────────────────

            /// Loads one customer and persists any expiry or auto-checkout
            /// that is due at `now`.
            $($async_kw)? fn load(
                &self,
                phone: &PhoneNumber,
                now: DateTime<Utc>,
            ) -> Result<Customer> {
                let stored = self
                    .storage
                    .customer(phone)
                    $( .$await_ext )?
                    ?
                    .ok_or_else(|| PlayPassError::CustomerNotFound(phone.clone()))?;
                let refresh = refresh_customer(&stored, now);
                if refresh.changed() {
                    self.storage.record_visits(refresh.auto_checked_out) $( .$await_ext )? ?;
                    self.save(refresh.customer.clone()) $( .$await_ext )? ?;
                }
                Ok(refresh.customer)
            }

            /// Writes one customer back to storage.
            $($async_kw)? fn save(&self, customer: Customer) -> Result<()> {
                self.storage.upsert_customers(vec![customer]) $( .$await_ext )?
            }
        }
    };
}

// ── Async variant ───────────────────────────────────────────────────────

#[cfg(feature = "async")]
mod async_play_center {
    //! Async play center.

    use crate::catalog::Catalog;
    use crate::clock::{Clock, SystemClock};
    use crate::config::LifecycleConfig;
    use crate::demo;
    use crate::error::{PlayPassError, Result};
    use crate::lifecycle::{check_in_customer, check_out_customer, refresh_customer};
    use crate::models::{
        CardId, CompletedVisit, Customer, PartyDetails, PhoneNumber, ProductId, Purchase,
        PurchaseId, SavedCard, Session, SessionId,
    };
    use crate::party::CheckInWindow;
    use crate::payment::{CardInput, PaymentMethod};
    use crate::report::{CustomerFilter, DashboardStats};
    use crate::storage::Storage;
    use crate::validation::{validate_email, validate_name};
    use chrono::{DateTime, Utc};

    use super::{
        Sale, SweepReport, sell, sweep_customers, with_auto_renew, with_card, with_default_card,
        with_party_schedule, with_profile, without_card,
    };

    define_play_center! {
        center_name: PlayCenter,
        builder_name: PlayCenterBuilder,
        storage_trait: Storage,
        center_doc: "Async play center with integrated storage.\n\nUse [`PlayCenter::builder()`] to construct an instance.",
        builder_doc: "Builder for constructing a [`PlayCenter`].",
        async_kw: async,
        await_kw: await,
    }
}

// ── Blocking variant ────────────────────────────────────────────────────

#[cfg(feature = "blocking")]
mod blocking_play_center {
    //! Blocking play center.

    use crate::catalog::Catalog;
    use crate::clock::{Clock, SystemClock};
    use crate::config::LifecycleConfig;
    use crate::demo;
    use crate::error::{PlayPassError, Result};
    use crate::lifecycle::{check_in_customer, check_out_customer, refresh_customer};
    use crate::models::{
        CardId, CompletedVisit, Customer, PartyDetails, PhoneNumber, ProductId, Purchase,
        PurchaseId, SavedCard, Session, SessionId,
    };
    use crate::party::CheckInWindow;
    use crate::payment::{CardInput, PaymentMethod};
    use crate::report::{CustomerFilter, DashboardStats};
    use crate::storage::BlockingStorage;
    use crate::validation::{validate_email, validate_name};
    use chrono::{DateTime, Utc};

    use super::{
        Sale, SweepReport, sell, sweep_customers, with_auto_renew, with_card, with_default_card,
        with_party_schedule, with_profile, without_card,
    };

    define_play_center! {
        center_name: PlayCenterBlocking,
        builder_name: PlayCenterBlockingBuilder,
        storage_trait: BlockingStorage,
        center_doc: "Blocking play center with integrated storage.\n\nUse [`PlayCenterBlocking::builder()`] to construct an instance.",
        builder_doc: "Builder for constructing a [`PlayCenterBlocking`].",
    }
}

#[cfg(feature = "async")]
pub use async_play_center::{PlayCenter, PlayCenterBuilder};
#[cfg(feature = "blocking")]
pub use blocking_play_center::{PlayCenterBlocking, PlayCenterBlockingBuilder};

#[cfg(test)]
mod tests {
    use core::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use chrono::TimeDelta;

    use super::*;
    use crate::clock::ManualClock;
    use crate::config::LifecycleConfig;
    use crate::error::{CheckInError, ValidationError};
    use crate::models::{CheckoutReason, PhoneNumber, PurchaseStatus};
    use crate::party::CheckInWindow;
    use crate::report::CustomerFilter;
    use crate::storage::InMemoryStorage;

    // ── Test helpers ───────────────────────────────────────────────────

    fn start() -> DateTime<Utc> {
        DateTime::from_timestamp(1_750_000_000, 0).unwrap()
    }

    fn phone() -> PhoneNumber {
        PhoneNumber::parse("5551234567").unwrap()
    }

    fn card(number: &str) -> CardInput {
        CardInput {
            number: number.to_owned(),
            exp_month: 12,
            exp_year: 2030,
            cvc: "123".to_owned(),
        }
    }

    #[cfg(feature = "blocking")]
    mod blocking {
        use super::*;
        use crate::play_center::PlayCenterBlocking;
        use crate::storage::BlockingStorage;

        type Center = PlayCenterBlocking<InMemoryStorage>;

        fn center() -> (Center, Arc<ManualClock>) {
            let clock = Arc::new(ManualClock::new(start()));
            let center = PlayCenterBlocking::builder()
                .storage(InMemoryStorage::new())
                .clock(Arc::clone(&clock))
                .build()
                .unwrap();
            (center, clock)
        }

        fn registered() -> (Center, Arc<ManualClock>) {
            let (center, clock) = center();
            let _customer = center
                .register_customer("(555) 123-4567", "Ada Park", "ada@example.com")
                .unwrap();
            (center, clock)
        }

        fn buy(center: &Center, product: &str) -> Purchase {
            center
                .purchase(&phone(), &ProductId::from(product), &PaymentMethod::Cash)
                .unwrap()
                .purchase
        }

        #[test]
        fn build_requires_storage() {
            let result = PlayCenterBlocking::<InMemoryStorage>::builder().build();
            assert!(matches!(result, Err(PlayPassError::Storage(_))));
        }

        #[test]
        fn register_rejects_duplicates_and_bad_input() {
            let (center, _clock) = registered();
            let duplicate = center.register_customer("555-123-4567", "Someone", "x@example.com");
            assert!(matches!(duplicate, Err(PlayPassError::CustomerExists(_))));
            let bad_phone = center.register_customer("12345", "Ben", "ben@example.com");
            assert!(matches!(
                bad_phone,
                Err(PlayPassError::Validation(ValidationError::Phone(_)))
            ));
            let bad_email = center.register_customer("5559876543", "Ben", "ben@");
            assert!(matches!(
                bad_email,
                Err(PlayPassError::Validation(ValidationError::Email(_)))
            ));
            assert_eq!(center.customers(&CustomerFilter::new()).unwrap().len(), 1);
        }

        #[test]
        fn unknown_customer_is_reported() {
            let (center, _clock) = center();
            let result = center.find_customer(&phone());
            assert!(matches!(result, Err(PlayPassError::CustomerNotFound(_))));
        }

        #[test]
        fn update_profile_validates() {
            let (center, _clock) = registered();
            let updated = center
                .update_profile(&phone(), Some("Ada Lovelace"), None)
                .unwrap();
            assert_eq!(updated.name, "Ada Lovelace");
            assert_eq!(updated.email, "ada@example.com");
            let bad = center.update_profile(&phone(), None, Some("nope"));
            assert!(matches!(bad, Err(PlayPassError::Validation(_))));
            assert_eq!(center.find_customer(&phone()).unwrap().name, "Ada Lovelace");
        }

        #[test]
        fn day_pass_visit_is_logged() {
            let (center, clock) = registered();
            let pass = buy(&center, "day-pass");
            let session = center.check_in(&phone(), &pass.id).unwrap();
            let again = center.check_in(&phone(), &pass.id);
            assert!(matches!(
                again,
                Err(PlayPassError::CheckIn(CheckInError::AlreadyCheckedIn))
            ));

            clock.advance(TimeDelta::minutes(90));
            let visit = center.check_out(&phone(), &session.id).unwrap();
            assert_eq!(visit.duration(), TimeDelta::minutes(90));
            assert_eq!(visit.reason, CheckoutReason::Manual);

            let customer = center.find_customer(&phone()).unwrap();
            assert!(customer.active_sessions.is_empty());
            let stored = customer.purchase(&pass.id).unwrap();
            assert_eq!(stored.first_use_date, Some(start()));
            assert_eq!(stored.actual_expiry_date, Some(start() + TimeDelta::hours(12)));
            assert_eq!(center.visits().unwrap(), vec![visit]);
        }

        #[test]
        fn overdue_session_closes_on_lookup() {
            let (center, clock) = registered();
            let pass = buy(&center, "day-pass");
            let session = center.check_in(&phone(), &pass.id).unwrap();

            clock.advance(TimeDelta::hours(13));
            let customer = center.find_customer(&phone()).unwrap();
            assert!(customer.active_sessions.is_empty());
            assert_eq!(
                customer.purchase(&pass.id).unwrap().status,
                PurchaseStatus::Expired
            );

            let visits = center.visits().unwrap();
            assert_eq!(visits.len(), 1);
            assert_eq!(visits[0].reason, CheckoutReason::Auto);
            assert_eq!(visits[0].end_time, start() + TimeDelta::hours(12));

            let late = center.check_out(&phone(), &session.id);
            assert!(matches!(late, Err(PlayPassError::SessionNotFound(_))));
        }

        #[test]
        fn food_is_sold_used_and_refused_at_the_door() {
            let (center, _clock) = registered();
            let pizza = buy(&center, "pizza-slice");
            assert_eq!(pizza.status, PurchaseStatus::Used);
            let result = center.check_in(&phone(), &pizza.id);
            assert!(matches!(
                result,
                Err(PlayPassError::CheckIn(CheckInError::NotAdmission))
            ));
        }

        #[test]
        fn unknown_product_is_rejected() {
            let (center, _clock) = registered();
            let result =
                center.purchase(&phone(), &ProductId::from("ball-pit"), &PaymentMethod::Cash);
            assert!(matches!(result, Err(PlayPassError::ProductNotFound(_))));
        }

        #[test]
        fn party_flow() {
            let (center, clock) = registered();
            let party = buy(&center, "party-basic");
            let early = center.check_in(&phone(), &party.id);
            assert!(matches!(
                early,
                Err(PlayPassError::CheckIn(CheckInError::NeedsScheduling))
            ));
            assert_eq!(
                center.party_window(&phone(), &party.id).unwrap(),
                CheckInWindow::NeedsScheduling
            );

            let party_start = start() + TimeDelta::days(1);
            let details = PartyDetails {
                start: party_start,
                guests: 8,
                child_name: Some("Mia".to_owned()),
                notes: None,
            };
            let crowded = center.schedule_party(
                &phone(),
                &party.id,
                PartyDetails {
                    guests: 11,
                    ..details.clone()
                },
            );
            assert!(matches!(
                crowded,
                Err(PlayPassError::Validation(ValidationError::GuestCount { max: 10 }))
            ));
            let scheduled = center.schedule_party(&phone(), &party.id, details.clone()).unwrap();
            assert_eq!(scheduled.party_details(), Some(&details));
            assert!(matches!(
                center.party_window(&phone(), &party.id).unwrap(),
                CheckInWindow::TooEarly { .. }
            ));

            clock.set(party_start - TimeDelta::minutes(10));
            assert!(center.party_window(&phone(), &party.id).unwrap().is_open());
            let _session = center.check_in(&phone(), &party.id).unwrap();
            let moved = center.schedule_party(&phone(), &party.id, details);
            assert!(matches!(moved, Err(PlayPassError::PartyRedeemed(_))));
        }

        #[test]
        fn party_window_requires_a_party() {
            let (center, _clock) = registered();
            let pass = buy(&center, "day-pass");
            let result = center.party_window(&phone(), &pass.id);
            assert!(matches!(result, Err(PlayPassError::NotAParty(_))));
        }

        #[test]
        fn card_management() {
            let (center, _clock) = registered();
            let visa = center.add_card(&phone(), &card("4242 4242 4242 4242")).unwrap();
            let mastercard = center.add_card(&phone(), &card("5555555555554444")).unwrap();
            assert!(visa.is_default);
            assert!(!mastercard.is_default);

            let switched = center.set_default_card(&phone(), &mastercard.id).unwrap();
            assert_eq!(switched.default_card().unwrap().id, mastercard.id);

            let removed = center.remove_card(&phone(), &mastercard.id).unwrap();
            assert_eq!(removed.saved_cards.len(), 1);
            assert_eq!(removed.default_card().unwrap().id, visa.id);

            let missing = center.remove_card(&phone(), &mastercard.id);
            assert!(matches!(missing, Err(PlayPassError::CardNotFound(_))));
        }

        #[test]
        fn card_payments() {
            let (center, _clock) = registered();
            let saved = center
                .purchase(
                    &phone(),
                    &ProductId::from("day-pass"),
                    &PaymentMethod::NewCard {
                        card: card("4242424242424242"),
                        save: true,
                    },
                )
                .unwrap();
            assert!(saved.receipt.method.contains("4242"));
            let customer = center.find_customer(&phone()).unwrap();
            let on_file = customer.default_card().unwrap().id.clone();

            let again = center
                .purchase(
                    &phone(),
                    &ProductId::from("juice-box"),
                    &PaymentMethod::SavedCard { card: on_file },
                )
                .unwrap();
            assert_eq!(again.receipt.amount, again.purchase.price);
            assert_eq!(center.find_customer(&phone()).unwrap().purchases.len(), 2);
        }

        #[test]
        fn auto_renew_only_on_weekly_and_monthly() {
            let (center, _clock) = registered();
            let day = buy(&center, "day-pass");
            let weekly = buy(&center, "weekly-pass");
            let refused = center.set_auto_renew(&phone(), &day.id, true);
            assert!(matches!(refused, Err(PlayPassError::RenewalUnsupported)));
            let renewed = center.set_auto_renew(&phone(), &weekly.id, true).unwrap();
            assert!(renewed.auto_renew);
            let customer = center.find_customer(&phone()).unwrap();
            assert!(customer.purchase(&weekly.id).unwrap().auto_renew);
        }

        #[test]
        fn sweep_expires_and_checks_out_everyone() {
            let (center, clock) = registered();
            let _ben = center
                .register_customer("5559876543", "Ben Ortiz", "ben@example.com")
                .unwrap();
            let ben_phone = PhoneNumber::parse("5559876543").unwrap();
            let ada_pass = buy(&center, "day-pass");
            let ben_pass = center
                .purchase(&ben_phone, &ProductId::from("day-pass"), &PaymentMethod::Cash)
                .unwrap()
                .purchase;
            let _ada_session = center.check_in(&phone(), &ada_pass.id).unwrap();
            let _ben_session = center.check_in(&ben_phone, &ben_pass.id).unwrap();

            clock.advance(TimeDelta::hours(13));
            let report = center.sweep().unwrap();
            assert_eq!(report.customers, 2);
            assert_eq!(report.expired.len(), 2);
            assert_eq!(report.auto_checked_out.len(), 2);
            assert_eq!(center.visits().unwrap().len(), 2);
            assert_eq!(center.storage().last_sweep().unwrap(), Some(report.at));
            assert_eq!(report.previous, None);

            clock.advance(TimeDelta::minutes(5));
            let quiet = center.sweep().unwrap();
            assert!(quiet.expired.is_empty());
            assert!(quiet.auto_checked_out.is_empty());
            assert_eq!(quiet.previous, Some(report.at));
        }

        #[test]
        fn build_rejects_out_of_range_timings() {
            let result = PlayCenterBlocking::builder()
                .storage(InMemoryStorage::new())
                .config(LifecycleConfig::default().with_party_window_minutes(-30))
                .build();
            assert!(matches!(
                result,
                Err(PlayPassError::Validation(ValidationError::ConfigRange {
                    field: "partyWindowMinutes",
                    ..
                }))
            ));
        }

        #[test]
        fn reset_removes_everything() {
            let (center, _clock) = registered();
            let pass = buy(&center, "day-pass");
            let session = center.check_in(&phone(), &pass.id).unwrap();
            let _visit = center.check_out(&phone(), &session.id).unwrap();
            let _report = center.sweep().unwrap();

            center.reset().unwrap();
            assert!(center.customers(&CustomerFilter::new()).unwrap().is_empty());
            assert!(center.visits().unwrap().is_empty());
            assert!(matches!(
                center.find_customer(&phone()),
                Err(PlayPassError::CustomerNotFound(_))
            ));
        }

        /// In-memory storage whose next visit log write can be made to fail.
        #[derive(Debug, Default)]
        struct FlakyVisitLog {
            /// Backing store.
            inner: InMemoryStorage,
            /// Fail the next `record_visits` call.
            fail_next: AtomicBool,
        }

        impl BlockingStorage for FlakyVisitLog {
            fn last_sweep(&self) -> Result<Option<DateTime<Utc>>> {
                self.inner.last_sweep()
            }

            fn set_last_sweep(&self, at: DateTime<Utc>) -> Result<()> {
                self.inner.set_last_sweep(at)
            }

            fn customers(&self) -> Result<Vec<Customer>> {
                self.inner.customers()
            }

            fn customer(&self, phone: &PhoneNumber) -> Result<Option<Customer>> {
                self.inner.customer(phone)
            }

            fn upsert_customers(&self, items: Vec<Customer>) -> Result<()> {
                self.inner.upsert_customers(items)
            }

            fn visits(&self) -> Result<Vec<CompletedVisit>> {
                self.inner.visits()
            }

            fn record_visits(&self, items: Vec<CompletedVisit>) -> Result<()> {
                if self.fail_next.swap(false, Ordering::SeqCst) {
                    return Err(PlayPassError::Storage("visit log unavailable".into()));
                }
                self.inner.record_visits(items)
            }

            fn clear(&self) -> Result<()> {
                self.inner.clear()
            }
        }

        fn flaky_center() -> (PlayCenterBlocking<FlakyVisitLog>, Arc<ManualClock>, Purchase) {
            let clock = Arc::new(ManualClock::new(start()));
            let center = PlayCenterBlocking::builder()
                .storage(FlakyVisitLog::default())
                .clock(Arc::clone(&clock))
                .build()
                .unwrap();
            let _customer = center
                .register_customer("5551234567", "Ada Park", "ada@example.com")
                .unwrap();
            let pass = center
                .purchase(&phone(), &ProductId::from("weekly-pass"), &PaymentMethod::Cash)
                .unwrap()
                .purchase;
            let _session = center.check_in(&phone(), &pass.id).unwrap();
            (center, clock, pass)
        }

        #[test]
        fn failed_visit_log_keeps_overdue_session_for_retry() {
            let (center, clock, _pass) = flaky_center();
            clock.advance(TimeDelta::hours(13));
            center.storage().fail_next.store(true, Ordering::SeqCst);
            assert!(matches!(
                center.find_customer(&phone()),
                Err(PlayPassError::Storage(_))
            ));
            assert_eq!(
                center.storage().customer(&phone()).unwrap().unwrap().active_sessions.len(),
                1
            );

            let customer = center.find_customer(&phone()).unwrap();
            assert!(customer.active_sessions.is_empty());
            let visits = center.visits().unwrap();
            assert_eq!(visits.len(), 1);
            assert_eq!(visits[0].reason, CheckoutReason::Auto);
        }

        #[test]
        fn failed_visit_log_during_sweep_is_retried() {
            let (center, clock, _pass) = flaky_center();
            clock.advance(TimeDelta::hours(13));
            center.storage().fail_next.store(true, Ordering::SeqCst);
            assert!(center.sweep().is_err());
            assert_eq!(center.storage().last_sweep().unwrap(), None);

            let report = center.sweep().unwrap();
            assert_eq!(report.auto_checked_out.len(), 1);
            assert_eq!(center.visits().unwrap().len(), 1);
        }

        #[test]
        fn failed_visit_log_keeps_session_open_on_check_out() {
            let (center, clock, _pass) = flaky_center();
            clock.advance(TimeDelta::hours(1));
            let session = center.find_customer(&phone()).unwrap().active_sessions[0].id.clone();
            center.storage().fail_next.store(true, Ordering::SeqCst);
            assert!(center.check_out(&phone(), &session).is_err());
            let visit = center.check_out(&phone(), &session).unwrap();
            assert_eq!(visit.reason, CheckoutReason::Manual);
            assert_eq!(center.visits().unwrap().len(), 1);
        }

        #[test]
        fn dashboard_and_filters() {
            let (center, _clock) = registered();
            let pass = buy(&center, "day-pass");
            let _session = center.check_in(&phone(), &pass.id).unwrap();
            let _ben = center
                .register_customer("5559876543", "Ben Ortiz", "ben@example.com")
                .unwrap();

            let stats = center.dashboard().unwrap();
            assert_eq!(stats.customers, 2);
            assert_eq!(stats.checked_in.len(), 1);
            assert_eq!(stats.active_passes, 1);
            assert_eq!(stats.revenue_on_day, pass.price);

            let present = center
                .customers(&CustomerFilter::new().checked_in_only())
                .unwrap();
            assert_eq!(present.len(), 1);
            let by_name = center
                .customers(&CustomerFilter::new().search("ortiz"))
                .unwrap();
            assert_eq!(by_name.len(), 1);
            assert_eq!(by_name[0].name, "Ben Ortiz");
        }

        #[test]
        fn demo_seed_loads() {
            let (center, _clock) = center();
            assert_eq!(center.load_demo().unwrap(), 5);
            let stats = center.dashboard().unwrap();
            assert_eq!(stats.customers, 5);
            assert_eq!(stats.upcoming_parties.len(), 1);
            assert_eq!(center.visits().unwrap().len(), 4);
        }
    }

    #[cfg(feature = "async")]
    mod async_tests {
        use super::*;
        use crate::play_center::PlayCenter;

        fn center() -> (PlayCenter<InMemoryStorage>, Arc<ManualClock>) {
            let clock = Arc::new(ManualClock::new(start()));
            let center = PlayCenter::builder()
                .storage(InMemoryStorage::new())
                .clock(Arc::clone(&clock))
                .build()
                .unwrap();
            (center, clock)
        }

        #[tokio::test]
        async fn visit_round_trip() {
            let (center, clock) = center();
            let _customer = center
                .register_customer("5551234567", "Ada Park", "ada@example.com")
                .await
                .unwrap();
            let sale = center
                .purchase(&phone(), &ProductId::from("weekly-pass"), &PaymentMethod::Cash)
                .await
                .unwrap();
            let session = center.check_in(&phone(), &sale.purchase.id).await.unwrap();
            clock.advance(TimeDelta::hours(2));
            let visit = center.check_out(&phone(), &session.id).await.unwrap();
            assert_eq!(visit.duration(), TimeDelta::hours(2));

            clock.advance(TimeDelta::days(1));
            let _second = center.check_in(&phone(), &sale.purchase.id).await.unwrap();
            let customer = center.find_customer(&phone()).await.unwrap();
            let pass = customer.purchase(&sale.purchase.id).unwrap();
            assert_eq!(pass.used_sessions, 2);
            assert_eq!(pass.first_use_date, Some(start()));
        }

        #[tokio::test]
        async fn sweep_records_auto_checkouts() {
            let (center, clock) = center();
            let _customer = center
                .register_customer("5551234567", "Ada Park", "ada@example.com")
                .await
                .unwrap();
            let sale = center
                .purchase(&phone(), &ProductId::from("monthly-pass"), &PaymentMethod::Cash)
                .await
                .unwrap();
            let _session = center.check_in(&phone(), &sale.purchase.id).await.unwrap();
            clock.advance(TimeDelta::hours(13));
            let report = center.sweep().await.unwrap();
            assert!(report.expired.is_empty());
            assert_eq!(report.auto_checked_out.len(), 1);
            assert_eq!(center.visits().await.unwrap().len(), 1);
        }

        #[tokio::test]
        async fn card_defaults_follow_removal() {
            let (center, _clock) = center();
            let _customer = center
                .register_customer("5551234567", "Ada Park", "ada@example.com")
                .await
                .unwrap();
            let first = center.add_card(&phone(), &card("4242424242424242")).await.unwrap();
            let second = center.add_card(&phone(), &card("5555555555554444")).await.unwrap();
            let after = center.remove_card(&phone(), &first.id).await.unwrap();
            assert_eq!(after.default_card().unwrap().id, second.id);
        }
    }
}
