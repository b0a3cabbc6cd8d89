//! Mock customers for development.
//!
//! The seed is built by running the real transitions against a moving
//! timeline, so every record it produces is one the lifecycle could have
//! produced itself. The CLI only exposes it when `PLAYPASS_ENV` is
//! `development`.

use chrono::{DateTime, Datelike, NaiveTime, TimeDelta, Utc};

use crate::catalog::Catalog;
use crate::config::LifecycleConfig;
use crate::error::{PlayPassError, Result};
use crate::lifecycle::{check_in_customer, check_out_customer, refresh_customer};
use crate::models::{
    CompletedVisit, Customer, PartyDetails, PhoneNumber, ProductId, Purchase, PurchaseId,
};
use crate::party::schedule;
use crate::payment::CardInput;

/// Records produced by [`seed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoData {
    /// Seeded customers.
    pub customers: Vec<Customer>,
    /// Visits closed while building the seed.
    pub visits: Vec<CompletedVisit>,
}

/// Builds a small population of customers in assorted states as of `now`:
///
/// - Ada Park: on the floor with a day pass, Visa on file.
/// - Ben Ortiz: monthly pass in use and a five-visit pack with visits
///   left.
/// - Chloe Nguyen: party package scheduled three days out.
/// - Dev Shah: an expired weekly pass and a café purchase.
/// - Emma Brooks: unused weekly pass with auto-renew switched on.
///
/// # Errors
///
/// Returns an error if `catalog` lacks one of the standard products.
#[inline]
pub fn seed(now: DateTime<Utc>, catalog: &Catalog, config: &LifecycleConfig) -> Result<DemoData> {
    let mut visits = Vec::new();
    let buy = |id: &str, at: DateTime<Utc>| -> Result<Purchase> {
        let product_id = ProductId::from(id);
        catalog
            .find(&product_id)
            .map(|product| Purchase::from_product(product, at))
            .ok_or(PlayPassError::ProductNotFound(product_id))
    };
    let hours = TimeDelta::hours;
    let days = TimeDelta::days;

    // Ada: checked in two hours ago.
    let mut ada_new = customer("5551234567", "Ada Park", "ada.park@example.com", now - days(40))?;
    ada_new.saved_cards.push(
        CardInput {
            number: "4242 4242 4242 4242".to_owned(),
            exp_month: 12,
            exp_year: now.year() + 3,
            cvc: "123".to_owned(),
        }
        .validate(now.date_naive(), true)?,
    );
    ada_new.purchases.push(buy("day-pass", now - hours(3))?);
    let ada_pass = last_purchase(&ada_new)?;
    let (ada, _session) = check_in_customer(&ada_new, &ada_pass, now - hours(2), config)?;

    // Ben: monthly pass first used five days ago, plus a 5-visit pack with
    // two visits done.
    let mut ben = customer("5559876543", "Ben Ortiz", "ben.ortiz@example.com", now - days(60))?;
    ben.purchases.push(buy("monthly-pass", now - days(6))?);
    let monthly = last_purchase(&ben)?;
    ben.purchases.push(buy("weekly-5-visit", now - days(2))?);
    let pack = last_purchase(&ben)?;
    for (pass, start) in [
        (&monthly, now - days(5)),
        (&pack, now - days(2)),
        (&pack, now - days(1)),
    ] {
        let (checked_in, session) = check_in_customer(&ben, pass, start, config)?;
        let (checked_out, visit) = check_out_customer(&checked_in, &session.id, start + hours(2))?;
        visits.push(visit);
        ben = checked_out;
    }

    // Chloe: party booked for three days from now at a round hour.
    let mut chloe_new = customer(
        "5552468013",
        "Chloe Nguyen",
        "chloe.n@example.com",
        now - days(14),
    )?;
    chloe_new.purchases.push(buy("party-basic", now - days(7))?);
    let party_id = last_purchase(&chloe_new)?;
    let start = (now + days(3)).date_naive().and_time(NaiveTime::MIN).and_utc() + hours(14);
    let scheduled = chloe_new
        .purchase(&party_id)
        .ok_or_else(|| PlayPassError::PurchaseNotFound(party_id.clone()))
        .and_then(|party| {
            schedule(
                party,
                PartyDetails {
                    start,
                    guests: 8,
                    child_name: Some("Mia".to_owned()),
                    notes: Some("Peanut-free cake".to_owned()),
                },
                now,
            )
        })?;
    let chloe = chloe_new.with_purchase(scheduled);

    // Dev: weekly pass used three weeks ago, now expired; a pizza today.
    let mut dev_new = customer("5553691215", "Dev Shah", "dev.shah@example.com", now - days(30))?;
    dev_new.purchases.push(buy("weekly-pass", now - days(22))?);
    let weekly = last_purchase(&dev_new)?;
    let start_old = now - days(21);
    let (checked_in, session) = check_in_customer(&dev_new, &weekly, start_old, config)?;
    let (checked_out, visit) = check_out_customer(&checked_in, &session.id, start_old + hours(3))?;
    visits.push(visit);
    let mut dev = refresh_customer(&checked_out, now).customer;
    dev.purchases.push(buy("pizza-slice", now - hours(1))?);

    // Emma: bought a weekly pass yesterday, not used yet.
    let mut emma = customer("5557531598", "Emma Brooks", "emma.b@example.com", now - days(1))?;
    let mut weekly_emma = buy("weekly-pass", now - days(1))?;
    weekly_emma.auto_renew = true;
    emma.purchases.push(weekly_emma);

    tracing::info!(customers = 5, visits = visits.len(), "built demo seed");
    Ok(DemoData {
        customers: vec![ada, ben, chloe, dev, emma],
        visits,
    })
}

/// Creates a customer from literal demo values.
fn customer(phone: &str, name: &str, email: &str, created: DateTime<Utc>) -> Result<Customer> {
    Ok(Customer::new(
        PhoneNumber::parse(phone)?,
        name.to_owned(),
        email.to_owned(),
        created,
    ))
}

/// Returns the ID of the customer's most recent purchase.
fn last_purchase(customer: &Customer) -> Result<PurchaseId> {
    customer
        .purchases
        .last()
        .map(|p| p.id.clone())
        .ok_or_else(|| PlayPassError::CustomerNotFound(customer.phone.clone()))
}
