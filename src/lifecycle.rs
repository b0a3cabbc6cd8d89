//! Pass and session lifecycle.
//!
//! Every transition borrows the current value and returns a new one; callers
//! replace the stored record wholesale. Expiry and auto-checkout are not
//! driven by timers: [`refresh_customer`] compares stored timestamps with
//! "now" and is run before every operation.
//!
//! ```text
//! active(unused) --check-in--> active(in use) --+--> used     (multi-session pack exhausted)
//!                                               +--> expired  (now > actual_expiry_date)
//! ```

use chrono::{DateTime, TimeDelta, Utc};

use crate::config::LifecycleConfig;
use crate::error::{CheckInError, PlayPassError};
use crate::models::{
    CheckoutReason, CompletedVisit, Customer, PhoneNumber, Purchase, PurchaseId,
    PurchaseStatus, Session, SessionAllowance, SessionId,
};
use crate::party::CheckInWindow;

/// Observable phase of a pass, combining stored status and first use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassPhase {
    /// Active and never checked in.
    Unused,
    /// Active and checked in at least once.
    InUse,
    /// All sessions consumed.
    Used,
    /// Past its expiry date.
    Expired,
}

impl PassPhase {
    /// Derives the phase of `purchase` as stored.
    #[inline]
    #[must_use]
    pub const fn of(purchase: &Purchase) -> Self {
        match purchase.status {
            PurchaseStatus::Expired => Self::Expired,
            PurchaseStatus::Used => Self::Used,
            PurchaseStatus::Active if purchase.first_use_date.is_none() => Self::Unused,
            PurchaseStatus::Active => Self::InUse,
        }
    }
}

impl core::fmt::Display for PassPhase {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match *self {
            Self::Unused => "unused",
            Self::InUse => "in use",
            Self::Used => "used",
            Self::Expired => "expired",
        })
    }
}

/// Outcome of a successful check-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckIn {
    /// Pass after the check-in.
    pub purchase: Purchase,
    /// Newly opened session.
    pub session: Session,
}

/// Returns `purchase` with its status brought up to date at `now`, or
/// `None` if nothing changed.
///
/// Only `active` passes move: they expire once `now` is strictly after
/// `actual_expiry_date`.
#[inline]
#[must_use]
pub fn expire_if_due(purchase: &Purchase, now: DateTime<Utc>) -> Option<Purchase> {
    let due = purchase.is_active()
        && purchase
            .actual_expiry_date
            .is_some_and(|expiry| now > expiry);
    due.then(|| Purchase {
        status: PurchaseStatus::Expired,
        ..purchase.clone()
    })
}

/// Adds `delta` to `at`, clamping to the representable range.
fn saturating_add(at: DateTime<Utc>, delta: TimeDelta) -> DateTime<Utc> {
    at.checked_add_signed(delta).unwrap_or(if delta < TimeDelta::zero() {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    })
}

/// Checks a visitor in on `purchase`.
///
/// `open_sessions` are the owner's currently open sessions; a pass can have
/// at most one open session.
///
/// The first check-in stamps `first_use_date` and derives
/// `actual_expiry_date` from the pass type; later check-ins leave both
/// alone. Multi-session packs become `used` on their last check-in.
///
/// # Errors
///
/// Returns the [`CheckInError`] explaining why the pass cannot be used now.
#[inline]
pub fn check_in(
    purchase: &Purchase,
    open_sessions: &[Session],
    now: DateTime<Utc>,
    config: &LifecycleConfig,
) -> Result<CheckIn, CheckInError> {
    if !purchase.pass_type.is_admission() {
        return Err(CheckInError::NotAdmission);
    }
    let current = expire_if_due(purchase, now);
    match current.as_ref().unwrap_or(purchase).status {
        PurchaseStatus::Expired => return Err(CheckInError::Expired),
        PurchaseStatus::Used => return Err(CheckInError::Used),
        PurchaseStatus::Active => {}
    }
    match CheckInWindow::for_purchase(purchase, now, config) {
        Some(CheckInWindow::NeedsScheduling) => return Err(CheckInError::NeedsScheduling),
        Some(CheckInWindow::TooEarly { opens_in }) => return Err(CheckInError::TooEarly(opens_in)),
        Some(CheckInWindow::Closed) => return Err(CheckInError::WindowClosed),
        Some(CheckInWindow::Open) | None => {}
    }
    if open_sessions.iter().any(|s| s.purchase_id == purchase.id) {
        return Err(CheckInError::AlreadyCheckedIn);
    }

    let mut updated = purchase.clone();
    if updated.first_use_date.is_none() {
        updated.first_use_date = Some(now);
        updated.actual_expiry_date = config
            .validity(purchase.pass_type)
            .map(|valid| saturating_add(now, valid));
    }
    updated.used_sessions = updated.used_sessions.saturating_add(1);
    if let SessionAllowance::Limited(total) = updated.total_sessions
        && updated.total_sessions.exhausts_by_count()
        && updated.used_sessions >= total
    {
        updated.status = PurchaseStatus::Used;
    }

    let session = Session {
        id: SessionId::generate(),
        purchase_id: purchase.id.clone(),
        pass_name: purchase.name.clone(),
        start_time: now,
        auto_checkout_time: saturating_add(now, config.auto_checkout_after()),
    };
    tracing::debug!(
        purchase = %updated.id,
        session = %session.id,
        used = updated.used_sessions,
        status = %updated.status,
        "checked in"
    );
    Ok(CheckIn {
        purchase: updated,
        session,
    })
}

/// Closes `session` at `now`.
///
/// The end time is clamped to the start time so a clock that moved
/// backwards never produces a negative duration.
#[inline]
#[must_use]
pub fn check_out(
    session: &Session,
    customer: &PhoneNumber,
    now: DateTime<Utc>,
    reason: CheckoutReason,
) -> CompletedVisit {
    CompletedVisit {
        session_id: session.id.clone(),
        customer: customer.clone(),
        purchase_id: session.purchase_id.clone(),
        pass_name: session.pass_name.clone(),
        start_time: session.start_time,
        end_time: now.max(session.start_time),
        reason,
    }
}

/// Outcome of bringing a customer up to date with the clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Refresh {
    /// Customer after expiry and auto-checkout.
    pub customer: Customer,
    /// Passes that expired.
    pub expired: Vec<PurchaseId>,
    /// Sessions closed because their auto-checkout time passed.
    pub auto_checked_out: Vec<CompletedVisit>,
}

impl Refresh {
    /// Returns `true` if anything changed.
    #[inline]
    #[must_use]
    pub fn changed(&self) -> bool {
        !self.expired.is_empty() || !self.auto_checked_out.is_empty()
    }
}

/// Expires due passes and closes overdue sessions for one customer.
///
/// Auto-checked-out sessions end at their auto-checkout time, not at
/// `now`, so a late sweep does not inflate visit length.
#[inline]
#[must_use]
pub fn refresh_customer(customer: &Customer, now: DateTime<Utc>) -> Refresh {
    let mut expired = Vec::new();
    let purchases = customer
        .purchases
        .iter()
        .map(|purchase| {
            expire_if_due(purchase, now).map_or_else(
                || purchase.clone(),
                |updated| {
                    expired.push(updated.id.clone());
                    updated
                },
            )
        })
        .collect();

    let (overdue, open): (Vec<&Session>, Vec<&Session>) = customer
        .active_sessions
        .iter()
        .partition(|session| session.is_overdue(now));
    let auto_checked_out: Vec<CompletedVisit> = overdue
        .into_iter()
        .map(|session| {
            check_out(
                session,
                &customer.phone,
                session.auto_checkout_time,
                CheckoutReason::Auto,
            )
        })
        .collect();

    if !expired.is_empty() || !auto_checked_out.is_empty() {
        tracing::info!(
            customer = %customer.phone,
            expired = expired.len(),
            auto_checked_out = auto_checked_out.len(),
            "refreshed customer"
        );
    }
    Refresh {
        customer: Customer {
            purchases,
            active_sessions: open.into_iter().cloned().collect(),
            ..customer.clone()
        },
        expired,
        auto_checked_out,
    }
}

/// Checks a customer in on one of their passes.
///
/// Returns the updated customer and the new session.
///
/// # Errors
///
/// - [`PlayPassError::PurchaseNotFound`] if the customer does not own the
///   pass.
/// - [`PlayPassError::CheckIn`] if the pass cannot be used now.
#[inline]
pub fn check_in_customer(
    customer: &Customer,
    purchase_id: &PurchaseId,
    now: DateTime<Utc>,
    config: &LifecycleConfig,
) -> Result<(Customer, Session), PlayPassError> {
    let purchase = customer
        .purchase(purchase_id)
        .ok_or_else(|| PlayPassError::PurchaseNotFound(purchase_id.clone()))?;
    let CheckIn { purchase, session } =
        check_in(purchase, &customer.active_sessions, now, config)?;
    let mut updated = customer.clone().with_purchase(purchase);
    updated.active_sessions.push(session.clone());
    Ok((updated, session))
}

/// Checks a customer out of an open session.
///
/// # Errors
///
/// Returns [`PlayPassError::SessionNotFound`] if the session is not open.
#[inline]
pub fn check_out_customer(
    customer: &Customer,
    session_id: &SessionId,
    now: DateTime<Utc>,
) -> Result<(Customer, CompletedVisit), PlayPassError> {
    let session = customer
        .session(session_id)
        .ok_or_else(|| PlayPassError::SessionNotFound(session_id.clone()))?;
    let visit = check_out(session, &customer.phone, now, CheckoutReason::Manual);
    tracing::debug!(
        session = %visit.session_id,
        minutes = visit.duration().num_minutes(),
        "checked out"
    );
    let updated = Customer {
        active_sessions: customer
            .active_sessions
            .iter()
            .filter(|s| s.id != *session_id)
            .cloned()
            .collect(),
        ..customer.clone()
    };
    Ok((updated, visit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::models::{PartyDetails, ProductId};
    use chrono::NaiveDate;

    fn t0() -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(2024, 12, 20)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
            .and_utc()
    }

    fn buy(product: &str, at: DateTime<Utc>) -> Purchase {
        let catalog = Catalog::standard();
        Purchase::from_product(catalog.find(&ProductId::from(product)).unwrap(), at)
    }

    fn customer_with(purchases: Vec<Purchase>) -> Customer {
        let mut c = Customer::new(
            PhoneNumber::parse("5551234567").unwrap(),
            "Ada Park".to_owned(),
            "ada@example.com".to_owned(),
            t0(),
        );
        c.purchases = purchases;
        c
    }

    fn config() -> LifecycleConfig {
        LifecycleConfig::default()
    }

    #[test]
    fn day_pass_expiry_is_twelve_hours_after_first_check_in() {
        let pass = buy("day-pass", t0());
        let t1 = t0() + TimeDelta::hours(3);
        let checked = check_in(&pass, &[], t1, &config()).unwrap();
        assert_eq!(checked.purchase.first_use_date, Some(t1));
        assert_eq!(checked.purchase.actual_expiry_date, Some(t1 + TimeDelta::hours(12)));
        assert_eq!(checked.session.auto_checkout_time, t1 + TimeDelta::hours(12));
        assert_eq!(PassPhase::of(&checked.purchase), PassPhase::InUse);
    }

    #[test]
    fn out_of_range_timings_saturate_instead_of_panicking() {
        let huge = LifecycleConfig {
            day_pass_minutes: i64::MAX,
            auto_checkout_minutes: i64::MAX,
            ..LifecycleConfig::default()
        };
        let pass = buy("day-pass", t0());
        let checked = check_in(&pass, &[], t0(), &huge).unwrap();
        assert_eq!(checked.purchase.actual_expiry_date, Some(DateTime::<Utc>::MAX_UTC));
        assert_eq!(checked.session.auto_checkout_time, DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn second_check_in_keeps_first_use_date() {
        let pass = buy("day-pass", t0());
        let t1 = t0() + TimeDelta::hours(1);
        let first = check_in(&pass, &[], t1, &config()).unwrap();
        let t2 = t1 + TimeDelta::hours(2);
        let second = check_in(&first.purchase, &[], t2, &config()).unwrap();
        assert_eq!(second.purchase.first_use_date, Some(t1));
        assert_eq!(second.purchase.actual_expiry_date, first.purchase.actual_expiry_date);
        assert_eq!(second.purchase.used_sessions, 2);
        // Single-use passes stay active until they expire.
        assert_eq!(second.purchase.status, PurchaseStatus::Active);
    }

    #[test]
    fn open_session_blocks_second_check_in() {
        let pass = buy("day-pass", t0());
        let first = check_in(&pass, &[], t0(), &config()).unwrap();
        let err = check_in(&first.purchase, &[first.session], t0(), &config()).unwrap_err();
        assert_eq!(err, CheckInError::AlreadyCheckedIn);
    }

    #[test]
    fn expired_pass_is_refused() {
        let pass = buy("day-pass", t0());
        let first = check_in(&pass, &[], t0(), &config()).unwrap();
        let later = t0() + TimeDelta::hours(12) + TimeDelta::seconds(1);
        let err = check_in(&first.purchase, &[], later, &config()).unwrap_err();
        assert_eq!(err, CheckInError::Expired);
        // Exactly at the expiry instant the pass is still valid.
        assert!(check_in(&first.purchase, &[], t0() + TimeDelta::hours(12), &config()).is_ok());
    }

    #[test]
    fn multi_session_pack_becomes_used_on_last_visit() {
        let mut pass = buy("weekly-5-visit", t0());
        for visit in 1..=5_u32 {
            let at = t0() + TimeDelta::hours(i64::from(visit));
            pass = check_in(&pass, &[], at, &config()).unwrap().purchase;
            assert_eq!(pass.used_sessions, visit);
            assert_eq!(
                pass.status == PurchaseStatus::Used,
                pass.used_sessions >= 5,
                "visit {visit}"
            );
        }
        let err = check_in(&pass, &[], t0() + TimeDelta::hours(10), &config()).unwrap_err();
        assert_eq!(err, CheckInError::Used);
        assert_eq!(PassPhase::of(&pass), PassPhase::Used);
    }

    #[test]
    fn unlimited_pass_never_becomes_used() {
        let mut pass = buy("monthly-pass", t0());
        for day in 0..20 {
            pass = check_in(&pass, &[], t0() + TimeDelta::days(day), &config())
                .unwrap()
                .purchase;
        }
        assert_eq!(pass.status, PurchaseStatus::Active);
        assert_eq!(pass.actual_expiry_date, Some(t0() + TimeDelta::days(30)));
    }

    #[test]
    fn food_is_not_admission() {
        let food = buy("juice-box", t0());
        assert_eq!(
            check_in(&food, &[], t0(), &config()).unwrap_err(),
            CheckInError::NotAdmission
        );
    }

    #[test]
    fn party_check_in_follows_window() {
        let start = NaiveDate::from_ymd_opt(2024, 12, 25)
            .unwrap()
            .and_hms_opt(13, 0, 0)
            .unwrap()
            .and_utc();
        let mut party = buy("party-basic", t0());
        assert_eq!(
            check_in(&party, &[], t0(), &config()).unwrap_err(),
            CheckInError::NeedsScheduling
        );

        party.party.as_mut().unwrap().schedule = Some(PartyDetails {
            start,
            guests: 8,
            child_name: None,
            notes: None,
        });
        let early = check_in(&party, &[], start - TimeDelta::minutes(35), &config()).unwrap_err();
        let CheckInError::TooEarly(countdown) = early else {
            panic!("expected too early, got {early:?}");
        };
        assert_eq!(countdown.total_minutes(), 5);
        assert_eq!(
            check_in(&party, &[], start + TimeDelta::minutes(31), &config()).unwrap_err(),
            CheckInError::WindowClosed
        );

        let ok = check_in(&party, &[], start - TimeDelta::minutes(29), &config()).unwrap();
        // Party passes expire the moment they are redeemed.
        assert_eq!(ok.purchase.actual_expiry_date, ok.purchase.first_use_date);
        let refreshed = expire_if_due(&ok.purchase, start).unwrap();
        assert_eq!(refreshed.status, PurchaseStatus::Expired);
    }

    #[test]
    fn check_out_duration_matches_elapsed_time() {
        let pass = buy("day-pass", t0());
        let checked = check_in(&pass, &[], t0(), &config()).unwrap();
        let phone = PhoneNumber::parse("5551234567").unwrap();
        let visit = check_out(
            &checked.session,
            &phone,
            t0() + TimeDelta::minutes(95),
            CheckoutReason::Manual,
        );
        assert_eq!(visit.duration(), TimeDelta::minutes(95));

        let backwards = check_out(
            &checked.session,
            &phone,
            t0() - TimeDelta::minutes(5),
            CheckoutReason::Manual,
        );
        assert_eq!(backwards.duration(), TimeDelta::zero());
    }

    #[test]
    fn refresh_expires_and_auto_checks_out() {
        let c = customer_with(vec![buy("day-pass", t0()), buy("weekly-pass", t0())]);
        let day_id = c.purchases[0].id.clone();
        let (c, session) = check_in_customer(&c, &day_id, t0(), &config()).unwrap();

        let quiet = refresh_customer(&c, t0() + TimeDelta::hours(11));
        assert!(!quiet.changed());
        assert_eq!(quiet.customer, c);

        let later = t0() + TimeDelta::hours(13);
        let refreshed = refresh_customer(&c, later);
        assert_eq!(refreshed.expired, vec![day_id.clone()]);
        assert_eq!(refreshed.auto_checked_out.len(), 1);
        let visit = &refreshed.auto_checked_out[0];
        assert_eq!(visit.session_id, session.id);
        assert_eq!(visit.reason, CheckoutReason::Auto);
        assert_eq!(visit.end_time, session.auto_checkout_time);
        assert!(refreshed.customer.active_sessions.is_empty());
        assert_eq!(
            refreshed.customer.purchase(&day_id).unwrap().status,
            PurchaseStatus::Expired
        );
        // The unused weekly pass has no expiry yet.
        assert_eq!(refreshed.customer.purchases[1].status, PurchaseStatus::Active);
    }

    #[test]
    fn customer_check_in_and_out() {
        let c = customer_with(vec![buy("weekly-pass", t0())]);
        let id = c.purchases[0].id.clone();
        let (c, session) = check_in_customer(&c, &id, t0(), &config()).unwrap();
        assert_eq!(c.active_sessions.len(), 1);
        assert_eq!(c.purchase(&id).unwrap().used_sessions, 1);

        let (c, visit) =
            check_out_customer(&c, &session.id, t0() + TimeDelta::hours(2)).unwrap();
        assert!(c.active_sessions.is_empty());
        assert_eq!(visit.duration(), TimeDelta::hours(2));
        assert_eq!(visit.reason, CheckoutReason::Manual);

        assert!(matches!(
            check_out_customer(&c, &session.id, t0()),
            Err(PlayPassError::SessionNotFound(_))
        ));
        assert!(matches!(
            check_in_customer(&c, &PurchaseId::new("pur_missing".to_owned()), t0(), &config()),
            Err(PlayPassError::PurchaseNotFound(_))
        ));
    }

    #[test]
    fn first_use_date_never_changes_across_a_day_of_visits() {
        let mut c = customer_with(vec![buy("weekly-pass", t0())]);
        let id = c.purchases[0].id.clone();
        let mut first_use = None;
        for hour in 0..10 {
            let at = t0() + TimeDelta::hours(hour);
            let (checked_in, session) = check_in_customer(&c, &id, at, &config()).unwrap();
            let stamped = checked_in.purchase(&id).unwrap().first_use_date;
            assert!(stamped.is_some());
            if first_use.is_none() {
                first_use = stamped;
            }
            assert_eq!(stamped, first_use);
            let (checked_out, _visit) =
                check_out_customer(&checked_in, &session.id, at + TimeDelta::minutes(30)).unwrap();
            c = checked_out;
        }
        assert_eq!(c.purchase(&id).unwrap().used_sessions, 10);
    }
}
