//! Party package scheduling and the check-in window.
//!
//! A party package starts out needing a date. Once scheduled, the party can
//! be checked in only within the configured window (30 minutes by default)
//! either side of the start time.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::config::LifecycleConfig;
use crate::error::{PlayPassError, ValidationError};
use crate::models::{PartyDetails, Purchase};
use crate::validation::validate_guest_count;

/// Minutes in an hour.
const MINUTES_PER_HOUR: i64 = 60;
/// Minutes in a day.
const MINUTES_PER_DAY: i64 = 24 * MINUTES_PER_HOUR;

/// Time left until something opens, rounded up to whole minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    /// Whole days.
    pub days: i64,
    /// Remaining hours (0-23).
    pub hours: i64,
    /// Remaining minutes (0-59).
    pub minutes: i64,
}

impl Countdown {
    /// Splits a duration into days, hours and minutes, rounding partial
    /// minutes up so "opens in 0 minutes" is never shown.
    #[inline]
    #[must_use]
    pub fn from_delta(delta: TimeDelta) -> Self {
        let seconds = delta.num_seconds().max(0);
        let total_minutes = seconds.div_euclid(60) + i64::from(seconds.rem_euclid(60) > 0);
        Self::from_minutes(total_minutes)
    }

    /// Splits a whole number of minutes.
    #[inline]
    #[must_use]
    pub const fn from_minutes(total_minutes: i64) -> Self {
        Self {
            days: total_minutes.div_euclid(MINUTES_PER_DAY),
            hours: total_minutes.rem_euclid(MINUTES_PER_DAY).div_euclid(MINUTES_PER_HOUR),
            minutes: total_minutes.rem_euclid(MINUTES_PER_HOUR),
        }
    }

    /// Total length in minutes.
    #[inline]
    #[must_use]
    pub const fn total_minutes(self) -> i64 {
        self.days * MINUTES_PER_DAY + self.hours * MINUTES_PER_HOUR + self.minutes
    }
}

impl core::fmt::Display for Countdown {
    /// Formats as `2 days, 3 hours, 5 minutes`, dropping zero units.
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let units = [(self.days, "day"), (self.hours, "hour"), (self.minutes, "minute")];
        let mut parts = units
            .into_iter()
            .filter(|&(value, _)| value > 0)
            .peekable();
        if parts.peek().is_none() {
            return f.write_str("0 minutes");
        }
        let mut first = true;
        for (value, unit) in parts {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            let plural = if value == 1 { "" } else { "s" };
            write!(f, "{value} {unit}{plural}")?;
        }
        Ok(())
    }
}

/// Where `now` falls relative to a party's check-in window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "state")]
pub enum CheckInWindow {
    /// No date has been chosen yet.
    NeedsScheduling,
    /// The window opens after the countdown.
    TooEarly {
        /// Time until the window opens.
        opens_in: Countdown,
    },
    /// Check-in is allowed now.
    Open,
    /// The window has passed.
    Closed,
}

impl CheckInWindow {
    /// Classifies `now` against a scheduled start.
    ///
    /// Check-in is allowed iff `|now - start| <= window`.
    #[inline]
    #[must_use]
    pub fn classify(start: DateTime<Utc>, now: DateTime<Utc>, window: TimeDelta) -> Self {
        let opens = start
            .checked_sub_signed(window)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let closes = start
            .checked_add_signed(window)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        if now < opens {
            Self::TooEarly {
                opens_in: Countdown::from_delta(opens - now),
            }
        } else if now > closes {
            Self::Closed
        } else {
            Self::Open
        }
    }

    /// Evaluates the window for a party purchase, or `None` if the purchase
    /// is not a party package.
    #[inline]
    #[must_use]
    pub fn for_purchase(
        purchase: &Purchase,
        now: DateTime<Utc>,
        config: &LifecycleConfig,
    ) -> Option<Self> {
        let booking = purchase.party.as_ref()?;
        Some(booking.schedule.as_ref().map_or(Self::NeedsScheduling, |details| {
            Self::classify(details.start, now, config.party_window())
        }))
    }

    /// Returns `true` if check-in is allowed.
    #[inline]
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }
}

/// Attaches a date, guest count and notes to a party package.
///
/// Returns the updated purchase; the input is left untouched. Rescheduling
/// is allowed until the party has been checked in.
///
/// # Errors
///
/// - [`PlayPassError::NotAParty`] if the purchase is not a party package.
/// - [`PlayPassError::PartyRedeemed`] if the party was already checked in
///   or is no longer active.
/// - [`ValidationError::PartyInPast`] if `details.start` is not after `now`.
/// - [`ValidationError::GuestCount`] if the guest count is outside the
///   package limit.
#[inline]
pub fn schedule(
    purchase: &Purchase,
    details: PartyDetails,
    now: DateTime<Utc>,
) -> Result<Purchase, PlayPassError> {
    let Some(booking) = purchase.party.as_ref() else {
        return Err(PlayPassError::NotAParty(purchase.id.clone()));
    };
    if !purchase.is_unused() || !purchase.is_active() {
        return Err(PlayPassError::PartyRedeemed(purchase.id.clone()));
    }
    if details.start <= now {
        return Err(ValidationError::PartyInPast.into());
    }
    let _guests = validate_guest_count(details.guests, booking.max_guests)?;
    tracing::debug!(
        purchase = %purchase.id,
        start = %details.start,
        guests = details.guests,
        rescheduled = !booking.needs_scheduling(),
        "party scheduled"
    );
    let mut updated = purchase.clone();
    if let Some(slot) = updated.party.as_mut() {
        slot.schedule = Some(PartyDetails {
            child_name: details.child_name.filter(|name| !name.trim().is_empty()),
            notes: details.notes.filter(|notes| !notes.trim().is_empty()),
            ..details
        });
    }
    Ok(updated)
}
