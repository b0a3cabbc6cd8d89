//! Lifecycle timing configuration.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::models::PassType;

/// Timing rules for passes, sessions and parties.
///
/// Durations are stored as whole minutes so the struct can be loaded from
/// a JSON config file.
///
/// # Example
///
/// ```rust
/// use playpass::config::LifecycleConfig;
///
/// let config = LifecycleConfig::default().with_party_window_minutes(15);
/// assert_eq!(config.party_window().num_minutes(), 15);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LifecycleConfig {
    /// Validity of a day pass after first check-in.
    pub day_pass_minutes: i64,
    /// Validity of a weekly pass after first check-in.
    pub weekly_pass_minutes: i64,
    /// Validity of a monthly pass after first check-in.
    pub monthly_pass_minutes: i64,
    /// Validity of a party package after check-in.
    pub party_minutes: i64,
    /// Time after check-in at which a session is closed automatically.
    pub auto_checkout_minutes: i64,
    /// Half-width of the party check-in window around the scheduled start.
    pub party_window_minutes: i64,
    /// Artificial delay shown while a payment is "processed".
    pub payment_delay_ms: u64,
}

/// Minutes in an hour.
const HOUR: i64 = 60;
/// Minutes in a day.
const DAY: i64 = 24 * HOUR;
/// Longest accepted duration (100 years).
pub const MAX_MINUTES: i64 = 36_525 * DAY;

/// Converts minutes to a [`TimeDelta`], saturating at [`TimeDelta::MAX`].
const fn minutes_delta(minutes: i64) -> TimeDelta {
    match TimeDelta::try_minutes(minutes) {
        Some(delta) => delta,
        None if minutes < 0 => TimeDelta::MIN,
        None => TimeDelta::MAX,
    }
}

impl Default for LifecycleConfig {
    #[inline]
    fn default() -> Self {
        Self {
            day_pass_minutes: 12 * HOUR,
            weekly_pass_minutes: 7 * DAY,
            monthly_pass_minutes: 30 * DAY,
            party_minutes: 0,
            auto_checkout_minutes: 12 * HOUR,
            party_window_minutes: 30,
            payment_delay_ms: 2_000,
        }
    }
}

impl LifecycleConfig {
    /// Returns how long a pass stays valid after its first check-in, or
    /// `None` for items that never expire by time.
    #[inline]
    #[must_use]
    pub const fn validity(&self, pass_type: PassType) -> Option<TimeDelta> {
        let minutes = match pass_type {
            PassType::Day => self.day_pass_minutes,
            PassType::Weekly => self.weekly_pass_minutes,
            PassType::Monthly => self.monthly_pass_minutes,
            PassType::Party => self.party_minutes,
            PassType::Food => return None,
        };
        Some(minutes_delta(minutes))
    }

    /// Time after check-in at which sessions are closed automatically.
    #[inline]
    #[must_use]
    pub const fn auto_checkout_after(&self) -> TimeDelta {
        minutes_delta(self.auto_checkout_minutes)
    }

    /// Half-width of the party check-in window.
    #[inline]
    #[must_use]
    pub const fn party_window(&self) -> TimeDelta {
        minutes_delta(self.party_window_minutes)
    }

    /// Artificial payment processing delay.
    #[inline]
    #[must_use]
    pub const fn payment_delay(&self) -> core::time::Duration {
        core::time::Duration::from_millis(self.payment_delay_ms)
    }

    /// Checks every duration against its allowed range.
    ///
    /// Pass validity and auto-checkout must lie in `1..=MAX_MINUTES`. Party
    /// validity and the party window may be zero; a zero party validity
    /// expires a party as soon as it is redeemed.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ConfigRange`] naming the first field out
    /// of range.
    #[inline]
    pub fn validate(&self) -> Result<(), ValidationError> {
        [
            ("dayPassMinutes", self.day_pass_minutes, 1_i64),
            ("weeklyPassMinutes", self.weekly_pass_minutes, 1_i64),
            ("monthlyPassMinutes", self.monthly_pass_minutes, 1_i64),
            ("partyMinutes", self.party_minutes, 0_i64),
            ("autoCheckoutMinutes", self.auto_checkout_minutes, 1_i64),
            ("partyWindowMinutes", self.party_window_minutes, 0_i64),
        ]
        .into_iter()
        .find(|&(_, value, min)| !(min..=MAX_MINUTES).contains(&value))
        .map_or(Ok(()), |(field, value, _)| {
            Err(ValidationError::ConfigRange { field, value })
        })
    }

    /// Sets the auto-checkout delay.
    #[inline]
    #[must_use]
    pub const fn with_auto_checkout_minutes(mut self, minutes: i64) -> Self {
        self.auto_checkout_minutes = minutes;
        self
    }

    /// Sets the party window half-width.
    #[inline]
    #[must_use]
    pub const fn with_party_window_minutes(mut self, minutes: i64) -> Self {
        self.party_window_minutes = minutes;
        self
    }

    /// Sets the payment delay.
    #[inline]
    #[must_use]
    pub const fn with_payment_delay_ms(mut self, millis: u64) -> Self {
        self.payment_delay_ms = millis;
        self
    }
}
