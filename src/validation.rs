//! Form input validation for the front desk.
//!
//! Phone numbers are validated by [`PhoneNumber::parse`](crate::models::PhoneNumber::parse);
//! everything else typed at the counter is checked here.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use crate::error::ValidationError;
use crate::models::CardBrand;

/// Longest accepted customer name, in characters.
const MAX_NAME_CHARS: usize = 80;

/// Loose email shape: something, `@`, something, `.`, something.
static EMAIL_RE: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$"));

/// Three or four digit card security code.
static CVC_RE: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^\d{3,4}$"));

/// Returns a compiled pattern or the compile error as a validation error.
pub(crate) fn pattern(
    re: &'static LazyLock<Result<Regex, regex::Error>>,
) -> Result<&'static Regex, ValidationError> {
    LazyLock::force(re)
        .as_ref()
        .map_err(|err| ValidationError::Pattern(err.to_string()))
}

/// Validates and trims a customer name.
///
/// # Errors
///
/// Returns [`ValidationError::Name`] if the name is blank or longer than
/// 80 characters.
#[inline]
pub fn validate_name(input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    let len = trimmed.chars().count();
    if len == 0 || len > MAX_NAME_CHARS {
        return Err(ValidationError::Name);
    }
    Ok(trimmed.to_owned())
}

/// Validates an email address and returns it lowercased.
///
/// # Errors
///
/// Returns [`ValidationError::Email`] if the address is malformed.
#[inline]
pub fn validate_email(input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    if pattern(&EMAIL_RE)?.is_match(trimmed) {
        Ok(trimmed.to_lowercase())
    } else {
        Err(ValidationError::Email(input.to_owned()))
    }
}

/// Validates a card number and returns its digits.
///
/// Spaces and dashes are ignored. The number must have 13 to 19 digits and
/// pass the Luhn checksum.
///
/// # Errors
///
/// Returns [`ValidationError::CardNumber`] otherwise.
#[inline]
pub fn validate_card_number(input: &str) -> Result<String, ValidationError> {
    let digits: String = input.chars().filter(|c| !matches!(c, ' ' | '-')).collect();
    if !(13..=19).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::CardNumber);
    }
    if luhn_valid(&digits) {
        Ok(digits)
    } else {
        Err(ValidationError::CardNumber)
    }
}

/// Validates a card security code.
///
/// # Errors
///
/// Returns [`ValidationError::CardCvc`] unless the code is 3 or 4 digits.
#[inline]
pub fn validate_cvc(input: &str) -> Result<(), ValidationError> {
    if pattern(&CVC_RE)?.is_match(input.trim()) {
        Ok(())
    } else {
        Err(ValidationError::CardCvc)
    }
}

/// Validates a card expiry and returns `(month, four-digit year)`.
///
/// Two-digit years are read as 20xx. A card is valid through the last day
/// of its expiry month.
///
/// # Errors
///
/// Returns [`ValidationError::CardExpiry`] if the month is out of range or
/// the card has expired on `today`.
#[inline]
pub fn validate_card_expiry(
    month: u32,
    year: i32,
    today: NaiveDate,
) -> Result<(u32, i32), ValidationError> {
    let full_year = if (0..100).contains(&year) {
        2000 + year
    } else {
        year
    };
    if !(1..=12).contains(&month) || (today.year(), today.month()) > (full_year, month) {
        return Err(ValidationError::CardExpiry);
    }
    Ok((month, full_year))
}

/// Validates a party guest count against the package limit.
///
/// # Errors
///
/// Returns [`ValidationError::GuestCount`] unless `1 <= guests <= max`.
#[inline]
pub const fn validate_guest_count(guests: u32, max: u32) -> Result<u32, ValidationError> {
    if guests == 0 || guests > max {
        Err(ValidationError::GuestCount { max })
    } else {
        Ok(guests)
    }
}

/// Detects the card network from the leading digits.
#[inline]
#[must_use]
pub fn card_brand(digits: &str) -> CardBrand {
    let prefix = |n: usize| -> u32 {
        digits
            .chars()
            .take(n)
            .collect::<String>()
            .parse()
            .unwrap_or(0)
    };
    match (prefix(1), prefix(2), prefix(4)) {
        (4, _, _) => CardBrand::Visa,
        (_, 34 | 37, _) => CardBrand::Amex,
        (_, 51..=55, _) | (_, _, 2221..=2720) => CardBrand::Mastercard,
        (_, 65, _) | (_, _, 6011) => CardBrand::Discover,
        _ => CardBrand::Other,
    }
}

/// Runs the Luhn checksum over a string of ASCII digits.
fn luhn_valid(digits: &str) -> bool {
    let sum: u32 = digits
        .chars()
        .rev()
        .filter_map(|c| c.to_digit(10))
        .enumerate()
        .map(|(pos, digit)| {
            if pos % 2 == 1 {
                let doubled = digit * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                digit
            }
        })
        .sum();
    sum % 10 == 0
}
