//! Customer phone number.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::validation::pattern;

/// Number of digits in a national US phone number.
const NATIONAL_DIGITS: usize = 10;

/// Optional `+1` country code, then ten digits separated by spaces, dots,
/// dashes or parentheses. Group 1 holds the national number; area codes
/// never start with 0 or 1.
static PHONE_RE: LazyLock<Result<Regex, regex::Error>> = LazyLock::new(|| {
    Regex::new(r"^[\s+]*(?:1[\s().-]*)?([\s().-]*[2-9](?:[\s().-]*[0-9]){9})[\s().-]*$")
});

/// A US phone number normalized to its 10 national digits.
///
/// Customers log in at the front desk by phone, so this is the key every
/// customer record is stored under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Parses a phone number typed at the desk.
    ///
    /// Accepts punctuation, spaces and an optional leading country code
    /// `1` / `+1`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Phone`] if the input does not reduce to
    /// 10 digits with a valid area code.
    #[inline]
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let national = pattern(&PHONE_RE)?
            .captures(input)
            .and_then(|caps| caps.get(1))
            .map(|digits| digits.as_str().chars().filter(char::is_ascii_digit).collect())
            .ok_or_else(|| ValidationError::Phone(input.to_owned()))?;
        Ok(Self(national))
    }

    /// Returns the 10 national digits.
    #[inline]
    #[must_use]
    pub fn digits(&self) -> &str {
        &self.0
    }

    /// Returns the last four digits, used to identify customers on
    /// receipts and in the admin list.
    #[inline]
    #[must_use]
    pub fn last_four(&self) -> String {
        self.0.chars().skip(NATIONAL_DIGITS - 4).collect()
    }
}

impl core::fmt::Display for PhoneNumber {
    #[inline]
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let area: String = self.0.chars().take(3).collect();
        let exchange: String = self.0.chars().skip(3).take(3).collect();
        let line: String = self.0.chars().skip(6).collect();
        write!(f, "({area}) {exchange}-{line}")
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = ValidationError;

    #[inline]
    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PhoneNumber> for String {
    #[inline]
    fn from(value: PhoneNumber) -> Self {
        value.0
    }
}

impl core::str::FromStr for PhoneNumber {
    type Err = ValidationError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
