//! Newtype wrappers for entity identifiers.
//!
//! These prevent accidentally mixing up IDs of different entity types
//! at compile time.

use serde::{Deserialize, Serialize};

/// Number of hex characters kept by the short display form of an ID.
const SHORT_LEN: usize = 6;

/// Macro to define a newtype ID wrapping a `String`.
///
/// The `prefix` form adds [`generate`](PurchaseId::generate) and a short
/// display form; IDs without a prefix are assigned by hand (catalog slugs).
macro_rules! define_string_id {
    // ── Shared struct and trait impls ───────────────────────────────
    (@traits $(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl core::fmt::Display for $name {
            #[inline]
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<String> for $name {
            #[inline]
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            #[inline]
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }
    };

    // ── Hand-assigned IDs ───────────────────────────────────────────
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        define_string_id!(@traits $(#[$meta])* $name);

        impl $name {
            /// Creates a new identifier from the given string.
            #[inline]
            #[must_use]
            pub const fn new(value: String) -> Self {
                Self(value)
            }

            /// Returns a reference to the inner string.
            #[inline]
            #[must_use]
            pub fn as_inner(&self) -> &str {
                &self.0
            }

            /// Consumes the wrapper and returns the inner string.
            #[inline]
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }
    };

    // ── Generated, prefixed IDs ─────────────────────────────────────
    (
        $(#[$meta:meta])*
        $name:ident, prefix = $prefix:literal
    ) => {
        define_string_id!(@traits $(#[$meta])* $name);

        impl $name {
            /// Creates a new identifier from the given string.
            #[inline]
            #[must_use]
            pub const fn new(value: String) -> Self {
                Self(value)
            }

            /// Generates a fresh random identifier.
            #[inline]
            #[must_use]
            pub fn generate() -> Self {
                Self(format!("{}{}", $prefix, uuid::Uuid::new_v4().simple()))
            }

            /// Returns a reference to the inner string.
            #[inline]
            #[must_use]
            pub fn as_inner(&self) -> &str {
                &self.0
            }

            /// Consumes the wrapper and returns the inner string.
            #[inline]
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }

            /// Returns the prefix plus the first few characters, for
            /// display in narrow tables.
            #[inline]
            #[must_use]
            pub fn short(&self) -> String {
                self.0.chars().take($prefix.len() + SHORT_LEN).collect()
            }

            /// Returns `true` if `query` is this ID or a prefix of it.
            #[inline]
            #[must_use]
            pub fn matches_prefix(&self, query: &str) -> bool {
                !query.is_empty() && self.0.starts_with(query)
            }
        }
    };
}

define_string_id! {
    /// Unique identifier for a purchased pass.
    PurchaseId, prefix = "pur_"
}

define_string_id! {
    /// Unique identifier for a check-in session.
    SessionId, prefix = "ses_"
}

define_string_id! {
    /// Unique identifier for a saved payment card.
    CardId, prefix = "card_"
}

define_string_id! {
    /// Unique identifier for a payment authorization.
    ReceiptId, prefix = "rcpt_"
}

define_string_id! {
    /// Catalog slug identifying a product (e.g. `day-pass`).
    ProductId
}
