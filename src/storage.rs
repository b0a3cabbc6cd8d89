//! Pluggable storage backends for play center records.
//!
//! This module defines the [`Storage`] (async) and [`BlockingStorage`]
//! (blocking) traits via a shared macro, so both facades in
//! [`crate::play_center`] see the same set of operations.

#[cfg(feature = "storage-file")]
mod file;
mod memory;

use core::hash::Hash;
use std::collections::HashMap;

use crate::models::{CompletedVisit, Customer, PhoneNumber, SessionId};

#[cfg(feature = "storage-file")]
pub use file::FileStorage;
pub use memory::InMemoryStorage;

/// Generates a storage trait (async or blocking) with all record methods.
///
/// Uses `@methods` to define the method list once, and `@method` to render
/// each method in async (`impl Future + Send`) or blocking (`fn`) style.
macro_rules! define_storage {
    // ── Entry points ────────────────────────────────────────────────
    (
        trait_name: $trait_name:ident,
        trait_doc: $trait_doc:expr,
        mode: async_mode,
    ) => {
        #[doc = $trait_doc]
        pub trait $trait_name: core::fmt::Debug + Send + Sync {
            define_storage!(@methods async_mode);
        }
    };
    (
        trait_name: $trait_name:ident,
        trait_doc: $trait_doc:expr,
        mode: blocking,
    ) => {
        #[doc = $trait_doc]
        pub trait $trait_name: core::fmt::Debug + Send + Sync {
            define_storage!(@methods blocking);
        }
    };

    // ── Single method list (shared between both variants) ───────────
    (@methods $mode:ident) => {
        // Sweep bookkeeping
        define_storage!(@method $mode, last_sweep,
            "Returns when all customers were last swept for expiry and auto-checkout.\n\nReturns `Ok(None)` if no sweep has run yet.\n\n# Errors\n\nReturns an error if the storage backend fails to read.",
            -> Result<Option<DateTime<Utc>>>);
        define_storage!(@method $mode, set_last_sweep,
            "Records the time of a completed sweep.\n\n# Errors\n\nReturns an error if the storage backend fails to write.",
            at: DateTime<Utc>, -> Result<()>);

        // Customers
        define_storage!(@method $mode, customers,
            "Returns all stored customers in registration order.\n\n# Errors\n\nReturns an error if the storage backend fails to read.",
            -> Result<Vec<Customer>>);
        define_storage!(@method $mode, customer,
            "Returns the customer registered under `phone`, if any.\n\n# Errors\n\nReturns an error if the storage backend fails to read.",
            phone: &PhoneNumber, -> Result<Option<Customer>>);
        define_storage!(@method $mode, upsert_customers,
            "Inserts or replaces customers (matched by phone number).\n\n# Errors\n\nReturns an error if the storage backend fails to write.",
            items: Vec<Customer>, -> Result<()>);

        // Visit log
        define_storage!(@method $mode, visits,
            "Returns the completed visit log, oldest first.\n\n# Errors\n\nReturns an error if the storage backend fails to read.",
            -> Result<Vec<CompletedVisit>>);
        define_storage!(@method $mode, record_visits,
            "Appends completed visits. A visit whose session is already logged replaces the earlier entry.\n\n# Errors\n\nReturns an error if the storage backend fails to write.",
            items: Vec<CompletedVisit>, -> Result<()>);

        // Clear
        define_storage!(@method $mode, clear,
            "Removes all stored data.\n\n# Errors\n\nReturns an error if the storage backend fails to write.",
            -> Result<()>);
    };

    // ── Blocking method renderer ────────────────────────────────────
    (@method blocking, $name:ident, $doc:expr,
     $($param:ident: $param_ty:ty,)* -> $ret:ty) => {
        #[doc = $doc]
        fn $name(&self $(, $param: $param_ty)*) -> $ret;
    };

    // ── Async method renderer (returns impl Future + Send) ──────────
    (@method async_mode, $name:ident, $doc:expr,
     $($param:ident: $param_ty:ty,)* -> $ret:ty) => {
        #[doc = $doc]
        fn $name(&self $(, $param: $param_ty)*)
            -> impl core::future::Future<Output = $ret> + Send;
    };
}

#[cfg(feature = "async")]
mod async_storage {
    //! Async storage trait definition.

    use crate::error::Result;
    use crate::models::{CompletedVisit, Customer, PhoneNumber};
    use chrono::{DateTime, Utc};

    define_storage! {
        trait_name: Storage,
        trait_doc: "Async storage backend for play center records.\n\nAll methods take `&self`; implementations use interior mutability\n(e.g. `Mutex`) for thread-safe mutation.",
        mode: async_mode,
    }
}

#[cfg(feature = "blocking")]
mod blocking_storage {
    //! Blocking storage trait definition.

    use crate::error::Result;
    use crate::models::{CompletedVisit, Customer, PhoneNumber};
    use chrono::{DateTime, Utc};

    define_storage! {
        trait_name: BlockingStorage,
        trait_doc: "Blocking storage backend for play center records.\n\nAll methods take `&self`; implementations use interior mutability\n(e.g. `Mutex`) for thread-safe mutation.",
        mode: blocking,
    }
}

#[cfg(feature = "async")]
pub use async_storage::Storage;
#[cfg(feature = "blocking")]
pub use blocking_storage::BlockingStorage;

/// Merges `new_items` into `existing` by key.
///
/// Items whose key already exists are replaced in place; new keys are
/// appended in the order given, so insertion order is preserved.
fn merge_by_key<T, K>(existing: &mut Vec<T>, new_items: Vec<T>, key_fn: fn(&T) -> K)
where
    K: Hash + Eq,
{
    let mut positions: HashMap<K, usize> = existing
        .iter()
        .enumerate()
        .map(|(pos, item)| (key_fn(item), pos))
        .collect();
    for item in new_items {
        let key = key_fn(&item);
        match positions.get(&key).and_then(|&pos| existing.get_mut(pos)) {
            Some(slot) => *slot = item,
            None => {
                let _previous = positions.insert(key, existing.len());
                existing.push(item);
            }
        }
    }
}

/// Key for customer records.
fn customer_key(customer: &Customer) -> PhoneNumber {
    customer.phone.clone()
}

/// Key for visit log entries.
fn visit_key(visit: &CompletedVisit) -> SessionId {
    visit.session_id.clone()
}
