//! In-memory storage backend.
//!
//! Provides [`InMemoryStorage`], a thread-safe in-memory implementation of
//! the storage traits. It is the default backend for the facades and the
//! natural choice for tests.

use std::sync::Mutex;

use chrono::{DateTime, Utc};

#[cfg(feature = "async")]
use core::future::{self, Future};

use super::{customer_key, merge_by_key, visit_key};
use crate::error::{PlayPassError, Result};
use crate::models::{CompletedVisit, Customer, PhoneNumber};

/// Thread-safe in-memory storage.
///
/// This type implements both [`super::Storage`] (async) and
/// [`super::BlockingStorage`] (blocking) traits. Data lives only as long
/// as the value.
///
/// # Example
///
/// ```rust
/// use playpass::storage::InMemoryStorage;
///
/// let storage = InMemoryStorage::new();
/// // PlayCenterBlocking::builder().storage(storage).build()
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    /// All state behind a single mutex for thread-safe interior mutability.
    inner: Mutex<Inner>,
}

/// Inner mutable state.
#[derive(Debug, Default)]
struct Inner {
    /// Last sweep time.
    last_sweep: Option<DateTime<Utc>>,
    /// Customers in registration order.
    customers: Vec<Customer>,
    /// Completed visits, oldest first.
    visits: Vec<CompletedVisit>,
}

impl InMemoryStorage {
    /// Creates a new empty in-memory storage.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the inner lock and applies a closure.
    fn with_lock<R, F: FnOnce(&mut Inner) -> R>(&self, op: F) -> Result<R> {
        let mut inner = self.inner.lock().map_err(|err| lock_error(&err))?;
        Ok(op(&mut inner))
    }

    /// Looks up one customer by phone.
    fn find(&self, phone: &PhoneNumber) -> Result<Option<Customer>> {
        self.with_lock(|inner| inner.customers.iter().find(|c| c.phone == *phone).cloned())
    }
}

/// Wraps a mutex poison error.
fn lock_error<T>(err: &std::sync::PoisonError<T>) -> PlayPassError {
    PlayPassError::Storage(err.to_string().into())
}

// ── BlockingStorage implementation ──────────────────────────────────────

#[cfg(feature = "blocking")]
impl super::BlockingStorage for InMemoryStorage {
    #[inline]
    fn last_sweep(&self) -> Result<Option<DateTime<Utc>>> {
        self.with_lock(|inner| inner.last_sweep)
    }

    #[inline]
    fn set_last_sweep(&self, at: DateTime<Utc>) -> Result<()> {
        self.with_lock(|inner| inner.last_sweep = Some(at))
    }

    #[inline]
    fn customers(&self) -> Result<Vec<Customer>> {
        self.with_lock(|inner| inner.customers.clone())
    }

    #[inline]
    fn customer(&self, phone: &PhoneNumber) -> Result<Option<Customer>> {
        self.find(phone)
    }

    #[inline]
    fn upsert_customers(&self, items: Vec<Customer>) -> Result<()> {
        self.with_lock(|inner| merge_by_key(&mut inner.customers, items, customer_key))
    }

    #[inline]
    fn visits(&self) -> Result<Vec<CompletedVisit>> {
        self.with_lock(|inner| inner.visits.clone())
    }

    #[inline]
    fn record_visits(&self, items: Vec<CompletedVisit>) -> Result<()> {
        self.with_lock(|inner| merge_by_key(&mut inner.visits, items, visit_key))
    }

    #[inline]
    fn clear(&self) -> Result<()> {
        self.with_lock(|inner| *inner = Inner::default())
    }
}

// ── Storage (async) implementation ──────────────────────────────────────

#[cfg(feature = "async")]
impl super::Storage for InMemoryStorage {
    #[inline]
    fn last_sweep(&self) -> impl Future<Output = Result<Option<DateTime<Utc>>>> + Send {
        future::ready(self.with_lock(|inner| inner.last_sweep))
    }

    #[inline]
    fn set_last_sweep(&self, at: DateTime<Utc>) -> impl Future<Output = Result<()>> + Send {
        future::ready(self.with_lock(|inner| inner.last_sweep = Some(at)))
    }

    #[inline]
    fn customers(&self) -> impl Future<Output = Result<Vec<Customer>>> + Send {
        future::ready(self.with_lock(|inner| inner.customers.clone()))
    }

    #[inline]
    fn customer(
        &self,
        phone: &PhoneNumber,
    ) -> impl Future<Output = Result<Option<Customer>>> + Send {
        future::ready(self.find(phone))
    }

    #[inline]
    fn upsert_customers(&self, items: Vec<Customer>) -> impl Future<Output = Result<()>> + Send {
        future::ready(
            self.with_lock(|inner| merge_by_key(&mut inner.customers, items, customer_key)),
        )
    }

    #[inline]
    fn visits(&self) -> impl Future<Output = Result<Vec<CompletedVisit>>> + Send {
        future::ready(self.with_lock(|inner| inner.visits.clone()))
    }

    #[inline]
    fn record_visits(
        &self,
        items: Vec<CompletedVisit>,
    ) -> impl Future<Output = Result<()>> + Send {
        future::ready(self.with_lock(|inner| merge_by_key(&mut inner.visits, items, visit_key)))
    }

    #[inline]
    fn clear(&self) -> impl Future<Output = Result<()>> + Send {
        future::ready(self.with_lock(|inner| *inner = Inner::default()))
    }
}
