//! JSON-file-based storage backend.
//!
//! Stores customers and the visit log in separate JSON files under a
//! configurable directory (default: `$XDG_DATA_HOME/playpass/`).

use core::hash::Hash;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "async")]
use core::future::{self, Future};

use super::{customer_key, merge_by_key, visit_key};
use crate::error::{PlayPassError, Result};
use crate::models::{CompletedVisit, Customer, PhoneNumber};

/// Application name used for the XDG data directory.
const APP_NAME: &str = "playpass";

/// File name for bookkeeping metadata.
const META_FILE: &str = "meta.json";
/// File name for customers.
const CUSTOMERS_FILE: &str = "customers.json";
/// File name for the visit log.
const VISITS_FILE: &str = "visits.json";
/// Sentinel file used for cross-process file locking.
const LOCK_FILE: &str = "storage.lock";

/// Metadata stored alongside record files.
#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Meta {
    /// Last sweep time, or absent if never swept.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_sweep: Option<DateTime<Utc>>,
}

/// File-backed storage that persists records as JSON files.
///
/// # Concurrency
///
/// Thread safety within a single process is provided by an in-process
/// [`Mutex`]. Cross-process safety is achieved via an advisory file lock
/// on `storage.lock` (using [`std::fs::File::lock`] /
/// [`std::fs::File::lock_shared`]), so two terminals running the CLI
/// against the same directory do not lose writes.
///
/// # File layout
///
/// ```text
/// <dir>/
///   storage.lock     (cross-process lock sentinel)
///   meta.json
///   customers.json
///   visits.json
/// ```
#[derive(Debug)]
pub struct FileStorage {
    /// Root directory containing all JSON files.
    dir: PathBuf,
    /// Mutex serializing concurrent in-process access.
    lock: Mutex<()>,
    /// Sentinel file for cross-process advisory locking.
    lock_file: fs::File,
}

impl FileStorage {
    /// Creates a new file storage rooted at the given directory.
    ///
    /// Creates the directory (and parents) if it does not exist, and opens
    /// (or creates) the `storage.lock` sentinel.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the lock
    /// file cannot be opened.
    #[inline]
    pub fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).map_err(storage_io_error)?;
        let lock_file = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(dir.join(LOCK_FILE))
            .map_err(storage_io_error)?;
        tracing::debug!(dir = %dir.display(), "opened file storage");
        Ok(Self {
            dir,
            lock: Mutex::new(()),
            lock_file,
        })
    }

    /// Returns the default XDG-compliant data directory.
    ///
    /// On Linux: `$XDG_DATA_HOME/playpass/` (typically
    /// `~/.local/share/playpass/`).
    ///
    /// # Errors
    ///
    /// Returns an error if the platform data directory cannot be determined.
    #[inline]
    pub fn default_dir() -> Result<PathBuf> {
        dirs::data_dir()
            .map(|data_path| data_path.join(APP_NAME))
            .ok_or_else(|| {
                PlayPassError::Storage("could not determine platform data directory".into())
            })
    }

    /// Returns the directory this storage writes to.
    #[inline]
    #[must_use]
    pub const fn dir(&self) -> &PathBuf {
        &self.dir
    }

    // ── Private helpers ─────────────────────────────────────────────

    /// Returns the full path for a given file name.
    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Runs `op` under the in-process mutex and a shared file lock.
    fn with_shared_lock<R, F: FnOnce() -> Result<R>>(&self, op: F) -> Result<R> {
        let _guard: MutexGuard<'_, ()> = self.lock.lock().map_err(|err| lock_poison_error(&err))?;
        self.lock_file.lock_shared().map_err(storage_io_error)?;
        let result = op();
        // Surface the unlock error only when the operation succeeded.
        if let Err(err) = self.lock_file.unlock()
            && result.is_ok()
        {
            return Err(storage_io_error(err));
        }
        result
    }

    /// Runs `op` under the in-process mutex and an exclusive file lock.
    fn with_exclusive_lock<R, F: FnOnce() -> Result<R>>(&self, op: F) -> Result<R> {
        let _guard: MutexGuard<'_, ()> = self.lock.lock().map_err(|err| lock_poison_error(&err))?;
        self.lock_file.lock().map_err(storage_io_error)?;
        let result = op();
        if let Err(err) = self.lock_file.unlock()
            && result.is_ok()
        {
            return Err(storage_io_error(err));
        }
        result
    }

    /// Reads and deserializes a JSON file, or `T::default()` if the file
    /// does not exist.
    fn read_json<T: serde::de::DeserializeOwned + Default>(&self, name: &str) -> Result<T> {
        match fs::read_to_string(self.path(name)) {
            Ok(contents) => serde_json::from_str(&contents).map_err(PlayPassError::from),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
            Err(err) => Err(storage_io_error(err)),
        }
    }

    /// Atomically writes a JSON file (write-to-tmp then rename).
    fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<()> {
        let tmp_path = self.path(&format!("{name}.tmp"));
        let json = serde_json::to_string_pretty(value).map_err(PlayPassError::from)?;
        fs::write(&tmp_path, json).map_err(storage_io_error)?;
        fs::rename(&tmp_path, self.path(name)).map_err(storage_io_error)?;
        Ok(())
    }

    /// Reads a record file under a shared lock.
    fn read_file<T: serde::de::DeserializeOwned>(&self, name: &str) -> Result<Vec<T>> {
        self.with_shared_lock(|| self.read_json(name))
    }

    /// Merges new items into a record file by key.
    fn merge_file<T, K>(&self, name: &str, new_items: Vec<T>, key_fn: fn(&T) -> K) -> Result<()>
    where
        T: Serialize + serde::de::DeserializeOwned,
        K: Hash + Eq,
    {
        if new_items.is_empty() {
            return Ok(());
        }
        self.with_exclusive_lock(|| {
            let mut existing: Vec<T> = self.read_json(name)?;
            merge_by_key(&mut existing, new_items, key_fn);
            self.write_json(name, existing.as_slice())
        })
    }

    /// Looks up one customer by phone under a shared lock.
    fn find_customer(&self, phone: &PhoneNumber) -> Result<Option<Customer>> {
        let customers: Vec<Customer> = self.read_file(CUSTOMERS_FILE)?;
        Ok(customers.into_iter().find(|c| c.phone == *phone))
    }

    /// Reads the last sweep time from meta.
    fn read_last_sweep(&self) -> Result<Option<DateTime<Utc>>> {
        self.with_shared_lock(|| Ok(self.read_json::<Meta>(META_FILE)?.last_sweep))
    }

    /// Writes the last sweep time to meta.
    fn write_last_sweep(&self, at: DateTime<Utc>) -> Result<()> {
        self.with_exclusive_lock(|| {
            let mut meta: Meta = self.read_json(META_FILE)?;
            meta.last_sweep = Some(at);
            self.write_json(META_FILE, &meta)
        })
    }

    /// Deletes all record files and metadata.
    ///
    /// The `storage.lock` sentinel is preserved.
    fn clear_all(&self) -> Result<()> {
        self.with_exclusive_lock(|| {
            for name in [META_FILE, CUSTOMERS_FILE, VISITS_FILE] {
                match fs::remove_file(self.path(name)) {
                    Ok(()) => {}
                    Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                    Err(err) => return Err(storage_io_error(err)),
                }
            }
            Ok(())
        })
    }
}

// ── Free-standing helpers ───────────────────────────────────────────────

/// Wraps an I/O error into a [`PlayPassError::Storage`].
fn storage_io_error(err: std::io::Error) -> PlayPassError {
    PlayPassError::Storage(Box::new(err))
}

/// Wraps a mutex poison error into a [`PlayPassError::Storage`].
fn lock_poison_error<T>(err: &std::sync::PoisonError<T>) -> PlayPassError {
    PlayPassError::Storage(err.to_string().into())
}

// ── BlockingStorage implementation ──────────────────────────────────────

#[cfg(feature = "blocking")]
impl super::BlockingStorage for FileStorage {
    #[inline]
    fn last_sweep(&self) -> Result<Option<DateTime<Utc>>> {
        self.read_last_sweep()
    }

    #[inline]
    fn set_last_sweep(&self, at: DateTime<Utc>) -> Result<()> {
        self.write_last_sweep(at)
    }

    #[inline]
    fn customers(&self) -> Result<Vec<Customer>> {
        self.read_file(CUSTOMERS_FILE)
    }

    #[inline]
    fn customer(&self, phone: &PhoneNumber) -> Result<Option<Customer>> {
        self.find_customer(phone)
    }

    #[inline]
    fn upsert_customers(&self, items: Vec<Customer>) -> Result<()> {
        self.merge_file(CUSTOMERS_FILE, items, customer_key)
    }

    #[inline]
    fn visits(&self) -> Result<Vec<CompletedVisit>> {
        self.read_file(VISITS_FILE)
    }

    #[inline]
    fn record_visits(&self, items: Vec<CompletedVisit>) -> Result<()> {
        self.merge_file(VISITS_FILE, items, visit_key)
    }

    #[inline]
    fn clear(&self) -> Result<()> {
        self.clear_all()
    }
}

// ── Storage (async) implementation ──────────────────────────────────────

#[cfg(feature = "async")]
impl super::Storage for FileStorage {
    #[inline]
    fn last_sweep(&self) -> impl Future<Output = Result<Option<DateTime<Utc>>>> + Send {
        future::ready(self.read_last_sweep())
    }

    #[inline]
    fn set_last_sweep(&self, at: DateTime<Utc>) -> impl Future<Output = Result<()>> + Send {
        future::ready(self.write_last_sweep(at))
    }

    #[inline]
    fn customers(&self) -> impl Future<Output = Result<Vec<Customer>>> + Send {
        future::ready(self.read_file(CUSTOMERS_FILE))
    }

    #[inline]
    fn customer(
        &self,
        phone: &PhoneNumber,
    ) -> impl Future<Output = Result<Option<Customer>>> + Send {
        future::ready(self.find_customer(phone))
    }

    #[inline]
    fn upsert_customers(&self, items: Vec<Customer>) -> impl Future<Output = Result<()>> + Send {
        future::ready(self.merge_file(CUSTOMERS_FILE, items, customer_key))
    }

    #[inline]
    fn visits(&self) -> impl Future<Output = Result<Vec<CompletedVisit>>> + Send {
        future::ready(self.read_file(VISITS_FILE))
    }

    #[inline]
    fn record_visits(
        &self,
        items: Vec<CompletedVisit>,
    ) -> impl Future<Output = Result<()>> + Send {
        future::ready(self.merge_file(VISITS_FILE, items, visit_key))
    }

    #[inline]
    fn clear(&self) -> impl Future<Output = Result<()>> + Send {
        future::ready(self.clear_all())
    }
}
