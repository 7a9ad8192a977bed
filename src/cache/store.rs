//! Cache Store Module
//!
//! Main cache engine: a HashMap of type-erased entries behind a single
//! reader/writer lock, with TTL expiration and expiration-order eviction.

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use tracing::debug;

use crate::cache::stats::StatsCounters;
use crate::cache::{AnyValue, CacheEntry, CacheStats};
use crate::config::Config;

/// Shared handle onto one store, handed to every collaborator.
pub type SharedStore = Arc<CacheStore>;

// == Lookup ==
/// Outcome of a typed read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    /// A live entry holding a `T`
    Hit(T),
    /// No live entry for the key (absent or expired)
    Miss,
    /// A live entry exists but holds another type
    TypeMismatch,
}

impl<T> Lookup<T> {
    pub fn is_hit(&self) -> bool {
        matches!(self, Lookup::Hit(_))
    }

    /// Collapses `Miss` and `TypeMismatch` into `None`.
    pub fn into_option(self) -> Option<T> {
        match self {
            Lookup::Hit(value) => Some(value),
            Lookup::Miss | Lookup::TypeMismatch => None,
        }
    }

    /// Returns the hit value or `T::default()`.
    pub fn unwrap_or_default(self) -> T
    where
        T: Default,
    {
        self.into_option().unwrap_or_default()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Lookup::Hit(value) => Lookup::Hit(f(value)),
            Lookup::Miss => Lookup::Miss,
            Lookup::TypeMismatch => Lookup::TypeMismatch,
        }
    }
}

// == Cache Store ==
/// Keyed store with expiration and a bounded entry count.
///
/// All methods take `&self`; share it through [`SharedStore`].
#[derive(Debug)]
pub struct CacheStore {
    /// Key-value storage
    entries: RwLock<HashMap<String, CacheEntry>>,
    /// Maximum number of entries, adjustable at runtime
    max_entries: AtomicUsize,
    /// Performance statistics
    stats: StatsCounters,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a new store holding at most `max_entries` entries.
    ///
    /// The capacity is not validated; see [`CacheStore::set`] for how a zero
    /// capacity behaves.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries: AtomicUsize::new(max_entries),
            stats: StatsCounters::default(),
        }
    }

    /// Creates a store sized from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.max_entries)
    }

    /// Wraps the store into a [`SharedStore`].
    pub fn shared(self) -> SharedStore {
        Arc::new(self)
    }

    // == Capacity ==
    /// Current maximum entry count.
    pub fn max_entries(&self) -> usize {
        self.max_entries.load(Ordering::Relaxed)
    }

    /// Changes the maximum entry count for every holder of this store.
    ///
    /// Existing entries are not trimmed; the next insert of a new key evicts
    /// down to the new limit.
    pub fn set_max_entries(&self, max_entries: usize) {
        self.max_entries.store(max_entries, Ordering::Relaxed);
        debug!(max_entries, "cache capacity changed");
    }

    // == Set ==
    /// Stores `value` under `key` for `ttl`, replacing any previous entry.
    ///
    /// When the key is new and the store is full, entries with the earliest
    /// expiration are evicted until there is room. With a capacity of zero
    /// the store is emptied and then holds just the new entry.
    pub fn set<T>(&self, key: impl Into<String>, value: T, ttl: Duration)
    where
        T: Any + Send + Sync,
    {
        self.set_raw(key, Arc::new(value), ttl);
    }

    /// Stores an already type-erased value.
    pub fn set_raw(&self, key: impl Into<String>, value: AnyValue, ttl: Duration) {
        let key = key.into();
        let mut entries = self.entries.write();

        if !entries.contains_key(&key) {
            let max_entries = self.max_entries();
            while entries.len() >= max_entries {
                let Some(victim) = earliest_expiring(&entries) else {
                    break;
                };
                entries.remove(&victim);
                self.stats.record_eviction();
                debug!(key = %victim, "evicted entry with earliest expiry");
            }
        }

        entries.insert(key, CacheEntry::new(value, ttl));
    }

    // == Get ==
    /// Retrieves a live value of type `T`.
    ///
    /// Expired entries read as [`Lookup::Miss`] and are removed before
    /// returning. A live entry of another type reads as
    /// [`Lookup::TypeMismatch`].
    pub fn get<T>(&self, key: &str) -> Lookup<T>
    where
        T: Any + Clone,
    {
        let Some(value) = self.lookup(key) else {
            self.stats.record_miss();
            return Lookup::Miss;
        };

        match value.downcast_ref::<T>() {
            Some(typed) => {
                self.stats.record_hit();
                Lookup::Hit(typed.clone())
            }
            None => {
                self.stats.record_miss();
                Lookup::TypeMismatch
            }
        }
    }

    /// Retrieves a live value without a type check.
    pub fn get_raw(&self, key: &str) -> Option<AnyValue> {
        let value = self.lookup(key);
        match value {
            Some(_) => self.stats.record_hit(),
            None => self.stats.record_miss(),
        }
        value
    }

    fn lookup(&self, key: &str) -> Option<AnyValue> {
        let now = Instant::now();
        {
            let entries = self.entries.read();
            match entries.get(key) {
                None => return None,
                Some(entry) if !entry.is_expired_at(now) => return Some(Arc::clone(&entry.value)),
                Some(_) => {}
            }
        }

        // Expired: drop the shared lock before taking the exclusive one.
        self.remove_if_expired(key);
        None
    }

    /// Removes `key` if it is (still) expired. A concurrent `set` may have
    /// refreshed it since it was observed expired.
    fn remove_if_expired(&self, key: &str) -> bool {
        let mut entries = self.entries.write();
        let expired = entries
            .get(key)
            .is_some_and(|entry| entry.is_expired_at(Instant::now()));
        if expired {
            entries.remove(key);
            self.stats.record_expirations(1);
            debug!(key, "removed expired entry on read");
        }
        expired
    }

    // == Delete ==
    /// Removes an entry by key. Returns whether an entry was present.
    pub fn delete(&self, key: &str) -> bool {
        self.entries.write().remove(key).is_some()
    }

    /// Removes every entry and resets the statistics.
    pub fn clear(&self) {
        self.entries.write().clear();
        self.stats.reset();
    }

    // == TTL ==
    /// Remaining lifetime of a live entry.
    pub fn ttl_remaining(&self, key: &str) -> Option<Duration> {
        let entries = self.entries.read();
        entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(CacheEntry::ttl_remaining)
    }

    // == Expired Entries ==
    /// Snapshot of the keys that are expired right now, taken under the
    /// shared lock.
    pub fn expired_keys(&self) -> Vec<String> {
        let now = Instant::now();
        self.entries
            .read()
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Removes the given keys under one exclusive lock, skipping any that
    /// are no longer expired. Returns the number removed.
    pub fn remove_expired(&self, keys: &[String]) -> usize {
        if keys.is_empty() {
            return 0;
        }

        let now = Instant::now();
        let mut entries = self.entries.write();
        let mut removed = 0;
        for key in keys {
            if entries.get(key).is_some_and(|entry| entry.is_expired_at(now)) {
                entries.remove(key);
                removed += 1;
            }
        }

        self.stats.record_expirations(removed);
        removed
    }

    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&self) -> usize {
        let expired = self.expired_keys();
        self.remove_expired(&expired)
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.len(), self.max_entries())
    }

    // == Length ==
    /// Number of entries physically present, including expired ones not yet
    /// removed.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

/// Key of the entry that expires first. Ties go to whichever the map yields
/// first.
fn earliest_expiring(entries: &HashMap<String, CacheEntry>) -> Option<String> {
    entries
        .iter()
        .min_by_key(|(_, entry)| entry.expires_at)
        .map(|(key, _)| key.clone())
}
