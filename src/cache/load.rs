//! Load Module
//!
//! Compute-on-miss memoization on top of the store.
//!
//! Concurrent misses for the same key each run their producer; whichever
//! write lands last is kept.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::future::Future;
use std::hash::BuildHasher;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::cache::{CacheStore, Lookup};
use crate::error::CacheError;

// == Zero Value ==
/// Emptiness test applied to freshly produced values.
///
/// Zero values are returned to the caller but never cached.
pub trait ZeroValue {
    fn is_zero(&self) -> bool;
}

macro_rules! impl_zero_for_ints {
    ($($t:ty),*) => {
        $(impl ZeroValue for $t {
            fn is_zero(&self) -> bool {
                *self == 0
            }
        })*
    };
}

impl_zero_for_ints!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl ZeroValue for f32 {
    fn is_zero(&self) -> bool {
        *self == 0.0
    }
}

impl ZeroValue for f64 {
    fn is_zero(&self) -> bool {
        *self == 0.0
    }
}

impl ZeroValue for bool {
    fn is_zero(&self) -> bool {
        !*self
    }
}

impl ZeroValue for String {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<T> ZeroValue for Vec<T> {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V, S: BuildHasher> ZeroValue for HashMap<K, V, S> {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V> ZeroValue for BTreeMap<K, V> {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<T, S: BuildHasher> ZeroValue for HashSet<T, S> {
    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl<T> ZeroValue for Option<T> {
    fn is_zero(&self) -> bool {
        self.is_none()
    }
}

impl<T: ZeroValue + ?Sized> ZeroValue for Arc<T> {
    fn is_zero(&self) -> bool {
        (**self).is_zero()
    }
}

impl<T: ZeroValue + ?Sized> ZeroValue for Box<T> {
    fn is_zero(&self) -> bool {
        (**self).is_zero()
    }
}

impl ZeroValue for Value {
    fn is_zero(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(b) => !b,
            Value::Number(n) => n.as_f64() == Some(0.0),
            Value::String(s) => s.is_empty(),
            Value::Array(a) => a.is_empty(),
            Value::Object(o) => o.is_empty(),
        }
    }
}

impl CacheStore {
    // == Load ==
    /// Returns the cached `T` for `key`, or runs `producer` and caches its
    /// result for `ttl`.
    ///
    /// - An empty key fails with [`CacheError::EmptyKey`] before the store is
    ///   touched.
    /// - A live entry of type `T` is returned without calling `producer`.
    ///   Absent, expired and wrongly-typed entries all fall through to it.
    /// - A producer error is returned as is and nothing is written.
    /// - A zero result (see [`ZeroValue`]) is returned but not cached, so the
    ///   next call computes again.
    pub fn load<T, E, F>(&self, key: &str, ttl: Duration, producer: F) -> Result<T, E>
    where
        T: ZeroValue + Clone + Send + Sync + 'static,
        E: From<CacheError>,
        F: FnOnce() -> Result<T, E>,
    {
        if let Some(value) = self.cached_for_load(key)? {
            return Ok(value);
        }

        let value = producer()?;
        self.store_produced(key, &value, ttl);
        Ok(value)
    }

    /// Async twin of [`CacheStore::load`] for producers that await.
    ///
    /// No lock is held while the producer runs.
    pub async fn load_async<T, E, F, Fut>(&self, key: &str, ttl: Duration, producer: F) -> Result<T, E>
    where
        T: ZeroValue + Clone + Send + Sync + 'static,
        E: From<CacheError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.cached_for_load(key)? {
            return Ok(value);
        }

        let value = producer().await?;
        self.store_produced(key, &value, ttl);
        Ok(value)
    }

    fn cached_for_load<T>(&self, key: &str) -> Result<Option<T>, CacheError>
    where
        T: Clone + 'static,
    {
        if key.is_empty() {
            return Err(CacheError::EmptyKey);
        }

        match self.get::<T>(key) {
            Lookup::Hit(value) => Ok(Some(value)),
            Lookup::Miss | Lookup::TypeMismatch => Ok(None),
        }
    }

    fn store_produced<T>(&self, key: &str, value: &T, ttl: Duration)
    where
        T: ZeroValue + Clone + Send + Sync + 'static,
    {
        if value.is_zero() {
            debug!(key, "producer returned an empty value, not caching");
            return;
        }
        self.set(key, value.clone(), ttl);
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_test::{assert_err, assert_ok};

    const TTL: Duration = Duration::from_secs(60);

    #[derive(Debug, PartialEq)]
    enum TestError {
        Cache(CacheError),
        Producer(&'static str),
    }

    impl From<CacheError> for TestError {
        fn from(err: CacheError) -> Self {
            TestError::Cache(err)
        }
    }

    #[test]
    fn test_load_invokes_producer_once() {
        let store = CacheStore::new(100);
        let calls = Cell::new(0);
        let producer = || {
            calls.set(calls.get() + 1);
            Ok::<_, TestError>("computed".to_string())
        };

        let first = assert_ok!(store.load("k", TTL, producer));
        let second = assert_ok!(store.load("k", TTL, producer));

        assert_eq!(first, "computed");
        assert_eq!(second, "computed");
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_load_does_not_cache_empty_results() {
        let store = CacheStore::new(100);
        let calls = Cell::new(0);
        let producer = || {
            calls.set(calls.get() + 1);
            Ok::<_, TestError>(String::new())
        };

        for _ in 0..3 {
            assert_eq!(assert_ok!(store.load("k", TTL, producer)), "");
        }

        assert_eq!(calls.get(), 3);
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_propagates_producer_error_without_caching() {
        let store = CacheStore::new(100);

        let err = assert_err!(store.load::<i64, _, _>("k", TTL, || Err(TestError::Producer("boom"))));

        assert_eq!(err, TestError::Producer("boom"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_rejects_empty_key_before_producing() {
        let store = CacheStore::new(100);
        let called = Cell::new(false);

        let err = assert_err!(store.load("", TTL, || {
            called.set(true);
            Ok::<_, TestError>(1_i64)
        }));

        assert_eq!(err, TestError::Cache(CacheError::EmptyKey));
        assert!(!called.get());
    }

    #[test]
    fn test_load_recomputes_on_type_mismatch() {
        let store = CacheStore::new(100);
        store.set("k", "text".to_string(), TTL);

        let value = assert_ok!(store.load("k", TTL, || Ok::<_, TestError>(9_i64)));

        assert_eq!(value, 9);
        assert_eq!(store.get::<i64>("k"), Lookup::Hit(9));
    }

    #[test]
    fn test_load_recomputes_after_expiry() {
        let store = CacheStore::new(100);
        let calls = Cell::new(0);
        let producer = || {
            calls.set(calls.get() + 1);
            Ok::<_, TestError>(calls.get() as u64)
        };

        assert_eq!(assert_ok!(store.load("k", Duration::from_millis(20), producer)), 1);
        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(assert_ok!(store.load("k", Duration::from_millis(20), producer)), 2);
    }

    #[test]
    fn test_load_with_anyhow_errors() {
        let store = CacheStore::new(100);

        let err = store
            .load::<String, anyhow::Error, _>("", TTL, || Ok("x".to_string()))
            .unwrap_err();
        assert_eq!(err.downcast_ref::<CacheError>(), Some(&CacheError::EmptyKey));

        let err = store
            .load::<String, anyhow::Error, _>("k", TTL, || Err(anyhow::anyhow!("upstream down")))
            .unwrap_err();
        assert_eq!(err.to_string(), "upstream down");
    }

    #[tokio::test]
    async fn test_load_async_memoizes() {
        let store = CacheStore::new(100);
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let value = store
                .load_async("k", TTL, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, TestError>(vec!["a".to_string()])
                })
                .await;
            assert_eq!(assert_ok!(value), vec!["a".to_string()]);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_zero_values() {
        assert!(0_i64.is_zero());
        assert!(!7_u8.is_zero());
        assert!(0.0_f64.is_zero());
        assert!(String::new().is_zero());
        assert!(Vec::<String>::new().is_zero());
        assert!(HashMap::<String, String>::new().is_zero());
        assert!(None::<i64>.is_zero());
        assert!(!Some(0_i64).is_zero());
        assert!(Value::Null.is_zero());
        assert!(serde_json::json!({}).is_zero());
        assert!(!serde_json::json!({"a": 1}).is_zero());
        assert!(Arc::new(String::new()).is_zero());
    }
}
