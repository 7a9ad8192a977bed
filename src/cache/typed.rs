//! Typed View Module
//!
//! Typed accessors layered on the store's untyped get/set.

use std::any::Any;
use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;

use crate::cache::{Lookup, SharedStore, ZeroValue};
use crate::error::CacheError;

/// Map of strings.
pub type StringMap = HashMap<String, String>;
/// Map of arbitrary JSON-like values.
pub type ValueMap = HashMap<String, Value>;
/// List of [`ValueMap`]s.
pub type ValueMapList = Vec<ValueMap>;

// == Typed View ==
/// Stateless handle exposing typed accessors over a shared store.
///
/// The `get_*` accessors return the type's zero value when the key is
/// absent, expired, or holds a different type. Use [`TypedView::lookup`] to
/// tell those cases apart.
#[derive(Debug, Clone)]
pub struct TypedView {
    store: SharedStore,
}

impl TypedView {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Typed read that distinguishes a miss from a type mismatch.
    pub fn lookup<T>(&self, key: &str) -> Lookup<T>
    where
        T: Any + Clone,
    {
        self.store.get(key)
    }

    fn get_or_zero<T>(&self, key: &str) -> T
    where
        T: Any + Clone + Default,
    {
        self.lookup(key).unwrap_or_default()
    }

    // == Strings ==
    pub fn set_string(&self, key: &str, value: impl Into<String>, ttl: Duration) {
        self.store.set(key, value.into(), ttl);
    }

    pub fn get_string(&self, key: &str) -> String {
        self.get_or_zero(key)
    }

    // == Integers ==
    pub fn set_int(&self, key: &str, value: i64, ttl: Duration) {
        self.store.set(key, value, ttl);
    }

    pub fn get_int(&self, key: &str) -> i64 {
        self.get_or_zero(key)
    }

    // == Maps ==
    pub fn set_string_map(&self, key: &str, value: StringMap, ttl: Duration) {
        self.store.set(key, value, ttl);
    }

    pub fn get_string_map(&self, key: &str) -> StringMap {
        self.get_or_zero(key)
    }

    pub fn set_value_map(&self, key: &str, value: ValueMap, ttl: Duration) {
        self.store.set(key, value, ttl);
    }

    pub fn get_value_map(&self, key: &str) -> ValueMap {
        self.get_or_zero(key)
    }

    // == Lists ==
    pub fn set_value_map_list(&self, key: &str, value: ValueMapList, ttl: Duration) {
        self.store.set(key, value, ttl);
    }

    pub fn get_value_map_list(&self, key: &str) -> ValueMapList {
        self.get_or_zero(key)
    }

    pub fn set_string_list(&self, key: &str, value: Vec<String>, ttl: Duration) {
        self.store.set(key, value, ttl);
    }

    pub fn get_string_list(&self, key: &str) -> Vec<String> {
        self.get_or_zero(key)
    }

    // == Load ==
    /// See [`crate::cache::CacheStore::load`].
    pub fn load<T, E, F>(&self, key: &str, ttl: Duration, producer: F) -> Result<T, E>
    where
        T: ZeroValue + Clone + Send + Sync + 'static,
        E: From<CacheError>,
        F: FnOnce() -> Result<T, E>,
    {
        self.store.load(key, ttl, producer)
    }

    pub fn delete(&self, key: &str) -> bool {
        self.store.delete(key)
    }
}
