//! Memo Cache - an in-process TTL cache with compute-on-miss memoization
//!
//! Provides a shared keyed store with expiration, expiration-order eviction,
//! a background expiry sweeper, typed accessors and a `load` helper that
//! runs a producer only when the cached value is missing.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheStore, Lookup, SharedStore, TypedView, ZeroValue};
pub use config::Config;
pub use error::CacheError;
pub use tasks::{spawn_sweeper, Sweeper};
