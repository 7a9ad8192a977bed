//! Cache Module
//!
//! In-memory caching with TTL expiration, expiration-order eviction, typed
//! accessors and compute-on-miss memoization.

mod entry;
mod load;
mod stats;
mod store;
mod typed;


// Re-export public types
pub use entry::{AnyValue, CacheEntry};
pub use load::ZeroValue;
pub use stats::CacheStats;
pub use store::{CacheStore, Lookup, SharedStore};
pub use typed::{StringMap, TypedView, ValueMap, ValueMapList};
