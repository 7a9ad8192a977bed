//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Type-erased payload stored in the cache.
///
/// Callers recover the concrete type by downcasting; see `Lookup`.
pub type AnyValue = Arc<dyn Any + Send + Sync>;

// == Cache Entry ==
/// A single cache entry: the payload and the instant it stops being valid.
#[derive(Clone)]
pub struct CacheEntry {
    /// The stored value
    pub value: AnyValue,
    /// Absolute expiration instant
    pub expires_at: Instant,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry expiring `ttl` from now.
    pub fn new(value: AnyValue, ttl: Duration) -> Self {
        let now = Instant::now();
        // A ttl too large to represent never expires in practice.
        let expires_at = now
            .checked_add(ttl)
            .unwrap_or_else(|| now + Duration::from_secs(100 * 365 * 24 * 3600));

        Self { value, expires_at }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// An entry is expired once `now >= expires_at`, so a zero ttl yields an
    /// entry that is expired immediately.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    /// Checks if the entry has expired.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    // == Time To Live ==
    /// Returns the remaining lifetime, `Duration::ZERO` once expired.
    pub fn ttl_remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}

impl std::fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheEntry")
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    fn entry(ttl: Duration) -> CacheEntry {
        CacheEntry::new(Arc::new("test_value".to_string()), ttl)
    }

    #[test]
    fn test_entry_creation_with_ttl() {
        let entry = entry(Duration::from_secs(60));

        assert_eq!(
            entry.value.downcast_ref::<String>().map(String::as_str),
            Some("test_value")
        );
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_entry_expiration() {
        let entry = entry(Duration::from_millis(50));

        assert!(!entry.is_expired());

        sleep(Duration::from_millis(80));

        assert!(entry.is_expired());
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = entry(Duration::ZERO);

        // Expired as soon as now >= expires_at
        assert!(entry.is_expired_at(entry.expires_at));
        assert!(entry.is_expired());
    }

    #[test]
    fn test_ttl_remaining() {
        let entry = entry(Duration::from_secs(10));

        let remaining = entry.ttl_remaining();
        assert!(remaining <= Duration::from_secs(10));
        assert!(remaining >= Duration::from_secs(9));
    }

    #[test]
    fn test_ttl_remaining_expired() {
        let entry = entry(Duration::from_millis(10));

        sleep(Duration::from_millis(30));

        assert_eq!(entry.ttl_remaining(), Duration::ZERO);
    }

    #[test]
    fn test_huge_ttl_does_not_overflow() {
        let entry = entry(Duration::MAX);
        assert!(!entry.is_expired());
    }
}
