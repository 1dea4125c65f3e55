//! Expiring key/value cache for the profilekit fetch layer.
//!
//! Sits between the transport layer and the profile model, keyed by
//! strings such as `"attributes:<profileId>"` or `"settings:<appName>"`,
//! to avoid redundant remote reads. The model never touches it; the
//! caller expires keys explicitly when a mutation invalidates a
//! previously cached read (e.g. after a successful attribute update).
//!
//! Expiry is lazy: entries are checked and evicted only on `get` — there
//! is no eviction thread. Two near-simultaneous reads of an
//! about-to-expire key may disagree on whether they see the stale or the
//! absent value; that non-atomicity is accepted and documented, not a
//! bug. Each cache instance owns its own storage — nothing is shared
//! across instances.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Default time-to-live for cached entries.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// A process-local key/value store with per-entry expiry.
pub struct TtlCache<V> {
    entries: HashMap<String, Entry<V>>,
    ttl: Duration,
}

impl<V> TtlCache<V> {
    /// Create a cache with [`DEFAULT_TTL`].
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    /// Create a cache with a specific time-to-live.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    /// Look up a key, lazily evicting it if its deadline passed.
    pub fn get(&mut self, key: &str) -> Option<&V> {
        let expired = self
            .entries
            .get(key)
            .is_some_and(|e| e.expires_at <= Instant::now());
        if expired {
            tracing::debug!(key, "evicting expired cache entry");
            self.entries.remove(key);
        }
        self.entries.get(key).map(|e| &e.value)
    }

    /// Store a value, stamping its deadline from the current TTL.
    pub fn set(&mut self, key: impl Into<String>, value: V) {
        self.entries.insert(key.into(), Entry {
            value,
            expires_at: Instant::now() + self.ttl,
        });
    }

    /// Force a key to expire immediately. The slot itself is evicted on
    /// the next `get`, not atomically here.
    pub fn expire(&mut self, key: &str) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.expires_at = Instant::now();
        }
    }

    /// Drop all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Change the TTL for subsequent `set`s. Existing deadlines keep the
    /// TTL they were stamped with.
    pub fn set_ttl(&mut self, ttl: Duration) {
        self.ttl = ttl;
    }

    /// Number of stored slots, expired-but-unevicted ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Tests
// ============================================================================
