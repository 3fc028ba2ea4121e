use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Default time-to-live for a resolved hour.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

#[derive(Clone, Copy, Debug)]
struct CacheEntry {
    value: f64,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Process-wide TTL map from bucket key to aggregated price.
///
/// Purely a performance layer: entries may vanish at any time and the
/// repository is consulted on a miss. No capacity bound beyond expiry, the key
/// space is one entry per hour.
#[derive(Default)]
pub struct PriceCache {
    entries: DashMap<String, CacheEntry>,
}

impl PriceCache {
    pub fn new() -> Self {
        PriceCache {
            entries: DashMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        let now = Instant::now();
        let entry = *self.entries.get(key)?;

        if entry.is_expired(now) {
            // Only drop it if nobody refreshed the key in between
            self.entries.remove_if(key, |_, e| e.is_expired(now));
            return None;
        }

        Some(entry.value)
    }

    pub fn put(&self, key: &str, value: f64, ttl: Duration) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries.insert(key.to_string(), entry);
    }

    /// Drops every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, e| !e.is_expired(now));
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
