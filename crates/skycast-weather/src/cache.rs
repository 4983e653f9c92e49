//! Session-lived response cache with per-entry expiry.
//!
//! Entries expire lazily: a read past the deadline evicts the entry and
//! reports a miss. There is no background sweep and no size bound.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::types::{Place, WeatherPayload};

/// Key prefix for geocoding results.
pub const GEOCODE_NAMESPACE: &str = "geocode:";
/// Key prefix for weather payloads.
pub const WEATHER_NAMESPACE: &str = "weather:";

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

#[derive(Debug)]
struct Store<V> {
    entries: HashMap<String, CacheEntry<V>>,
    /// Bumped by every `clear`.
    generation: u64,
}

/// Thread-safe key/value store where every entry carries its own TTL.
///
/// The cache is policy-free: callers pick the TTL per `set` call and build
/// keys however they like. Writers that may outlive a `clear` can use
/// [`TtlCache::generation`] and [`TtlCache::set_if_generation`] so a late
/// write does not resurrect a cleared entry.
#[derive(Debug)]
pub struct TtlCache<V> {
    store: Mutex<Store<V>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new() -> Self {
        Self {
            store: Mutex::new(Store {
                entries: HashMap::new(),
                generation: 0,
            }),
        }
    }

    /// Return the value for `key` if it has not expired.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut store = self.store.lock();
        match store.entries.get(key) {
            Some(entry) if Instant::now() < entry.expires_at => Some(entry.value.clone()),
            Some(_) => {
                store.entries.remove(key);
                tracing::trace!(key, "Evicted expired cache entry");
                None
            }
            None => None,
        }
    }

    /// Store `value` under `key`, replacing any previous entry and restarting its TTL.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.store.lock().entries.insert(key.into(), entry);
    }

    /// Like [`TtlCache::set`], but only if no `clear` happened since
    /// `generation` was read. Returns whether the value was stored.
    pub fn set_if_generation(
        &self,
        key: impl Into<String>,
        value: V,
        ttl: Duration,
        generation: u64,
    ) -> bool {
        let mut store = self.store.lock();
        if store.generation != generation {
            return false;
        }
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        store.entries.insert(key.into(), entry);
        true
    }

    /// Current clear counter.
    pub fn generation(&self) -> u64 {
        self.store.lock().generation
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let mut store = self.store.lock();
        let count = store.entries.len();
        store.entries.clear();
        store.generation += 1;
        tracing::debug!("Cleared {} cache entries", count);
    }

    /// Number of stored entries, including expired ones not yet read.
    pub fn len(&self) -> usize {
        self.store.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Values held in the shared response cache.
#[derive(Debug, Clone)]
pub enum CachedResponse {
    Places(Vec<Place>),
    Weather(WeatherPayload),
}

/// The cache shared by geocoding and weather lookups.
pub type ResponseCache = TtlCache<CachedResponse>;

/// Cache key for a geocoding query. The raw input is used as-is.
pub fn geocode_key(city: &str) -> String {
    format!("{}{}", GEOCODE_NAMESPACE, city)
}

/// Cache key for a weather lookup, rounded to three decimal degrees.
pub fn weather_key(lat: f64, lon: f64) -> String {
    format!("{}{:.3},{:.3}", WEATHER_NAMESPACE, lat, lon)
}
