//! Named TTL caches and the cache-or-compute helper.
//!
//! Values are stored type-erased and read back by downcasting, so one
//! [`CacheManager`] can hold every kind of lookup result (region
//! capabilities, SKU lists, ...). Entries expire a fixed time after their
//! last access.

use std::{
    any::Any,
    sync::Arc,
    time::{Duration, Instant},
};

use dashmap::DashMap;
use tracing::{debug, warn};

/// Expiry of an entry after its last access.
pub const DEFAULT_TTL: Duration = Duration::from_secs(4 * 60 * 60);

/// Wildcard accepted by [`CacheManager::evict`] for names and keys.
pub const ALL: &str = "*";

struct Entry {
    value: Arc<dyn Any + Send + Sync>,
    last_access: Instant,
}

/// One named cache.
pub struct TtlCache {
    ttl: Duration,
    entries: DashMap<String, Entry>,
}

impl TtlCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
        }
    }

    /// Cached value for `key`, refreshing its access time.
    ///
    /// Returns `None` when absent, expired, or stored with another type.
    pub fn get<T: Clone + 'static>(&self, key: &str) -> Option<T> {
        {
            let mut entry = self.entries.get_mut(key)?;
            if entry.last_access.elapsed() <= self.ttl {
                entry.last_access = Instant::now();
                return entry.value.downcast_ref::<T>().cloned();
            }
        }
        self.entries.remove(key);
        None
    }

    pub fn insert<T: Send + Sync + 'static>(&self, key: impl Into<String>, value: T) {
        self.entries.insert(
            key.into(),
            Entry {
                value: Arc::new(value),
                last_access: Instant::now(),
            },
        );
    }

    pub fn invalidate(&self, key: &str) {
        self.entries.remove(key);
    }

    pub fn invalidate_all(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Registry of named [`TtlCache`]s.
pub struct CacheManager {
    ttl: Duration,
    caches: DashMap<String, Arc<TtlCache>>,
}

impl Default for CacheManager {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl CacheManager {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            caches: DashMap::new(),
        }
    }

    /// The cache called `name`, created on first use.
    pub fn cache(&self, name: &str) -> Arc<TtlCache> {
        self.caches
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(TtlCache::new(self.ttl)))
            .clone()
    }

    /// Return the cached value for `(name, key)` or run `compute` and cache
    /// its result. Errors are returned as-is and never cached.
    pub fn cache_or_compute<T, E, F>(&self, name: &str, key: &str, compute: F) -> Result<T, E>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Result<T, E>,
    {
        let cache = self.cache(name);
        if let Some(hit) = cache.get::<T>(key) {
            debug!(cache = name, key, "Cache hit");
            return Ok(hit);
        }

        debug!(cache = name, key, "Cache miss");
        let value = compute()?;
        cache.insert(key, value.clone());
        Ok(value)
    }

    /// Evict entries.
    ///
    /// - `name == "*"`: every cache
    /// - `key == "*"`: the whole named cache
    /// - otherwise: the one entry
    pub fn evict(&self, name: &str, key: &str) {
        if name.trim().is_empty() {
            warn!("Cache name is not specified when invalidating cache");
        } else if name == ALL {
            debug!("Invalidate all caches");
            self.caches.clear();
        } else if key.trim().is_empty() {
            warn!(cache = name, "Key is not specified when invalidating cache");
        } else if key == ALL {
            debug!(cache = name, "Invalidate all entries");
            self.caches.remove(name);
        } else if let Some(cache) = self.caches.get(name) {
            debug!(cache = name, key, "Invalidate cache entry");
            cache.invalidate(key);
        }
    }
}
