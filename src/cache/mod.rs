/// Caching module
///
/// The response cache behind every pipeline operation. One `CacheStore`
/// contract, two interchangeable backends selected at construction:
/// - in-memory TTL store with LRU eviction (default)
/// - Redis via fred (when `REDIS_URL` is configured)
///
/// Caching is an optimization, never a correctness dependency: reads treat
/// any backend or decode failure as a miss, writes silently no-op on
/// failure and the pipeline recomputes.
pub mod redis_store;

#[cfg(test)]
mod tests;

use crate::config::CacheConfig;
use crate::error::InsightResult;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub use redis_store::RedisCacheStore;

/// TTL key-value store contract shared by all cache backends
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch a stored value. Absent on miss, on expiry, and on any backend
    /// failure.
    async fn get(&self, key: &str) -> Option<Value>;

    /// Store a value with an optional TTL (`None` never expires). Returns
    /// false on failure; callers must not depend on the write landing.
    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> bool;

    /// Remove a key (admin/testing).
    async fn clear(&self, key: &str);
}

/// Typed cache front: the JSON serialization boundary over a backend.
///
/// Values cross into the store as self-describing JSON and are validated on
/// the way out; a payload that fails to decode counts as a miss.
#[derive(Clone)]
pub struct Cache {
    store: Arc<dyn CacheStore>,
    default_ttl: Duration,
}

impl Cache {
    pub fn new(store: Arc<dyn CacheStore>, default_ttl: Duration) -> Self {
        Self { store, default_ttl }
    }

    /// Build a cache with the backend the configuration selects
    pub async fn from_config(config: &CacheConfig) -> InsightResult<Self> {
        let default_ttl = Duration::from_secs(config.default_ttl_secs);
        let store: Arc<dyn CacheStore> = match &config.redis_url {
            Some(_) => {
                info!("Using Redis cache backend");
                Arc::new(RedisCacheStore::new(config).await?)
            }
            None => {
                info!(
                    "Using in-memory cache backend (capacity: {})",
                    config.memory_capacity
                );
                Arc::new(MemoryCacheStore::new(config.memory_capacity))
            }
        };
        Ok(Self::new(store, default_ttl))
    }

    /// Typed read; decode failure is logged and treated as a miss
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.store.get(key).await?;
        match serde_json::from_value(value) {
            Ok(decoded) => {
                debug!("Cache hit for key: {}", key);
                Some(decoded)
            }
            Err(e) => {
                warn!("Discarding malformed cache payload for {}: {}", key, e);
                None
            }
        }
    }

    /// Typed write with the default TTL; encode failure is logged and the
    /// write no-ops
    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T) {
        self.set_json_with_ttl(key, value, Some(self.default_ttl)).await;
    }

    /// Typed write with an explicit TTL (`None` never expires)
    pub async fn set_json_with_ttl<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) {
        match serde_json::to_value(value) {
            Ok(encoded) => {
                if !self.store.set(key, encoded, ttl).await {
                    warn!("Cache write failed for {}, continuing uncached", key);
                }
            }
            Err(e) => {
                warn!("Cache serialization failed for {}: {}", key, e);
            }
        }
    }

    pub async fn clear(&self, key: &str) {
        self.store.clear(key).await;
    }
}

/// One stored value with its expiry and recency bookkeeping
struct MemoryEntry {
    value: Value,
    expires_at: Option<Instant>,
    last_accessed: Instant,
}

impl MemoryEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// In-process TTL store with LRU eviction on overflow.
///
/// Expiry is lazy-checked on read; an expired entry is logically absent the
/// moment its deadline passes and is physically removed on the next access.
/// LRU suits the access pattern here: the same video or channel is queried
/// repeatedly within a session.
pub struct MemoryCacheStore {
    entries: Mutex<HashMap<String, MemoryEntry>>,
    capacity: usize,
}

impl MemoryCacheStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Evict least-recently-used entries until the map fits the capacity.
    /// Expired entries go first.
    fn evict_overflow(entries: &mut HashMap<String, MemoryEntry>, capacity: usize) {
        let now = Instant::now();
        entries.retain(|_, entry| !entry.is_expired(now));

        while entries.len() > capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_accessed)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => {
                    debug!("Evicting LRU cache entry: {}", key);
                    entries.remove(&key);
                }
                None => break,
            }
        }
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Option<Value> {
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(_) => return None,
        };

        let now = Instant::now();
        let expired = match entries.get(key) {
            Some(entry) => entry.is_expired(now),
            None => return None,
        };
        if expired {
            entries.remove(key);
            return None;
        }

        let entry = entries.get_mut(key)?;
        entry.last_accessed = now;
        Some(entry.value.clone())
    }

    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> bool {
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(_) => return false,
        };

        let now = Instant::now();
        entries.insert(
            key.to_string(),
            MemoryEntry {
                value,
                expires_at: ttl.map(|d| now + d),
                last_accessed: now,
            },
        );

        if entries.len() > self.capacity {
            Self::evict_overflow(&mut entries, self.capacity);
        }
        true
    }

    async fn clear(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }
}
