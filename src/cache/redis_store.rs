use crate::cache::CacheStore;
use crate::config::CacheConfig;
use crate::error::{InsightError, InsightResult};
use async_trait::async_trait;
use fred::{
    clients::RedisPool,
    interfaces::{ClientLike, KeysInterface},
    types::{Builder, Expiration, RedisConfig as FredRedisConfig},
};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Redis-backed cache store with connection pooling.
///
/// Backend failures never propagate: a failed read is a miss and a failed
/// write no-ops, so an unreachable Redis degrades the service to a full
/// recompute per request rather than an outage.
pub struct RedisCacheStore {
    pool: RedisPool,
}

impl RedisCacheStore {
    /// Connect a new pool against the configured Redis URL
    pub async fn new(config: &CacheConfig) -> InsightResult<Self> {
        let url = config
            .redis_url
            .as_deref()
            .ok_or_else(|| InsightError::ConfigError("REDIS_URL is not set".to_string()))?;

        info!("Initializing Redis cache backend: {}", url);

        let redis_config = FredRedisConfig::from_url(url)
            .map_err(|e| InsightError::ConfigError(format!("Invalid Redis URL: {}", e)))?;

        let timeout_secs = config.connection_timeout_secs;
        let pool = Builder::from_config(redis_config)
            .with_connection_config(|conn_config| {
                conn_config.connection_timeout = Duration::from_secs(timeout_secs);
            })
            .with_performance_config(|perf_config| {
                perf_config.auto_pipeline = true;
                perf_config.default_command_timeout = Duration::from_secs(timeout_secs);
            })
            .build_pool(config.max_connections as usize)
            .map_err(|e| InsightError::CacheBackend(format!("Failed to create Redis pool: {}", e)))?;

        let _connection_task = pool.connect();
        pool.wait_for_connect()
            .await
            .map_err(|e| InsightError::CacheBackend(format!("Redis connection timeout: {}", e)))?;

        info!("Redis cache backend connected");

        Ok(Self { pool })
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> Option<Value> {
        let result: Result<Option<String>, _> = self.pool.get(key).await;
        match result {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => {
                    debug!("Redis cache hit for key: {}", key);
                    Some(value)
                }
                Err(e) => {
                    warn!("Malformed Redis payload for {}: {}", key, e);
                    None
                }
            },
            Ok(None) => {
                debug!("Redis cache miss for key: {}", key);
                None
            }
            Err(e) => {
                warn!("Redis get failed for {}: {}", key, e);
                None
            }
        }
    }

    async fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> bool {
        let serialized = value.to_string();
        let expiration = ttl.map(|d| Expiration::EX(d.as_secs().max(1) as i64));

        let result: Result<(), _> = self
            .pool
            .set(key, serialized, expiration, None, false)
            .await;

        match result {
            Ok(()) => true,
            Err(e) => {
                warn!("Redis set failed for {}: {}", key, e);
                false
            }
        }
    }

    async fn clear(&self, key: &str) {
        let result: Result<i64, _> = self.pool.del(key).await;
        if let Err(e) = result {
            warn!("Redis del failed for {}: {}", key, e);
        }
    }
}
