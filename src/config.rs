use crate::error::{InsightError, InsightResult};
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Cache configuration
    pub cache: CacheConfig,
    /// Rate limiter configuration
    pub limiter: LimiterConfig,
    /// Upstream comment source configuration
    pub source: SourceConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Per-request timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Plain per-identity request limit (requests per minute)
    pub rate_limit_per_minute: u32,
}

/// Cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Redis connection URL; when absent the in-memory backend is used
    pub redis_url: Option<String>,
    /// Connection pool size for the Redis backend
    pub max_connections: u32,
    /// Connection timeout in seconds
    pub connection_timeout_secs: u64,
    /// TTL applied to cached results in seconds
    pub default_ttl_secs: u64,
    /// Maximum entries held by the in-memory backend before LRU eviction
    pub memory_capacity: usize,
}

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct LimiterConfig {
    /// Fixed window length in seconds
    pub window_secs: u64,
    /// Cooldown applied when the unique-key counter reaches its limit
    pub block_secs: u64,
    /// Fail open (allow) instead of closed (deny) on limiter backend failure
    pub fail_open: bool,
}

/// Upstream comment source configuration
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// YouTube Data API key
    pub api_key: String,
    /// Classifier batch size, clamped to 1..=128 at use sites
    pub classify_batch_size: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> InsightResult<Self> {
        // Load .env file if it exists
        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!("Could not load .env file: {}", e);
        }

        let config = Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("SERVER_PORT")
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse()
                    .map_err(|e| InsightError::ConfigError(format!("Invalid SERVER_PORT: {}", e)))?,
                request_timeout_ms: env::var("REQUEST_TIMEOUT_MS")
                    .unwrap_or_else(|_| "30000".to_string())
                    .parse()
                    .map_err(|e| {
                        InsightError::ConfigError(format!("Invalid REQUEST_TIMEOUT_MS: {}", e))
                    })?,
                rate_limit_per_minute: env::var("RATE_LIMIT_PER_MINUTE")
                    .unwrap_or_else(|_| "100".to_string())
                    .parse()
                    .map_err(|e| {
                        InsightError::ConfigError(format!("Invalid RATE_LIMIT_PER_MINUTE: {}", e))
                    })?,
            },
            cache: CacheConfig {
                redis_url: env::var("REDIS_URL").ok(),
                max_connections: env::var("REDIS_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .map_err(|e| {
                        InsightError::ConfigError(format!("Invalid REDIS_MAX_CONNECTIONS: {}", e))
                    })?,
                connection_timeout_secs: env::var("REDIS_CONNECTION_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()
                    .map_err(|e| {
                        InsightError::ConfigError(format!(
                            "Invalid REDIS_CONNECTION_TIMEOUT_SECS: {}",
                            e
                        ))
                    })?,
                default_ttl_secs: env::var("CACHE_TTL_SECS")
                    .unwrap_or_else(|_| "3600".to_string()) // 1 hour
                    .parse()
                    .map_err(|e| {
                        InsightError::ConfigError(format!("Invalid CACHE_TTL_SECS: {}", e))
                    })?,
                memory_capacity: env::var("CACHE_MEMORY_CAPACITY")
                    .unwrap_or_else(|_| "1024".to_string())
                    .parse()
                    .map_err(|e| {
                        InsightError::ConfigError(format!("Invalid CACHE_MEMORY_CAPACITY: {}", e))
                    })?,
            },
            limiter: LimiterConfig {
                window_secs: env::var("RATE_WINDOW_SECS")
                    .unwrap_or_else(|_| "3600".to_string()) // 1 hour window
                    .parse()
                    .map_err(|e| {
                        InsightError::ConfigError(format!("Invalid RATE_WINDOW_SECS: {}", e))
                    })?,
                block_secs: env::var("RATE_BLOCK_SECS")
                    .unwrap_or_else(|_| "300".to_string()) // 5 minute cooldown
                    .parse()
                    .map_err(|e| {
                        InsightError::ConfigError(format!("Invalid RATE_BLOCK_SECS: {}", e))
                    })?,
                fail_open: env::var("RATE_FAIL_OPEN")
                    .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
                    .unwrap_or(false),
            },
            source: SourceConfig {
                api_key: env::var("YOUTUBE_API_KEY")
                    .map_err(|_| InsightError::ConfigError("YOUTUBE_API_KEY is required".to_string()))?,
                classify_batch_size: env::var("CLASSIFY_BATCH_SIZE")
                    .unwrap_or_else(|_| "64".to_string())
                    .parse()
                    .map_err(|e| {
                        InsightError::ConfigError(format!("Invalid CLASSIFY_BATCH_SIZE: {}", e))
                    })?,
            },
        };

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration
    fn validate(&self) -> InsightResult<()> {
        if self.server.port == 0 {
            return Err(InsightError::ConfigError(
                "Server port cannot be 0".to_string(),
            ));
        }

        if self.server.request_timeout_ms == 0 {
            return Err(InsightError::ConfigError(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        if let Some(url) = &self.cache.redis_url {
            if !url.starts_with("redis://") && !url.starts_with("rediss://") {
                return Err(InsightError::ConfigError(
                    "REDIS_URL must start with redis:// or rediss://".to_string(),
                ));
            }
        }

        if self.cache.memory_capacity == 0 {
            return Err(InsightError::ConfigError(
                "Cache capacity must be greater than 0".to_string(),
            ));
        }

        if self.limiter.window_secs == 0 {
            return Err(InsightError::ConfigError(
                "Rate window must be greater than 0".to_string(),
            ));
        }

        if self.source.api_key.is_empty() {
            return Err(InsightError::ConfigError(
                "YOUTUBE_API_KEY cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                request_timeout_ms: 30_000,
                rate_limit_per_minute: 100,
            },
            cache: CacheConfig {
                redis_url: None,
                max_connections: 10,
                connection_timeout_secs: 5,
                default_ttl_secs: 3600, // 1 hour
                memory_capacity: 1024,
            },
            limiter: LimiterConfig {
                window_secs: 3600,
                block_secs: 300,
                fail_open: false,
            },
            source: SourceConfig {
                api_key: "".to_string(),
                classify_batch_size: 64,
            },
        }
    }
}
