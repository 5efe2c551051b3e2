// crates/gundi-dispatcher-store-redis/src/store.rs
// ============================================================================
// Module: Redis Cache Backend
// Description: CacheBackend backed by a deadpool-managed Redis pool.
// Purpose: Store dispatch records and integration details with per-key TTL.
// Dependencies: deadpool-redis, gundi-dispatcher-core, redis, thiserror
// ============================================================================

//! ## Overview
//! [`RedisCacheBackend`] maps `get` to `GET` and `set_ex` to `SETEX` on a
//! pooled connection. Keys are optionally namespaced with a prefix so several
//! deployments can share one Redis database.
//! Invariants:
//! - TTLs are at least one second; Redis rejects a zero `SETEX`.
//! - Pool or connection failures surface as [`CacheError::Connection`].
//!
//! Security posture: cached values are untrusted and parsed by callers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::Config;
use deadpool_redis::Connection;
use deadpool_redis::Pool;
use deadpool_redis::PoolConfig;
use deadpool_redis::Runtime;
use gundi_dispatcher_core::CacheBackend;
use gundi_dispatcher_core::CacheError;
use redis::AsyncCommands;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default maximum pooled connections.
pub const DEFAULT_MAX_CONNECTIONS: usize = 16;

/// Default wait for a pooled connection.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Redis store construction errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RedisStoreError {
    /// Connection URL is missing or invalid.
    #[error("invalid redis url: {0}")]
    InvalidUrl(String),
    /// Pool could not be created.
    #[error("redis pool creation failed: {0}")]
    Pool(String),
}

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Redis backend settings.
#[derive(Clone, PartialEq, Eq)]
pub struct RedisCacheConfig {
    /// Connection URL, for example `redis://cache:6379/0`.
    pub url: String,
    /// Optional namespace prepended to every key.
    pub key_prefix: Option<String>,
    /// Maximum pooled connections.
    pub max_connections: usize,
    /// Wait for a free pooled connection.
    pub wait_timeout: Duration,
}

impl RedisCacheConfig {
    /// Creates settings with default pool limits.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            key_prefix: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
        }
    }

    /// Sets the key namespace.
    #[must_use]
    pub fn with_key_prefix(mut self, key_prefix: Option<String>) -> Self {
        self.key_prefix = key_prefix.filter(|prefix| !prefix.trim().is_empty());
        self
    }
}

impl fmt::Debug for RedisCacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // URLs may embed a password.
        f.debug_struct("RedisCacheConfig")
            .field("url", &"<redacted>")
            .field("key_prefix", &self.key_prefix)
            .field("max_connections", &self.max_connections)
            .field("wait_timeout", &self.wait_timeout)
            .finish()
    }
}

// ============================================================================
// SECTION: Backend
// ============================================================================

/// Pooled Redis cache backend.
pub struct RedisCacheBackend {
    /// Connection pool.
    pool: Pool,
    /// Key namespace.
    key_prefix: Option<String>,
}

impl fmt::Debug for RedisCacheBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCacheBackend")
            .field("key_prefix", &self.key_prefix)
            .field("pool_size", &self.pool.status().size)
            .finish()
    }
}

impl RedisCacheBackend {
    /// Creates the pool. Connections are opened on first use.
    ///
    /// # Errors
    ///
    /// Returns [`RedisStoreError`] when the URL is unusable or the pool
    /// cannot be built.
    pub fn new(config: &RedisCacheConfig) -> Result<Self, RedisStoreError> {
        let url = config.url.trim();
        if url.is_empty() {
            return Err(RedisStoreError::InvalidUrl("url is empty".to_string()));
        }
        redis::parse_redis_url(url)
            .ok_or_else(|| RedisStoreError::InvalidUrl("url is not a redis url".to_string()))?;
        let mut cfg = Config::from_url(url);
        let mut pool_config = PoolConfig::new(config.max_connections.max(1));
        pool_config.timeouts.wait = Some(config.wait_timeout);
        pool_config.timeouts.create = Some(config.wait_timeout);
        cfg.pool = Some(pool_config);
        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|err| RedisStoreError::Pool(err.to_string()))?;
        Ok(Self {
            pool,
            key_prefix: config.key_prefix.clone(),
        })
    }

    /// Returns the namespaced key.
    #[must_use]
    pub fn namespaced_key(&self, key: &str) -> String {
        match &self.key_prefix {
            Some(prefix) => format!("{prefix}:{key}"),
            None => key.to_string(),
        }
    }

    /// Sends `PING` to verify connectivity.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when Redis cannot be reached.
    pub async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.connection().await?;
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map(|_| ())
            .map_err(|err| CacheError::Connection(err.to_string()))
    }

    /// Checks out a pooled connection.
    async fn connection(&self) -> Result<Connection, CacheError> {
        self.pool.get().await.map_err(|err| CacheError::Connection(err.to_string()))
    }
}

/// Converts a TTL to whole seconds, never below one.
#[must_use]
pub fn ttl_seconds(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}

#[async_trait]
impl CacheBackend for RedisCacheBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let key = self.namespaced_key(key);
        let mut conn = self.connection().await?;
        conn.get::<_, Option<String>>(&key).await.map_err(|err| {
            tracing::debug!(cache_key = key.as_str(), error = %err, "redis GET failed");
            CacheError::Backend(err.to_string())
        })
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let key = self.namespaced_key(key);
        let mut conn = self.connection().await?;
        conn.set_ex::<_, _, ()>(&key, value, ttl_seconds(ttl)).await.map_err(|err| {
            tracing::debug!(cache_key = key.as_str(), error = %err, "redis SETEX failed");
            CacheError::Backend(err.to_string())
        })
    }
}
