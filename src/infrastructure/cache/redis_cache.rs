//! Redis-backed cache implementation.

use super::service::{
    CacheError, CacheResult, CacheService, counter_key, decode_snapshot, encode_snapshot,
    link_key,
};
use crate::domain::entities::ShortLink;
use async_trait::async_trait;
use metrics::counter;
use redis::{AsyncCommands, Client, RedisResult, aio::ConnectionManager};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Redis cache for link snapshots and click counters.
///
/// Uses connection pooling via `ConnectionManager` for efficient connection reuse.
/// Every command is bounded by `op_timeout`; a command that exceeds it fails
/// with [`CacheError::Timeout`].
///
/// # Keys
///
/// - `slug:{slug}` - JSON snapshot, written with `SET .. EX ttl`
/// - `stats:slug:{slug}` - click counter, advanced with `INCR`
pub struct RedisCache {
    client: ConnectionManager,
    default_ttl: Duration,
    op_timeout: Duration,
}

impl RedisCache {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Arguments
    ///
    /// - `redis_url` - Redis connection string (e.g., `"redis://localhost:6379"`)
    /// - `default_ttl` - TTL applied when [`CacheService::set_link`] is called
    ///   with `ttl = None`; controlled via `CACHE_TTL_SECONDS`
    /// - `op_timeout` - upper bound for each command; controlled via `CACHE_TIMEOUT_MS`
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Connection`] if the URL is invalid, the connection
    /// cannot be established, or the PING health check fails.
    pub async fn connect(
        redis_url: &str,
        default_ttl: Duration,
        op_timeout: Duration,
    ) -> CacheResult<Self> {
        info!("Connecting to Redis at {}", redis_url);

        let client = Client::open(redis_url)
            .map_err(|e| CacheError::Connection(format!("Failed to create Redis client: {}", e)))?;

        let manager = ConnectionManager::new(client)
            .await
            .map_err(|e| CacheError::Connection(format!("Failed to connect to Redis: {}", e)))?;

        let cache = Self {
            client: manager,
            default_ttl,
            op_timeout,
        };

        let mut conn = cache.client.clone();
        cache
            .bounded(async move { conn.ping::<()>().await })
            .await
            .map_err(|e| CacheError::Connection(format!("Redis PING failed: {}", e)))?;

        info!("✓ Connected to Redis");

        Ok(cache)
    }

    /// Runs a Redis command under the operation timeout.
    async fn bounded<T, F>(&self, op: F) -> CacheResult<T>
    where
        F: Future<Output = RedisResult<T>>,
    {
        match tokio::time::timeout(self.op_timeout, op).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(CacheError::Operation(e.to_string())),
            Err(_) => Err(CacheError::Timeout(self.op_timeout)),
        }
    }
}

#[async_trait]
impl CacheService for RedisCache {
    async fn get_link(&self, slug: &str) -> CacheResult<Option<ShortLink>> {
        let key = link_key(slug);
        let mut conn = self.client.clone();

        let raw = self
            .bounded(async move { conn.get::<_, Option<String>>(&key).await })
            .await?;

        match raw {
            Some(raw) => {
                let link = decode_snapshot(slug, &raw).inspect_err(|e| {
                    warn!(slug = %slug, error = %e, "Discarding corrupt cache entry");
                })?;
                debug!("Cache HIT: {} -> {}", slug, link.target);
                Ok(Some(link))
            }
            None => {
                debug!("Cache MISS: {}", slug);
                Ok(None)
            }
        }
    }

    async fn set_link(
        &self,
        slug: &str,
        link: &ShortLink,
        ttl: Option<Duration>,
    ) -> CacheResult<()> {
        let key = link_key(slug);
        let payload = encode_snapshot(link)?;
        let ttl_seconds = ttl.unwrap_or(self.default_ttl).as_secs().max(1);
        let mut conn = self.client.clone();

        self.bounded(async move {
            conn.set_ex::<_, _, ()>(&key, payload, ttl_seconds)
                .await
        })
        .await?;

        debug!("Cache SET: {} -> {} (TTL: {}s)", slug, link.target, ttl_seconds);
        Ok(())
    }

    async fn increment_counter(&self, slug: &str) -> Option<u64> {
        let key = counter_key(slug);
        let mut conn = self.client.clone();

        match self
            .bounded(async move { conn.incr::<_, _, u64>(&key, 1u64).await })
            .await
        {
            Ok(value) => Some(value),
            Err(e) => {
                counter!("click_counter_failures_total").increment(1);
                warn!("Redis INCR error for {}: {}", slug, e);
                None
            }
        }
    }

    async fn get_counter(&self, slug: &str) -> CacheResult<Option<u64>> {
        let key = counter_key(slug);
        let mut conn = self.client.clone();

        self.bounded(async move { conn.get::<_, Option<u64>>(&key).await })
            .await
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        self.bounded(async move { conn.ping::<()>().await })
            .await
            .is_ok()
    }
}
