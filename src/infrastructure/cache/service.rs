//! Cache service trait, error types and the snapshot format.

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::entities::ShortLink;

/// Default time-to-live for cached link snapshots.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Errors that can occur during cache operations.
///
/// Every variant is a transient infrastructure failure: callers on the
/// redirect path log it and fall back to the durable store.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    Connection(String),

    #[error("Cache operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Cache operation error: {0}")]
    Operation(String),

    #[error("Corrupt cache entry for {slug}: {reason}")]
    Corrupt { slug: String, reason: String },

    #[error("Cache serialization error: {0}")]
    Serialization(String),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Key holding the serialized [`ShortLink`] snapshot for a slug.
pub fn link_key(slug: &str) -> String {
    format!("slug:{slug}")
}

/// Key holding the best-effort click counter for a slug.
pub fn counter_key(slug: &str) -> String {
    format!("stats:slug:{slug}")
}

/// Serializes a link into its cache snapshot.
pub fn encode_snapshot(link: &ShortLink) -> CacheResult<String> {
    serde_json::to_string(link).map_err(|e| CacheError::Serialization(e.to_string()))
}

/// Parses a cache snapshot.
///
/// A snapshot that does not parse, or that belongs to a different slug, is
/// reported as [`CacheError::Corrupt`] and never partially returned.
pub fn decode_snapshot(slug: &str, raw: &str) -> CacheResult<ShortLink> {
    let link: ShortLink = serde_json::from_str(raw).map_err(|e| CacheError::Corrupt {
        slug: slug.to_string(),
        reason: e.to_string(),
    })?;

    if link.slug != slug {
        return Err(CacheError::Corrupt {
            slug: slug.to_string(),
            reason: format!("snapshot belongs to slug '{}'", link.slug),
        });
    }

    Ok(link)
}

/// Read-through cache in front of the durable link store.
///
/// Implementations must be thread-safe and bound every operation in time; a
/// slow cache is a cache failure. Errors from [`CacheService::get_link`] and
/// [`CacheService::set_link`] are returned so the caller can log and fall
/// back, while counter increments swallow their own failures.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis-backed cache with TTL support
/// - [`crate::infrastructure::cache::MemoryCache`] - In-process cache with per-entry TTL
/// - [`crate::infrastructure::cache::NullCache`] - No-op implementation for disabled caching
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Returns the cached snapshot for a slug if present and unexpired.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(link))` on cache hit
    /// - `Ok(None)` on cache miss
    ///
    /// # Errors
    ///
    /// Connection failures, timeouts and corrupt snapshots are errors; the
    /// caller treats them as a miss.
    async fn get_link(&self, slug: &str) -> CacheResult<Option<ShortLink>>;

    /// Stores a snapshot, replacing any existing entry and resetting its TTL.
    ///
    /// `ttl = None` applies the implementation's configured default.
    async fn set_link(&self, slug: &str, link: &ShortLink, ttl: Option<Duration>)
    -> CacheResult<()>;

    /// Increments the click counter for a slug.
    ///
    /// Returns the new value, or `None` if the increment failed or counting is
    /// disabled. Failures are logged and counted
    /// (`click_counter_failures_total`) by the implementation and never
    /// propagated.
    async fn increment_counter(&self, slug: &str) -> Option<u64>;

    /// Reads the click counter for a slug.
    async fn get_counter(&self, slug: &str) -> CacheResult<Option<u64>>;

    /// Checks if the cache backend is healthy.
    async fn health_check(&self) -> bool;
}
