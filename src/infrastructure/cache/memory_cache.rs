//! In-process cache backed by `moka`.

use super::service::{
    CacheResult, CacheService, counter_key, decode_snapshot, encode_snapshot, link_key,
};
use crate::domain::entities::ShortLink;
use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[derive(Clone)]
struct Entry {
    payload: Arc<str>,
    ttl: Duration,
}

/// Expires each entry after its own TTL, restarting the clock on overwrite.
struct EntryExpiry;

impl Expiry<String, Entry> for EntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Entry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Cache living inside the server process.
///
/// Stores the same serialized snapshots as [`super::RedisCache`] under the same
/// keys, so both backends behave identically on corrupt or stale data. Used
/// when no Redis is configured and in integration tests.
///
/// Counters are evicted together with the least recently used keys once
/// `max_entries` is exceeded; they are best-effort like the Redis counters.
/// The durable count lives in the link store.
#[derive(Clone)]
pub struct MemoryCache {
    entries: Cache<String, Entry>,
    counters: Cache<String, Arc<AtomicU64>>,
    default_ttl: Duration,
}

impl MemoryCache {
    pub fn new(max_entries: u64, default_ttl: Duration) -> Self {
        debug!(max_entries, ttl_secs = default_ttl.as_secs(), "Using in-process cache");

        Self {
            entries: Cache::builder()
                .max_capacity(max_entries)
                .expire_after(EntryExpiry)
                .build(),
            counters: Cache::builder().max_capacity(max_entries).build(),
            default_ttl,
        }
    }

    /// Stores an already serialized snapshot for `slug`.
    ///
    /// The payload is not checked; a bad payload is reported as corrupt on
    /// the next [`CacheService::get_link`].
    pub async fn set_raw(&self, slug: &str, payload: &str, ttl: Duration) {
        self.entries
            .insert(
                link_key(slug),
                Entry {
                    payload: Arc::from(payload),
                    ttl,
                },
            )
            .await;
    }
}

#[async_trait]
impl CacheService for MemoryCache {
    async fn get_link(&self, slug: &str) -> CacheResult<Option<ShortLink>> {
        let Some(entry) = self.entries.get(&link_key(slug)).await else {
            debug!("Cache MISS: {}", slug);
            return Ok(None);
        };

        let link = decode_snapshot(slug, &entry.payload).inspect_err(|e| {
            warn!(slug = %slug, error = %e, "Discarding corrupt cache entry");
        })?;

        debug!("Cache HIT: {} -> {}", slug, link.target);
        Ok(Some(link))
    }

    async fn set_link(
        &self,
        slug: &str,
        link: &ShortLink,
        ttl: Option<Duration>,
    ) -> CacheResult<()> {
        let payload = encode_snapshot(link)?;
        self.set_raw(slug, &payload, ttl.unwrap_or(self.default_ttl))
            .await;
        Ok(())
    }

    async fn increment_counter(&self, slug: &str) -> Option<u64> {
        let counter = self
            .counters
            .get_with(counter_key(slug), async { Arc::new(AtomicU64::new(0)) })
            .await;

        Some(counter.fetch_add(1, Ordering::Relaxed) + 1)
    }

    async fn get_counter(&self, slug: &str) -> CacheResult<Option<u64>> {
        Ok(self
            .counters
            .get(&counter_key(slug))
            .await
            .map(|counter| counter.load(Ordering::Relaxed)))
    }

    async fn health_check(&self) -> bool {
        true
    }
}
