use async_trait::async_trait;
use moka::{future::Cache, Expiry};
use std::time::{Duration, Instant};

use crate::cache::{
    store::{CacheBackend, StoreError},
    ttl::MAX_TTL_SECONDS,
};

const DEFAULT_MAX_ENTRIES: u64 = 100_000;

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: String,
    ttl_seconds: u64,
}

impl MemoryEntry {
    fn lifetime(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds.min(MAX_TTL_SECONDS))
    }
}

/// Each entry lives for the TTL it was last written with.
struct WrittenTtl;

impl Expiry<String, MemoryEntry> for WrittenTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &MemoryEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(entry.lifetime())
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &MemoryEntry,
        _updated_at: Instant,
        _remaining: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.lifetime())
    }
}

/// In-process backend with per-entry expiry and a bounded entry count.
///
/// Expired entries are evicted by moka's housekeeping whether or not they are read
/// again; beyond `max_entries` the least recently used entries go first. The TTL each
/// entry was written with is kept so it can be inspected.
#[derive(Clone)]
pub struct MemoryBackend {
    entries: Cache<String, MemoryEntry>,
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBackend")
            .field("entry_count", &self.entries.entry_count())
            .finish_non_exhaustive()
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::with_max_entries(DEFAULT_MAX_ENTRIES)
    }
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_max_entries(max_entries: u64) -> Self {
        Self {
            entries: Cache::builder().max_capacity(max_entries).expire_after(WrittenTtl).build(),
        }
    }

    /// TTL the live entry under `key` was written with, clamped to [`MAX_TTL_SECONDS`].
    #[must_use]
    pub fn ttl_of(&self, key: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_str() == key)
            .map(|(_, entry)| entry.ttl_seconds.min(MAX_TTL_SECONDS))
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.iter().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|(k, _)| k.to_string()).collect()
    }

    async fn read(&self, key: &str) -> Option<String> {
        self.entries.get(key).await.map(|entry| entry.value)
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read(key).await)
    }

    async fn set_ex(&self, key: &str, value: String, ttl_seconds: u64) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), MemoryEntry { value, ttl_seconds }).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries.invalidate(key).await;
        Ok(())
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>, StoreError> {
        let mut values = Vec::with_capacity(keys.len());
        for key in keys {
            values.push(self.read(key).await);
        }
        Ok(values)
    }
}
