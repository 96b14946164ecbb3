//! Best-effort key/value store in front of a pluggable backend.
//!
//! [`CacheStore`] never surfaces a backend failure to its callers: a read that cannot be
//! served is a [`CacheLookup::Miss`], a write or delete that cannot be performed is
//! dropped. Every absorbed failure is logged at `warn` and counted in [`CacheStats`].

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    cache::{keys::CacheKey, memory::MemoryBackend, redis::RedisBackend, ttl::MAX_TTL_SECONDS},
    config::{CacheBackendKind, CacheConfig},
};

/// Failures raised by a [`CacheBackend`]. They stop at [`CacheStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),

    #[error("cache backend command failed: {0}")]
    Command(String),

    #[error("cache backend timed out after {0:?}")]
    Timeout(Duration),

    #[error("cache payload could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Raw storage protocol: get, set with expiry, delete, multi-get over JSON strings.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Short identifier used in logs and health output.
    fn name(&self) -> &'static str;

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    async fn set_ex(&self, key: &str, value: String, ttl_seconds: u64) -> Result<(), StoreError>;

    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Returns one slot per requested key, in request order.
    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>, StoreError>;
}

/// Outcome of a cache read. Presence is decided by the backend, never by the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup<T> {
    Hit(T),
    Miss,
}

/// Lock-free counters shared by the store and the read-through layer.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
    compute_failures: AtomicU64,
    store_errors: AtomicU64,
}

/// Point-in-time copy of [`CacheStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct CacheStatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub compute_failures: u64,
    pub store_errors: u64,
}

impl CacheStats {
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_compute_failure(&self) {
        self.compute_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_store_error(&self) {
        self.store_errors.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            compute_failures: self.compute_failures.load(Ordering::Relaxed),
            store_errors: self.store_errors.load(Ordering::Relaxed),
        }
    }
}

/// Cheaply cloneable handle over an optional backend.
///
/// A store without a backend (see [`CacheStore::disabled`]) answers every read with a
/// miss and ignores every write.
#[derive(Clone)]
pub struct CacheStore {
    backend: Option<Arc<dyn CacheBackend>>,
    stats: Arc<CacheStats>,
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("backend", &self.backend_name())
            .field("stats", &self.stats.snapshot())
            .finish()
    }
}

impl CacheStore {
    #[must_use]
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend: Some(backend), stats: Arc::new(CacheStats::default()) }
    }

    #[must_use]
    pub fn disabled() -> Self {
        Self { backend: None, stats: Arc::new(CacheStats::default()) }
    }

    /// Builds the store described by `config`.
    ///
    /// Falls back to a disabled store, with a warning, when Redis is selected but no URL
    /// is configured or the server cannot be reached within `connect_timeout_ms`.
    pub async fn connect(config: &CacheConfig) -> Self {
        match config.backend {
            CacheBackendKind::Disabled => {
                info!("cache disabled by configuration");
                Self::disabled()
            }
            CacheBackendKind::Memory => {
                info!("using in-process memory cache backend");
                Self::new(Arc::new(MemoryBackend::with_max_entries(config.memory_max_entries)))
            }
            CacheBackendKind::Redis => {
                let Some(url) = config.redis_url.as_deref().filter(|u| !u.trim().is_empty())
                else {
                    warn!("cache backend is redis but no redis_url is configured, caching disabled");
                    return Self::disabled();
                };

                match RedisBackend::connect(
                    url,
                    Duration::from_millis(config.connect_timeout_ms),
                    Duration::from_millis(config.command_timeout_ms),
                )
                .await
                {
                    Ok(backend) => {
                        info!("connected to redis cache backend");
                        Self::new(Arc::new(backend))
                    }
                    Err(e) => {
                        warn!(error = %e, "redis unreachable, caching disabled");
                        Self::disabled()
                    }
                }
            }
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        self.backend.as_ref().map_or("disabled", |b| b.name())
    }

    #[must_use]
    pub fn stats(&self) -> Arc<CacheStats> {
        Arc::clone(&self.stats)
    }

    /// Reads and decodes one entry.
    pub async fn get<T: DeserializeOwned>(&self, key: &CacheKey) -> CacheLookup<T> {
        let Some(backend) = &self.backend else {
            return CacheLookup::Miss;
        };

        match backend.get(key.as_str()).await {
            Ok(Some(raw)) => self.decode(key.as_str(), &raw),
            Ok(None) => CacheLookup::Miss,
            Err(e) => {
                self.stats.record_store_error();
                warn!(key = %key, backend = backend.name(), error = %e, "cache read failed");
                CacheLookup::Miss
            }
        }
    }

    /// Reads one entry without decoding it.
    pub async fn get_raw(&self, key: &CacheKey) -> Option<String> {
        let backend = self.backend.as_ref()?;
        match backend.get(key.as_str()).await {
            Ok(raw) => raw,
            Err(e) => {
                self.stats.record_store_error();
                warn!(key = %key, backend = backend.name(), error = %e, "cache read failed");
                None
            }
        }
    }

    /// Serializes and writes one entry with the given expiry.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &CacheKey, value: &T, ttl_seconds: u64) {
        if self.backend.is_none() {
            return;
        }

        match serde_json::to_string(value) {
            Ok(raw) => self.set_raw(key, raw, ttl_seconds).await,
            Err(e) => {
                self.stats.record_store_error();
                warn!(key = %key, error = %e, "cache value could not be serialized");
            }
        }
    }

    /// Writes an already-serialized payload.
    pub async fn set_raw(&self, key: &CacheKey, raw: String, ttl_seconds: u64) {
        let Some(backend) = &self.backend else {
            return;
        };

        let ttl_seconds = ttl_seconds.min(MAX_TTL_SECONDS);
        match backend.set_ex(key.as_str(), raw, ttl_seconds).await {
            Ok(()) => {
                self.stats.record_write();
                debug!(key = %key, ttl_seconds, "cache entry written");
            }
            Err(e) => {
                self.stats.record_store_error();
                warn!(key = %key, backend = backend.name(), error = %e, "cache write failed");
            }
        }
    }

    pub async fn delete(&self, key: &CacheKey) {
        let Some(backend) = &self.backend else {
            return;
        };

        if let Err(e) = backend.delete(key.as_str()).await {
            self.stats.record_store_error();
            warn!(key = %key, backend = backend.name(), error = %e, "cache delete failed");
        }
    }

    /// Reads several entries at once. The result always has one slot per key, in order.
    pub async fn get_many<T: DeserializeOwned>(&self, keys: &[CacheKey]) -> Vec<CacheLookup<T>> {
        let all_miss = || (0..keys.len()).map(|_| CacheLookup::Miss).collect();

        if keys.is_empty() {
            return Vec::new();
        }
        let Some(backend) = &self.backend else {
            return all_miss();
        };

        let raw_keys: Vec<String> = keys.iter().map(|k| k.as_str().to_string()).collect();
        match backend.mget(&raw_keys).await {
            Ok(values) if values.len() == keys.len() => values
                .into_iter()
                .zip(&raw_keys)
                .map(|(value, key)| match value {
                    Some(raw) => self.decode(key, &raw),
                    None => CacheLookup::Miss,
                })
                .collect(),
            Ok(values) => {
                self.stats.record_store_error();
                warn!(
                    requested = keys.len(),
                    returned = values.len(),
                    backend = backend.name(),
                    "cache multi-get returned the wrong number of values"
                );
                all_miss()
            }
            Err(e) => {
                self.stats.record_store_error();
                warn!(count = keys.len(), backend = backend.name(), error = %e, "cache multi-get failed");
                all_miss()
            }
        }
    }

    fn decode<T: DeserializeOwned>(&self, key: &str, raw: &str) -> CacheLookup<T> {
        match serde_json::from_str(raw) {
            Ok(value) => CacheLookup::Hit(value),
            Err(e) => {
                self.stats.record_store_error();
                warn!(key = key, error = %e, "cached payload could not be decoded, treating as miss");
                CacheLookup::Miss
            }
        }
    }
}
