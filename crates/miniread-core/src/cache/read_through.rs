//! Cache-aside reads with a detached refill.
//!
//! On a hit the stored value is returned and the producer is never run. On a miss the
//! producer runs once; its error reaches the caller untouched and nothing is written.
//! A successful value is handed back immediately while a spawned task writes it.
//! Concurrent misses for the same key each run their own producer.

use serde::{de::DeserializeOwned, Serialize};
use std::{future::Future, sync::Arc};
use tracing::{debug, warn};

use crate::cache::{
    keys::CacheKey,
    store::{CacheLookup, CacheStats, CacheStore},
};

#[derive(Debug, Clone)]
pub struct ReadThroughCache {
    store: CacheStore,
    stats: Arc<CacheStats>,
}

impl ReadThroughCache {
    #[must_use]
    pub fn new(store: CacheStore) -> Self {
        let stats = store.stats();
        Self { store, stats }
    }

    #[must_use]
    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Returns the cached value under `key`, or computes, returns and stores a fresh one.
    ///
    /// # Errors
    ///
    /// Returns whatever `compute` returns on a miss. Cache failures never surface here.
    pub async fn get_or_compute<T, E, F, Fut>(
        &self,
        key: &CacheKey,
        ttl_seconds: u64,
        compute: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let CacheLookup::Hit(value) = self.store.get::<T>(key).await {
            self.stats.record_hit();
            debug!(key = %key, "cache hit");
            return Ok(value);
        }

        self.stats.record_miss();
        debug!(key = %key, "cache miss");

        let value = match compute().await {
            Ok(value) => value,
            Err(e) => {
                self.stats.record_compute_failure();
                return Err(e);
            }
        };

        self.spawn_write(key, &value, ttl_seconds);
        Ok(value)
    }

    fn spawn_write<T: Serialize>(&self, key: &CacheKey, value: &T, ttl_seconds: u64) {
        if !self.store.is_enabled() {
            return;
        }

        // Serialize before spawning so the task owns plain data and `T` need not be 'static.
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                self.stats.record_store_error();
                warn!(key = %key, error = %e, "fresh value could not be serialized, not caching");
                return;
            }
        };

        let store = self.store.clone();
        let key = key.clone();
        tokio::spawn(async move {
            store.set_raw(&key, raw, ttl_seconds).await;
        });
    }
}
