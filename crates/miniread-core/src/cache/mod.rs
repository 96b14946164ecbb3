//! Key/value cache with expiry, and the read-through layer built on it.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    ReadThroughCache                       │
//! │  get_or_compute(key, ttl, producer)                       │
//! │  • hit  → stored value, producer not run                  │
//! │  • miss → producer runs once, value returned, write       │
//! │           spawned in the background                       │
//! └──────────────────────────┬───────────────────────────────┘
//!                            │
//! ┌──────────────────────────▼───────────────────────────────┐
//! │                       CacheStore                          │
//! │  JSON encode/decode, stats, absorbs every backend error   │
//! └──────────────┬───────────────────────────┬───────────────┘
//!                │                           │
//!        ┌───────▼───────┐           ┌───────▼───────┐
//!        │ RedisBackend  │           │ MemoryBackend │
//!        │ GET / SET EX  │           │ DashMap, lazy │
//!        │ DEL / MGET    │           │ expiry        │
//!        └───────────────┘           └───────────────┘
//! ```
//!
//! # Error Handling Conventions
//!
//! - **[`CacheLookup`]**: a miss, an unreachable backend and an undecodable entry all
//!   read as [`CacheLookup::Miss`]. Nothing in this module fails a caller's request.
//! - **`Result<T, StoreError>`**: only at the [`CacheBackend`] seam, where
//!   [`CacheStore`] logs and counts it.
//!
//! # Keys
//!
//! [`CacheKey`] is `cache:{namespace}:{part}:...`. Parts are not escaped, so a part that
//! contains `:` can collide with a longer key. Argument lists are reduced to a short
//! fixed-length token by [`keys::hash_args`].

pub mod keys;
pub mod memory;
pub mod read_through;
pub mod redis;
pub mod store;
pub mod ttl;

pub use keys::{hash_args, CacheKey};
pub use memory::MemoryBackend;
pub use read_through::ReadThroughCache;
pub use redis::RedisBackend;
pub use store::{CacheBackend, CacheLookup, CacheStats, CacheStatsSnapshot, CacheStore, StoreError};
pub use ttl::{CacheTtl, MAX_TTL_SECONDS};
