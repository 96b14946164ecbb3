//! # Miniread Core
//!
//! Read-through caching for EVM contract reads and Farcaster profile lookups.
//!
//! - **[`cache`]**: cache keys, TTL presets, the Redis and in-memory backends, and the
//!   read-through layer that never lets a cache failure fail a request.
//!
//! - **[`chain`]**: the supported chains and the lazily built, memoized per-chain
//!   connection registry.
//!
//! - **[`contract`]**: ABI-driven `eth_call` reads with cached, typed results.
//!
//! - **[`profile`]**: Neynar user lookups, cached or fresh.
//!
//! - **[`middleware`]**: request validation ahead of any cache or upstream work.
//!
//! - **[`client`]**: client-side query cache in front of the HTTP read endpoint.
//!
//! - **[`upstream`]**: the shared HTTP client and the JSON-RPC transport.
//!
//! ## Request Flow
//!
//! ```text
//! Client Request
//!       │
//!       ▼
//! ┌─────────────┐
//! │  Validation │ ─── Invalid ──► 400 with every issue
//! └──────┬──────┘
//!        │ Valid
//!        ▼
//! ┌────────────────┐
//! │ ContractReader │ ─── Unsupported chain / unknown function ──► Error
//! └──────┬─────────┘
//!        ▼
//! ┌─────────────┐
//! │ Cache Check │ ─── Hit ──► Cached Response
//! └──────┬──────┘
//!        │ Miss (or cache unavailable)
//!        ▼
//! ┌─────────────────┐
//! │  eth_call via   │ ─── Error ──► Logged, propagated, not cached
//! │ ConnectionRegistry
//! └────────┬────────┘
//!          ▼
//! ┌─────────────────┐
//! │ Background write│
//! └────────┬────────┘
//!          ▼
//!   Response to Client
//! ```

pub mod cache;
pub mod chain;
pub mod client;
pub mod config;
pub mod contract;
pub mod middleware;
pub mod profile;
pub mod types;
pub mod upstream;
