use serde::{Deserialize, Serialize};

/// Longest expiry any entry is written with: 30 days.
///
/// Requested TTLs above this are rejected at the HTTP boundary and clamped by
/// [`CacheStore`](crate::cache::CacheStore), so every backend can represent the deadline.
pub const MAX_TTL_SECONDS: u64 = 30 * 24 * 60 * 60;

/// Named expiry durations used when writing cache entries.
///
/// Callers that do not choose one use [`CacheTtl::default`] (`Medium`). Contract reads
/// default to `Long`; token metadata, which practically never changes, uses `VeryLong`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheTtl {
    /// 1 minute.
    Short,
    /// 5 minutes.
    #[default]
    Medium,
    /// 15 minutes.
    Long,
    /// 1 hour.
    VeryLong,
}

impl CacheTtl {
    #[must_use]
    pub const fn as_secs(self) -> u64 {
        match self {
            Self::Short => 60,
            Self::Medium => 300,
            Self::Long => 900,
            Self::VeryLong => 3600,
        }
    }
}

impl From<CacheTtl> for u64 {
    fn from(ttl: CacheTtl) -> Self {
        ttl.as_secs()
    }
}
