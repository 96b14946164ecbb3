//! Farcaster profile lookups through the Neynar API.
//!
//! [`ProfileFetcher::fetch`] is cached under `cache:neynar:user:{fid}` for
//! [`CacheTtl::Medium`]; [`ProfileFetcher::fetch_fresh`] always goes to the API.

use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tracing::{debug, error};

use crate::{
    cache::{
        keys::{namespaces, CacheKey},
        read_through::ReadThroughCache,
        ttl::CacheTtl,
    },
    config::ProfileConfig,
    upstream::{HttpClient, UpstreamError},
};

const USER_BULK_PATH: &str = "/v2/farcaster/user/bulk";
const API_KEY_HEADER: &str = "x-api-key";

/// A Farcaster user as served by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub fid: u64,
    pub handle: String,
    pub display_name: String,
    pub avatar_url: String,
    pub custody_address: String,
    pub verified_addresses: Vec<String>,
}

/// Wire shape of a user in the Neynar bulk response.
#[derive(Debug, Deserialize)]
struct NeynarUser {
    fid: u64,
    #[serde(default)]
    username: String,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    pfp_url: String,
    #[serde(default)]
    custody_address: String,
    #[serde(default)]
    verifications: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct BulkUsersResponse {
    #[serde(default)]
    users: Vec<NeynarUser>,
}

impl From<NeynarUser> for ProfileRecord {
    fn from(user: NeynarUser) -> Self {
        Self {
            fid: user.fid,
            handle: user.username,
            display_name: user.display_name,
            avatar_url: user.pfp_url,
            custody_address: user.custody_address,
            verified_addresses: user.verifications,
        }
    }
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("profile API key is not configured")]
    MissingApiKey,

    #[error("profile API returned HTTP {status}")]
    Http { status: u16, body: String },

    #[error("no profile found for fid {0}")]
    NotFound(u64),

    #[error("profile API request failed: {0}")]
    Upstream(UpstreamError),

    #[error("profile API response could not be decoded: {0}")]
    Decode(String),
}

impl From<UpstreamError> for ProfileError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::HttpError(status, body) => Self::Http { status, body },
            other => Self::Upstream(other),
        }
    }
}

/// Key under which a profile is cached.
#[must_use]
pub fn profile_cache_key(fid: u64) -> CacheKey {
    CacheKey::builder(namespaces::PROFILE_USER).part(fid).build()
}

#[derive(Debug, Clone)]
pub struct ProfileFetcher {
    http: Arc<HttpClient>,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
    cache: ReadThroughCache,
}

impl ProfileFetcher {
    #[must_use]
    pub fn new(http: Arc<HttpClient>, config: &ProfileConfig, cache: ReadThroughCache) -> Self {
        Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key().map(str::to_string),
            timeout: Duration::from_secs(config.timeout_seconds),
            cache,
        }
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Returns the profile for `fid`, from the cache when present.
    ///
    /// # Errors
    ///
    /// See [`ProfileFetcher::fetch_fresh`]. Failed lookups are not cached.
    pub async fn fetch(&self, fid: u64) -> Result<ProfileRecord, ProfileError> {
        if !self.is_configured() {
            return Err(ProfileError::MissingApiKey);
        }

        let key = profile_cache_key(fid);
        self.cache
            .get_or_compute(&key, CacheTtl::Medium.as_secs(), || self.fetch_fresh(fid))
            .await
    }

    /// Looks `fid` up on the API without touching the cache.
    ///
    /// # Errors
    ///
    /// - [`ProfileError::MissingApiKey`] when no key is configured
    /// - [`ProfileError::Http`] for a non-success status
    /// - [`ProfileError::NotFound`] when the API knows no such user
    /// - [`ProfileError::Upstream`] or [`ProfileError::Decode`] otherwise
    pub async fn fetch_fresh(&self, fid: u64) -> Result<ProfileRecord, ProfileError> {
        let api_key = self.api_key.as_deref().ok_or(ProfileError::MissingApiKey)?;
        let url = format!("{}{USER_BULK_PATH}?fids={fid}", self.base_url);
        debug!(fid, "fetching profile");

        let body = match self.http.get(&url, &[(API_KEY_HEADER, api_key)], self.timeout).await {
            Ok(body) => body,
            Err(UpstreamError::HttpError(status, body)) => {
                error!(fid, status, body = %body, "failed to fetch Farcaster user");
                return Err(ProfileError::Http { status, body });
            }
            Err(e) => {
                error!(fid, error = %e, "failed to fetch Farcaster user");
                return Err(e.into());
            }
        };

        let response: BulkUsersResponse =
            serde_json::from_slice(&body).map_err(|e| ProfileError::Decode(e.to_string()))?;

        response
            .users
            .into_iter()
            .next()
            .map(ProfileRecord::from)
            .ok_or(ProfileError::NotFound(fid))
    }
}
