//! Client-side query cache in front of `POST /contract/read`.
//!
//! Results are memoized per [`QueryKey`] for a configurable stale time, independently of
//! the server cache. Identical queries issued concurrently share one request.

use alloy_primitives::{hex, Address};
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tracing::debug;

use crate::{
    contract::AbiFragment,
    middleware::ValidationIssue,
    upstream::{HttpClient, UpstreamError},
};

pub const CONTRACT_READ_PATH: &str = "/contract/read";

const QUERY_SCOPE: &str = "contract";
const MAX_CACHED_QUERIES: u64 = 10_000;

/// How long a result is served without asking the server again.
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(60);

/// A contract read as issued from the client side.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractReadQuery {
    pub chain_id: u64,
    pub address: Address,
    pub abi: Vec<AbiFragment>,
    pub function_name: String,
    pub args: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
    /// When `false` the query is skipped and no request is made.
    #[serde(skip)]
    pub enabled: bool,
}

impl ContractReadQuery {
    #[must_use]
    pub fn new(
        chain_id: u64,
        address: Address,
        abi: Vec<AbiFragment>,
        function_name: impl Into<String>,
    ) -> Self {
        Self {
            chain_id,
            address,
            abi,
            function_name: function_name.into(),
            args: Vec::new(),
            ttl: None,
            enabled: true,
        }
    }

    #[must_use]
    pub fn with_args(mut self, args: Vec<Value>) -> Self {
        self.args = args;
        self
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl_seconds: u64) -> Self {
        self.ttl = Some(ttl_seconds);
        self
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    #[must_use]
    pub fn key(&self) -> QueryKey {
        QueryKey {
            chain_id: self.chain_id,
            address: hex::encode_prefixed(self.address),
            function_name: self.function_name.clone(),
            args_json: Value::Array(self.args.clone()).to_string(),
        }
    }
}

/// `["contract", chainId, address, functionName, JSON(args)]`.
///
/// The ABI and the requested TTL are not part of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    chain_id: u64,
    address: String,
    function_name: String,
    args_json: String,
}

impl QueryKey {
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!([QUERY_SCOPE, self.chain_id, self.address, self.function_name, self.args_json])
    }
}

#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("request rejected: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    Rejected(Vec<ValidationIssue>),

    #[error("server returned HTTP {status}: {message}")]
    Server { status: u16, message: String },

    #[error(transparent)]
    Transport(UpstreamError),

    #[error("unexpected response: {0}")]
    InvalidResponse(String),
}

impl From<UpstreamError> for ClientError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::HttpError(400, body) => serde_json::from_str::<RejectedBody>(&body)
                .map_or_else(
                    |_| Self::Server { status: 400, message: body.clone() },
                    |rejected| Self::Rejected(rejected.details),
                ),
            UpstreamError::HttpError(status, body) => {
                let message = serde_json::from_str::<ErrorBody>(&body)
                    .map_or(body, |parsed| parsed.error);
                Self::Server { status, message }
            }
            other => Self::Transport(other),
        }
    }
}

#[derive(Deserialize)]
struct RejectedBody {
    #[serde(default)]
    details: Vec<ValidationIssue>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Deserialize)]
struct ReadResponse {
    result: Value,
}

/// Talks to a running server and memoizes its answers.
#[derive(Clone)]
pub struct ContractReadClient {
    http: Arc<HttpClient>,
    endpoint: String,
    timeout: Duration,
    queries: Cache<QueryKey, Value>,
}

impl std::fmt::Debug for ContractReadClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractReadClient")
            .field("endpoint", &self.endpoint)
            .field("cached_queries", &self.queries.entry_count())
            .finish_non_exhaustive()
    }
}

impl ContractReadClient {
    #[must_use]
    pub fn new(http: Arc<HttpClient>, base_url: &str, stale_time: Duration, timeout: Duration) -> Self {
        Self {
            http,
            endpoint: format!("{}{CONTRACT_READ_PATH}", base_url.trim_end_matches('/')),
            timeout,
            queries: Cache::builder()
                .max_capacity(MAX_CACHED_QUERIES)
                .time_to_live(stale_time)
                .build(),
        }
    }

    /// Runs `query`, answering from the query cache while the entry is fresh.
    ///
    /// Returns `Ok(None)` without any I/O when the query is disabled. Failures are not
    /// memoized.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Rejected`] with the server's issues on a `400`
    /// - [`ClientError::Server`] for any other non-success status
    /// - [`ClientError::Transport`] when the server cannot be reached
    pub async fn read(&self, query: &ContractReadQuery) -> Result<Option<Value>, ClientError> {
        if !query.enabled {
            return Ok(None);
        }

        let key = query.key();
        self.queries
            .try_get_with(key, self.fetch(query))
            .await
            .map(Some)
            .map_err(|e: Arc<ClientError>| (*e).clone())
    }

    /// Drops the memoized result for `query`; the next read goes to the server.
    pub async fn invalidate(&self, query: &ContractReadQuery) {
        self.queries.invalidate(&query.key()).await;
    }

    async fn fetch(&self, query: &ContractReadQuery) -> Result<Value, ClientError> {
        debug!(key = %query.key().to_json(), "contract read query");
        let body = serde_json::to_vec(query)
            .map_err(|e| ClientError::InvalidResponse(format!("request encoding failed: {e}")))?;

        let response = self.http.send_request(&self.endpoint, body.into(), self.timeout).await?;
        let parsed: ReadResponse = serde_json::from_slice(&response)
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
        Ok(parsed.result)
    }
}
