use alloy_primitives::{hex, Address, Bytes};
use async_trait::async_trait;
use serde_json::json;
use tracing::trace;
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use crate::{
    chain::{ChainError, ConnectionFactory, ContractTransport, SupportedChain},
    config::ChainsConfig,
    types::{JsonRpcRequest, JsonRpcResponse},
    upstream::{http_client::HttpClient, UpstreamError},
};

/// JSON-RPC connection to one chain's node.
pub struct RpcConnection {
    chain: SupportedChain,
    url: String,
    http: Arc<HttpClient>,
    timeout: Duration,
    next_id: AtomicU64,
}

impl std::fmt::Debug for RpcConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcConnection")
            .field("chain", &self.chain)
            .field("url", &self.url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl RpcConnection {
    #[must_use]
    pub fn new(
        chain: SupportedChain,
        url: impl Into<String>,
        http: Arc<HttpClient>,
        timeout: Duration,
    ) -> Self {
        Self { chain, url: url.into(), http, timeout, next_id: AtomicU64::new(1) }
    }

    fn parse_result(body: &[u8]) -> Result<Bytes, UpstreamError> {
        let response: JsonRpcResponse = serde_json::from_slice(body)
            .map_err(|e| UpstreamError::InvalidResponse(format!("malformed JSON-RPC body: {e}")))?;

        if let Some(error) = response.error {
            return Err(UpstreamError::RpcError(error.code, error.message));
        }

        let result = response
            .result
            .ok_or_else(|| UpstreamError::InvalidResponse("missing result".to_string()))?;
        let raw = result
            .as_str()
            .ok_or_else(|| UpstreamError::InvalidResponse("result is not a hex string".to_string()))?;

        raw.parse::<Bytes>()
            .map_err(|e| UpstreamError::InvalidResponse(format!("result is not valid hex: {e}")))
    }
}

#[async_trait]
impl ContractTransport for RpcConnection {
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, UpstreamError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let params = json!([
            { "to": hex::encode_prefixed(to), "data": hex::encode_prefixed(&data) },
            "latest"
        ]);
        let request = JsonRpcRequest::new("eth_call", params, id);
        let body = serde_json::to_vec(&request)
            .map_err(|e| UpstreamError::InvalidRequest(e.to_string()))?;

        trace!(chain = %self.chain, id, "sending eth_call");
        let response = self.http.send_request(&self.url, body.into(), self.timeout).await?;
        Self::parse_result(&response)
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}

/// Builds [`RpcConnection`]s over a shared [`HttpClient`], honoring endpoint overrides.
pub struct RpcConnectionFactory {
    http: Arc<HttpClient>,
    overrides: HashMap<u64, String>,
    timeout: Duration,
}

impl RpcConnectionFactory {
    #[must_use]
    pub fn new(http: Arc<HttpClient>, config: &ChainsConfig) -> Self {
        let overrides =
            config.endpoints.iter().map(|e| (e.chain_id, e.rpc_url.clone())).collect();
        Self { http, overrides, timeout: Duration::from_secs(config.rpc_timeout_seconds) }
    }

    /// URL a connection for `chain` will use.
    #[must_use]
    pub fn url_for(&self, chain: SupportedChain) -> &str {
        self.overrides.get(&chain.id()).map_or(chain.default_rpc_url(), String::as_str)
    }
}

impl ConnectionFactory for RpcConnectionFactory {
    fn create(&self, chain: SupportedChain) -> Result<Arc<dyn ContractTransport>, ChainError> {
        let url = self.url_for(chain);
        if !url.starts_with("http") {
            return Err(ChainError::Connection {
                chain_id: chain.id(),
                reason: format!("unsupported endpoint scheme: {url}"),
            });
        }
        Ok(Arc::new(RpcConnection::new(chain, url, Arc::clone(&self.http), self.timeout)))
    }
}
