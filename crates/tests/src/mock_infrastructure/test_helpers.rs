//! Wiring and request helpers shared by the scenario tests.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use miniread_core::{
    cache::{CacheBackend, CacheStore, MemoryBackend, ReadThroughCache, StoreError},
    chain::ConnectionRegistry,
    config::{AppConfig, ChainEndpoint, ChainsConfig, ProfileConfig},
    contract::ContractReader,
    profile::ProfileFetcher,
    upstream::{HttpClient, RpcConnectionFactory},
};
use serde_json::{json, Value};
use server::{create_app, AppState};
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

pub const TOKEN: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

pub const NAME_SELECTOR: &str = "0x06fdde03";
pub const SYMBOL_SELECTOR: &str = "0x95d89b41";
pub const DECIMALS_SELECTOR: &str = "0x313ce567";
pub const TOTAL_SUPPLY_SELECTOR: &str = "0x18160ddd";
pub const BALANCE_OF_SELECTOR: &str = "0x70a08231";

/// Backend whose every operation fails, counting the attempts.
#[derive(Debug, Default)]
pub struct FailingBackend {
    pub attempts: AtomicUsize,
}

impl FailingBackend {
    fn fail<T>(&self) -> Result<T, StoreError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

#[async_trait]
impl CacheBackend for FailingBackend {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        self.fail()
    }

    async fn set_ex(&self, _key: &str, _value: String, _ttl_seconds: u64) -> Result<(), StoreError> {
        self.fail()
    }

    async fn delete(&self, _key: &str) -> Result<(), StoreError> {
        self.fail()
    }

    async fn mget(&self, _keys: &[String]) -> Result<Vec<Option<String>>, StoreError> {
        self.fail()
    }
}

/// Backend that always misses and whose writes never complete.
#[derive(Debug, Default)]
pub struct StallingBackend {
    pub writes_started: AtomicUsize,
}

#[async_trait]
impl CacheBackend for StallingBackend {
    fn name(&self) -> &'static str {
        "stalling"
    }

    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Ok(None)
    }

    async fn set_ex(&self, _key: &str, _value: String, _ttl_seconds: u64) -> Result<(), StoreError> {
        self.writes_started.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }

    async fn delete(&self, _key: &str) -> Result<(), StoreError> {
        Ok(())
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>, StoreError> {
        Ok(vec![None; keys.len()])
    }
}

/// A fully wired server with mocked upstreams.
pub struct TestStack {
    pub app: Router,
    pub cache: ReadThroughCache,
}

impl TestStack {
    /// Mainnet reads go to `rpc_url`; profile lookups go to `neynar_url` with `api_key`.
    #[must_use]
    pub fn new(
        store: CacheStore,
        rpc_url: &str,
        neynar_url: &str,
        api_key: Option<&str>,
    ) -> Self {
        let http = Arc::new(HttpClient::new().expect("http client"));
        let cache = ReadThroughCache::new(store);

        let chains = ChainsConfig {
            rpc_timeout_seconds: 5,
            endpoints: vec![ChainEndpoint { chain_id: 1, rpc_url: rpc_url.to_string() }],
            ..ChainsConfig::default()
        };
        let registry = Arc::new(ConnectionRegistry::new(Arc::new(RpcConnectionFactory::new(
            http.clone(),
            &chains,
        ))));
        let reader = ContractReader::new(registry, cache.clone());

        let profile = ProfileConfig {
            api_base_url: neynar_url.to_string(),
            api_key: api_key.map(str::to_string),
            timeout_seconds: 5,
        };
        let profiles = ProfileFetcher::new(http, &profile, cache.clone());

        let app = create_app(AppState::new(reader, profiles, cache.clone()), &AppConfig::default());
        Self { app, cache }
    }

    /// Stack over a fresh in-memory backend, returned for inspection.
    #[must_use]
    pub fn with_memory(rpc_url: &str, neynar_url: &str, api_key: Option<&str>) -> (Self, Arc<MemoryBackend>) {
        let backend = Arc::new(MemoryBackend::new());
        let stack = Self::new(CacheStore::new(backend.clone()), rpc_url, neynar_url, api_key);
        (stack, backend)
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<&Value>) -> (StatusCode, Value) {
        send(self.app.clone(), method, uri, body).await
    }

    pub async fn read(&self, body: &Value) -> (StatusCode, Value) {
        self.request(Method::POST, "/contract/read", Some(body)).await
    }
}

pub async fn send(app: Router, method: Method, uri: &str, body: Option<&Value>) -> (StatusCode, Value) {
    use tower::ServiceExt;

    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app.oneshot(builder.body(body).expect("request")).await.expect("response");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

/// Contract read body for a zero-argument function of [`TOKEN`] on mainnet.
#[must_use]
pub fn read_body(function: &str, output_type: &str) -> Value {
    json!({
        "chainId": 1,
        "address": TOKEN,
        "abi": [{
            "type": "function",
            "name": function,
            "inputs": [],
            "outputs": [{"name": "", "type": output_type}],
            "stateMutability": "view"
        }],
        "functionName": function
    })
}

/// ERC-20 `balanceOf(owner)` read body.
#[must_use]
pub fn balance_of_body(owner: &str) -> Value {
    json!({
        "chainId": 1,
        "address": TOKEN,
        "abi": [{
            "type": "function",
            "name": "balanceOf",
            "inputs": [{"name": "owner", "type": "address"}],
            "outputs": [{"name": "", "type": "uint256"}],
            "stateMutability": "view"
        }],
        "functionName": "balanceOf",
        "args": [owner]
    })
}

/// Waits for the detached cache write of `key`.
pub async fn wait_for_entry(backend: &MemoryBackend, key: &str) {
    for _ in 0..100 {
        if backend.contains(key) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("cache entry {key} was never written");
}

/// Gives detached writes a chance to run before asserting their absence.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
