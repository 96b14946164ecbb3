//! HTTP surface for cached contract reads and profile lookups.
//!
//! [`AppState`] wires the core services together once at startup; [`create_app`] builds
//! the axum router with its layer stack.

pub mod middleware;
pub mod router;

use anyhow::{Context, Result};
use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use miniread_core::{
    cache::{CacheStore, ReadThroughCache},
    chain::ConnectionRegistry,
    config::AppConfig,
    contract::ContractReader,
    profile::ProfileFetcher,
    upstream::{HttpClient, RpcConnectionFactory},
};
use std::{future::Future, sync::Arc};
use tokio::net::TcpListener;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::{
    compression::CompressionLayer, limit::RequestBodyLimitLayer, timeout::TimeoutLayer,
};
use tracing::info;

/// Shared services handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub reader: Arc<ContractReader>,
    pub profiles: Arc<ProfileFetcher>,
    pub cache: ReadThroughCache,
}

impl AppState {
    #[must_use]
    pub fn new(reader: ContractReader, profiles: ProfileFetcher, cache: ReadThroughCache) -> Self {
        Self { reader: Arc::new(reader), profiles: Arc::new(profiles), cache }
    }

    /// Builds every service from configuration.
    ///
    /// An unreachable cache backend is not an error: the service starts with caching
    /// disabled and serves every read live.
    ///
    /// # Errors
    ///
    /// Fails if the outbound HTTP client cannot be built.
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let http = Arc::new(
            HttpClient::with_concurrency_limit(config.chains.max_concurrent_upstream_requests)
                .map_err(|e| anyhow::anyhow!("HTTP client initialization failed: {e}"))?,
        );

        let store = CacheStore::connect(&config.cache).await;
        info!(
            backend = store.backend_name(),
            enabled = store.is_enabled(),
            "cache initialized"
        );
        let cache = ReadThroughCache::new(store);

        let factory = Arc::new(RpcConnectionFactory::new(http.clone(), &config.chains));
        let registry = Arc::new(ConnectionRegistry::new(factory));
        let reader = ContractReader::new(registry, cache.clone());

        let profiles = ProfileFetcher::new(http, &config.profile, cache.clone());
        if !profiles.is_configured() {
            info!("no profile API key configured, profile lookups will return 503");
        }

        Ok(Self::new(reader, profiles, cache))
    }
}

/// Builds the router with request ids, logging, limits and compression.
pub fn create_app(state: AppState, config: &AppConfig) -> Router {
    let (set_request_id, propagate_request_id) = middleware::create_request_id_layers();

    Router::new()
        .route("/contract/read", post(router::handle_contract_read))
        .route("/token/{chain_id}/{address}", get(router::handle_token_metadata))
        .route("/profile/{fid}", get(router::handle_profile))
        .route("/health", get(router::handle_health))
        .with_state(state)
        .layer(axum_middleware::from_fn(middleware::log_request))
        .layer(TimeoutLayer::new(config.request_timeout()))
        .layer(ConcurrencyLimitLayer::new(config.server.max_concurrent_requests))
        .layer(RequestBodyLimitLayer::new(config.server.max_body_bytes))
        .layer(CompressionLayer::new())
        .layer(propagate_request_id)
        .layer(set_request_id)
}

/// Serves `app` on `listener` until `shutdown` resolves, then drains in-flight requests.
///
/// # Errors
///
/// Returns the listener's I/O error if serving stops for any reason other than `shutdown`.
pub async fn run(
    listener: TcpListener,
    app: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed")
}
