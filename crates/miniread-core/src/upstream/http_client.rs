use bytes::Bytes;
use reqwest::{Client, ClientBuilder, RequestBuilder};
use std::{sync::Arc, time::Duration};
use tokio::sync::Semaphore;
use tracing::{trace, warn};

use crate::upstream::UpstreamError;

/// Largest slice of an error body kept in [`UpstreamError::HttpError`].
const MAX_ERROR_BODY_LEN: usize = 256;
const TRUNCATION_MARKER: &str = "... (truncated)";

/// Outbound limits shared by every JSON-RPC node and the identity API.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Requests allowed in flight at once across all upstreams
    pub max_in_flight: usize,
    /// How long a request may wait for a free slot before failing with a timeout
    pub queue_timeout: Duration,
    /// TCP connect timeout, separate from the per-request timeout
    pub connect_timeout: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            max_in_flight: 256,
            queue_timeout: Duration::from_millis(500),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// Shared outbound HTTP client.
///
/// Carries `eth_call` POSTs and identity API GETs. Each request is sent once with the
/// caller's timeout; there is no retry. A semaphore bounds how many run at once so a
/// burst of cache misses cannot open unbounded connections.
pub struct HttpClient {
    client: Client,
    slots: Arc<Semaphore>,
    config: HttpClientConfig,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("free_slots", &self.slots.available_permits())
            .field("config", &self.config)
            .finish()
    }
}

impl HttpClient {
    /// # Errors
    ///
    /// Returns an error if the underlying reqwest client fails to build.
    pub fn new() -> Result<Self, UpstreamError> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Client allowing at most `max_in_flight` concurrent requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reqwest client fails to build.
    pub fn with_concurrency_limit(max_in_flight: usize) -> Result<Self, UpstreamError> {
        Self::with_config(HttpClientConfig { max_in_flight, ..HttpClientConfig::default() })
    }

    /// # Errors
    ///
    /// Returns an error if the underlying reqwest client fails to build.
    pub fn with_config(config: HttpClientConfig) -> Result<Self, UpstreamError> {
        let client = ClientBuilder::new()
            .pool_idle_timeout(Duration::from_secs(30))
            .connect_timeout(config.connect_timeout)
            .use_rustls_tls()
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!("miniread/", env!("CARGO_PKG_VERSION")))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| {
                tracing::error!(error = %e, "failed to build http client");
                UpstreamError::ConnectionFailed(format!("HTTP client build failed: {e}"))
            })?;

        Ok(Self { client, slots: Arc::new(Semaphore::new(config.max_in_flight)), config })
    }

    /// Error text safe to log and return: no hosts, ports or resolver details.
    fn describe(error: &reqwest::Error) -> &'static str {
        if error.is_connect() {
            "connection refused or unreachable"
        } else if error.is_timeout() {
            "connection timed out"
        } else if error.is_body() {
            "response body error"
        } else if error.is_decode() {
            "response decode error"
        } else if error.is_redirect() {
            "unexpected redirect"
        } else {
            "network error"
        }
    }

    /// POSTs a JSON body and returns the raw response body.
    ///
    /// # Errors
    ///
    /// - [`UpstreamError::Timeout`] if no slot frees up in time or the request times out
    /// - [`UpstreamError::ConcurrencyLimit`] if the client is shutting down
    /// - [`UpstreamError::HttpError`] for non-success HTTP status codes
    /// - [`UpstreamError::ConnectionFailed`] for other network failures
    pub async fn send_request(
        &self,
        url: &str,
        body: Bytes,
        timeout: Duration,
    ) -> Result<Bytes, UpstreamError> {
        let request =
            self.client.post(url).header("content-type", "application/json").body(body);
        self.execute(url, request, timeout).await
    }

    /// GETs `url` with extra headers and returns the raw response body.
    ///
    /// # Errors
    ///
    /// Same as [`HttpClient::send_request`].
    pub async fn get(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<Bytes, UpstreamError> {
        let request = headers
            .iter()
            .fold(self.client.get(url).header("accept", "application/json"), |req, (k, v)| {
                req.header(*k, *v)
            });
        self.execute(url, request, timeout).await
    }

    async fn execute(
        &self,
        url: &str,
        request: RequestBuilder,
        timeout: Duration,
    ) -> Result<Bytes, UpstreamError> {
        let _slot = tokio::time::timeout(self.config.queue_timeout, self.slots.acquire())
            .await
            .map_err(|_| {
                warn!(url, max_in_flight = self.config.max_in_flight, "upstream request queue full");
                UpstreamError::Timeout
            })?
            .map_err(|_| UpstreamError::ConcurrencyLimit(url.to_string()))?;

        let response = request.timeout(timeout).send().await.map_err(|e| {
            if e.is_timeout() {
                UpstreamError::Timeout
            } else {
                UpstreamError::ConnectionFailed(Self::describe(&e).to_string())
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return response.bytes().await.map_err(|e| {
                if e.is_timeout() {
                    UpstreamError::Timeout
                } else {
                    UpstreamError::InvalidResponse(Self::describe(&e).to_string())
                }
            });
        }

        let body = response.text().await.unwrap_or_default();
        trace!(url, status = status.as_u16(), "upstream returned an error status");
        Err(UpstreamError::HttpError(status.as_u16(), truncate_body(body)))
    }

    #[cfg(test)]
    fn free_slots(&self) -> usize {
        self.slots.available_permits()
    }
}

fn truncate_body(mut text: String) -> String {
    if text.len() > MAX_ERROR_BODY_LEN {
        let mut cut = MAX_ERROR_BODY_LEN;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
        text.push_str(TRUNCATION_MARKER);
    }
    text
}
