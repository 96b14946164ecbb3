//! Outbound communication with JSON-RPC nodes and the identity API.
//!
//! - [`http_client`]: shared, concurrency-bounded HTTP client. Single attempt per request.
//! - [`rpc`]: `eth_call` transport implementing
//!   [`ContractTransport`](crate::chain::ContractTransport), and the factory the
//!   [`ConnectionRegistry`](crate::chain::ConnectionRegistry) uses to build it.
//! - [`errors`]: [`UpstreamError`] and JSON-RPC error classification.

pub mod errors;
pub mod http_client;
pub mod rpc;

pub use errors::{RpcErrorCategory, UpstreamError};
pub use http_client::{HttpClient, HttpClientConfig};
pub use rpc::{RpcConnection, RpcConnectionFactory};
