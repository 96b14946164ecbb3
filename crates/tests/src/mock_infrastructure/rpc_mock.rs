//! JSON-RPC node mock for `eth_call`.
//!
//! Wraps mockito and matches calls by method and function selector, so one server can
//! answer several functions of the same contract.

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::hex;
use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::json;

pub struct RpcMockBuilder {
    server: ServerGuard,
}

impl RpcMockBuilder {
    pub async fn new() -> Self {
        Self { server: Server::new_async().await }
    }

    #[must_use]
    pub fn url(&self) -> String {
        self.server.url()
    }

    fn eth_call_matcher(selector: &str) -> Matcher {
        Matcher::AllOf(vec![
            Matcher::Regex(r#""method"\s*:\s*"eth_call""#.to_string()),
            Matcher::Regex(format!(r#""data"\s*:\s*"{selector}"#)),
        ])
    }

    /// Answers `eth_call`s whose calldata starts with `selector` (`0x`-prefixed) with
    /// `output` ABI-encoded as a single return value. Expects exactly `times` calls.
    pub async fn mock_eth_call(&mut self, selector: &str, output: DynSolValue, times: usize) -> Mock {
        let encoded = DynSolValue::Tuple(vec![output]).abi_encode_params();
        self.server
            .mock("POST", "/")
            .match_body(Self::eth_call_matcher(selector))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"jsonrpc": "2.0", "id": 1, "result": hex::encode_prefixed(encoded)}).to_string())
            .expect(times)
            .create_async()
            .await
    }

    /// Answers `eth_call`s for `selector` with a JSON-RPC error.
    pub async fn mock_eth_call_error(&mut self, selector: &str, code: i32, message: &str, times: usize) -> Mock {
        self.server
            .mock("POST", "/")
            .match_body(Self::eth_call_matcher(selector))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({"jsonrpc": "2.0", "id": 1, "error": {"code": code, "message": message}}).to_string())
            .expect(times)
            .create_async()
            .await
    }

    /// Fails every request with `status`.
    pub async fn mock_http_error(&mut self, status: usize, times: usize) -> Mock {
        self.server
            .mock("POST", "/")
            .with_status(status)
            .with_body("upstream unavailable")
            .expect(times)
            .create_async()
            .await
    }

    /// Catches any request; assert it with `expect(0)` to prove nothing reached the node.
    pub async fn mock_any(&mut self, times: usize) -> Mock {
        self.server
            .mock("POST", Matcher::Any)
            .with_status(500)
            .expect(times)
            .create_async()
            .await
    }
}
