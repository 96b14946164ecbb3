//! Failed reads are never written to the cache.

use crate::mock_infrastructure::*;
use alloy_dyn_abi::DynSolValue;
use axum::http::StatusCode;
use serde_json::json;

const UNUSED_NEYNAR: &str = "http://127.0.0.1:9";

#[tokio::test]
async fn test_revert_is_not_cached_and_retry_calls_again() {
    let mut rpc = RpcMockBuilder::new().await;
    let reverted = rpc.mock_eth_call_error(NAME_SELECTOR, 3, "execution reverted", 2).await;
    let (stack, backend) = TestStack::with_memory(&rpc.url(), UNUSED_NEYNAR, None);

    let (first, body) = stack.read(&read_body("name", "string")).await;
    settle().await;
    let (second, _) = stack.read(&read_body("name", "string")).await;
    settle().await;

    assert_eq!(first, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(second, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Contract read failed"}));
    assert!(!body.to_string().contains("reverted"));
    reverted.assert_async().await;

    assert!(backend.is_empty());
    let stats = stack.cache.store().stats().snapshot();
    assert_eq!(stats.compute_failures, 2);
    assert_eq!(stats.writes, 0);
}

#[tokio::test]
async fn test_node_http_error_is_not_cached() {
    let mut rpc = RpcMockBuilder::new().await;
    let failing = rpc.mock_http_error(502, 1).await;
    let (stack, backend) = TestStack::with_memory(&rpc.url(), UNUSED_NEYNAR, None);

    let (status, _) = stack.read(&read_body("name", "string")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    failing.assert_async().await;

    settle().await;
    assert!(backend.is_empty());
}

#[tokio::test]
async fn test_recovery_after_failure_caches_the_good_value() {
    let mut rpc = RpcMockBuilder::new().await;
    let reverted = rpc.mock_eth_call_error(NAME_SELECTOR, -32000, "header not found", 1).await;
    let (stack, backend) = TestStack::with_memory(&rpc.url(), UNUSED_NEYNAR, None);

    let (status, _) = stack.read(&read_body("name", "string")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    reverted.assert_async().await;
    reverted.remove_async().await;

    let healthy = rpc.mock_eth_call(NAME_SELECTOR, DynSolValue::String("Back".into()), 1).await;
    let (status, body) = stack.read(&read_body("name", "string")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], "Back");
    healthy.assert_async().await;
    wait_for_entry(&backend, "cache:contract:read:1:0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa:name:noargs")
        .await;
}
