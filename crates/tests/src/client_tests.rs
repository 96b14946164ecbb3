//! The client query cache against a served router.

use crate::mock_infrastructure::*;
use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address, U256};
use miniread_core::{
    client::{ClientError, ContractReadClient, ContractReadQuery},
    contract::AbiFragment,
    upstream::HttpClient,
};
use serde_json::{json, Value};
use std::{sync::Arc, time::Duration};

async fn serve(stack: TestStack) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, stack.app).await.unwrap();
    });
    format!("http://{addr}")
}

fn client(base_url: &str) -> ContractReadClient {
    let http = Arc::new(HttpClient::new().unwrap());
    ContractReadClient::new(http, base_url, Duration::from_secs(60), Duration::from_secs(5))
}

fn abi(body: &Value) -> Vec<AbiFragment> {
    body["abi"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item.as_object().unwrap().clone())
        .collect()
}

fn token() -> Address {
    TOKEN.parse().unwrap()
}

#[tokio::test]
async fn test_client_reads_through_server() {
    let mut rpc = RpcMockBuilder::new().await;
    let supply = rpc.mock_eth_call(TOTAL_SUPPLY_SELECTOR, DynSolValue::Uint(U256::MAX, 256), 1).await;
    let (stack, _) = TestStack::with_memory(&rpc.url(), "http://127.0.0.1:9", None);
    let client = client(&serve(stack).await);

    let body = read_body("totalSupply", "uint256");
    let query = ContractReadQuery::new(1, token(), abi(&body), "totalSupply");

    let first = client.read(&query).await.unwrap();
    let second = client.read(&query).await.unwrap();

    assert_eq!(first, Some(json!(U256::MAX.to_string())));
    assert_eq!(first, second);
    supply.assert_async().await;
}

#[tokio::test]
async fn test_disabled_query_makes_no_request() {
    let mut rpc = RpcMockBuilder::new().await;
    let untouched = rpc.mock_any(0).await;
    let (stack, _) = TestStack::with_memory(&rpc.url(), "http://127.0.0.1:9", None);
    let client = client(&serve(stack).await);

    let body = read_body("name", "string");
    let query = ContractReadQuery::new(1, token(), abi(&body), "name").enabled(false);

    assert_eq!(client.read(&query).await.unwrap(), None);
    untouched.assert_async().await;
}

#[tokio::test]
async fn test_invalidate_refetches_from_server() {
    let mut rpc = RpcMockBuilder::new().await;
    let name = rpc.mock_eth_call(NAME_SELECTOR, DynSolValue::String("Token".into()), 1).await;
    let (stack, _) = TestStack::with_memory(&rpc.url(), "http://127.0.0.1:9", None);
    let client = client(&serve(stack).await);

    let body = read_body("name", "string");
    let query = ContractReadQuery::new(1, token(), abi(&body), "name");

    client.read(&query).await.unwrap();
    client.invalidate(&query).await;
    // The server answers the second read from its own cache once the write lands.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(client.read(&query).await.unwrap(), Some(json!("Token")));
    name.assert_async().await;
}

#[tokio::test]
async fn test_server_rejection_surfaces_issues() {
    let (stack, _) = TestStack::with_memory("http://127.0.0.1:9", "http://127.0.0.1:9", None);
    let client = client(&serve(stack).await);

    let body = read_body("name", "string");
    let query = ContractReadQuery::new(1, token(), abi(&body), "name").with_ttl(0);

    match client.read(&query).await {
        Err(ClientError::Rejected(issues)) => {
            assert!(issues.iter().any(|issue| issue.path == vec!["ttl".to_string()]));
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn test_server_failure_is_not_memoized() {
    let mut rpc = RpcMockBuilder::new().await;
    let failing = rpc.mock_http_error(503, 2).await;
    let (stack, _) = TestStack::with_memory(&rpc.url(), "http://127.0.0.1:9", None);
    let client = client(&serve(stack).await);

    let body = read_body("name", "string");
    let query = ContractReadQuery::new(1, token(), abi(&body), "name");

    for _ in 0..2 {
        match client.read(&query).await {
            Err(ClientError::Server { status, .. }) => assert_eq!(status, 500),
            other => panic!("expected server error, got {other:?}"),
        }
    }
    failing.assert_async().await;
}
