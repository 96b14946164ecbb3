//! Contract reads through the full server stack.

use crate::mock_infrastructure::*;
use alloy_dyn_abi::DynSolValue;
use alloy_primitives::U256;
use axum::http::{Method, StatusCode};
use serde_json::json;

const UNUSED_NEYNAR: &str = "http://127.0.0.1:9";
const NAME_KEY: &str = "cache:contract:read:1:0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa:name:noargs";

#[tokio::test]
async fn test_first_read_calls_node_and_caches_with_default_ttl() {
    let mut rpc = RpcMockBuilder::new().await;
    let name = rpc.mock_eth_call(NAME_SELECTOR, DynSolValue::String("Wrapped Ether".into()), 1).await;
    let (stack, backend) = TestStack::with_memory(&rpc.url(), UNUSED_NEYNAR, None);

    let (status, body) = stack.read(&read_body("name", "string")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"result": "Wrapped Ether"}));
    name.assert_async().await;

    wait_for_entry(&backend, NAME_KEY).await;
    assert_eq!(backend.ttl_of(NAME_KEY), Some(900));
    assert_eq!(backend.len(), 1);
}

#[tokio::test]
async fn test_repeat_read_is_served_from_cache() {
    let mut rpc = RpcMockBuilder::new().await;
    let name = rpc.mock_eth_call(NAME_SELECTOR, DynSolValue::String("Wrapped Ether".into()), 1).await;
    let (stack, backend) = TestStack::with_memory(&rpc.url(), UNUSED_NEYNAR, None);

    let (_, first) = stack.read(&read_body("name", "string")).await;
    wait_for_entry(&backend, NAME_KEY).await;
    let (status, second) = stack.read(&read_body("name", "string")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(first, second);
    name.assert_async().await;

    let stats = stack.cache.store().stats().snapshot();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
}

#[tokio::test]
async fn test_address_case_shares_one_entry() {
    let mut rpc = RpcMockBuilder::new().await;
    let name = rpc.mock_eth_call(NAME_SELECTOR, DynSolValue::String("Token".into()), 1).await;
    let (stack, backend) = TestStack::with_memory(&rpc.url(), UNUSED_NEYNAR, None);

    stack.read(&read_body("name", "string")).await;
    wait_for_entry(&backend, NAME_KEY).await;

    let mut upper = read_body("name", "string");
    upper["address"] = json!("0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA");
    let (status, body) = stack.read(&upper).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], "Token");
    assert_eq!(backend.keys(), vec![NAME_KEY.to_string()]);
    name.assert_async().await;
}

#[tokio::test]
async fn test_invalid_address_never_reaches_node() {
    let mut rpc = RpcMockBuilder::new().await;
    let untouched = rpc.mock_any(0).await;
    let (stack, backend) = TestStack::with_memory(&rpc.url(), UNUSED_NEYNAR, None);

    let mut body = read_body("name", "string");
    body["address"] = json!("0x1234");
    let (status, response) = stack.read(&body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["error"], "Invalid request");
    let details = response["details"].as_array().unwrap();
    assert!(details.iter().any(|issue| issue["path"] == json!(["address"])));

    untouched.assert_async().await;
    settle().await;
    assert!(backend.is_empty());
}

#[tokio::test]
async fn test_all_invalid_fields_are_reported_together() {
    let (stack, _) = TestStack::with_memory("http://127.0.0.1:9", UNUSED_NEYNAR, None);

    let (status, response) = stack
        .read(&json!({"chainId": "one", "address": 5, "abi": "nope", "functionName": 1, "ttl": 0}))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let paths: Vec<_> = response["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|issue| issue["path"][0].as_str().unwrap().to_string())
        .collect();
    for field in ["chainId", "address", "abi", "functionName", "ttl"] {
        assert!(paths.iter().any(|p| p == field), "missing issue for {field}: {paths:?}");
    }
}

#[tokio::test]
async fn test_custom_ttl_is_used_for_the_entry() {
    let mut rpc = RpcMockBuilder::new().await;
    let _decimals = rpc.mock_eth_call(DECIMALS_SELECTOR, DynSolValue::Uint(U256::from(18), 8), 1).await;
    let (stack, backend) = TestStack::with_memory(&rpc.url(), UNUSED_NEYNAR, None);

    let mut body = read_body("decimals", "uint8");
    body["ttl"] = json!(42);
    let (status, response) = stack.read(&body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["result"], 18);

    let key = "cache:contract:read:1:0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa:decimals:noargs";
    wait_for_entry(&backend, key).await;
    assert_eq!(backend.ttl_of(key), Some(42));
}

#[tokio::test]
async fn test_ttl_beyond_ceiling_is_rejected() {
    let mut rpc = RpcMockBuilder::new().await;
    let untouched = rpc.mock_any(0).await;
    let (stack, backend) = TestStack::with_memory(&rpc.url(), UNUSED_NEYNAR, None);

    let mut body = read_body("decimals", "uint8");
    body["ttl"] = json!(u64::MAX);
    let (status, response) = stack.read(&body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["details"][0]["code"], "too_big");
    assert_eq!(response["details"][0]["path"], json!(["ttl"]));

    untouched.assert_async().await;
    settle().await;
    assert!(backend.is_empty());
}

#[tokio::test]
async fn test_large_integers_are_returned_as_strings() {
    let supply = U256::from(10).pow(U256::from(27));
    let mut rpc = RpcMockBuilder::new().await;
    let _supply = rpc.mock_eth_call(TOTAL_SUPPLY_SELECTOR, DynSolValue::Uint(supply, 256), 1).await;
    let _decimals = rpc.mock_eth_call(DECIMALS_SELECTOR, DynSolValue::Uint(U256::from(6), 8), 1).await;
    let (stack, _) = TestStack::with_memory(&rpc.url(), UNUSED_NEYNAR, None);

    let (_, large) = stack.read(&read_body("totalSupply", "uint256")).await;
    let (_, small) = stack.read(&read_body("decimals", "uint8")).await;

    assert_eq!(large["result"], json!("1000000000000000000000000000"));
    assert_eq!(small["result"], json!(6));
}

#[tokio::test]
async fn test_reads_with_different_args_are_cached_separately() {
    let mut rpc = RpcMockBuilder::new().await;
    let balance = rpc.mock_eth_call(BALANCE_OF_SELECTOR, DynSolValue::Uint(U256::from(7), 256), 2).await;
    let (stack, backend) = TestStack::with_memory(&rpc.url(), UNUSED_NEYNAR, None);

    let alice = balance_of_body("0x0000000000000000000000000000000000000001");
    let bob = balance_of_body("0x0000000000000000000000000000000000000002");

    let (_, first) = stack.read(&alice).await;
    let (_, second) = stack.read(&bob).await;
    assert_eq!(first["result"], "7");
    assert_eq!(second["result"], "7");
    balance.assert_async().await;

    for _ in 0..100 {
        if backend.len() == 2 {
            break;
        }
        settle().await;
    }
    let keys = backend.keys();
    assert_eq!(keys.len(), 2);
    assert!(keys.iter().all(|k| k.starts_with("cache:contract:read:1:0xaaaa") && !k.ends_with(":noargs")));
}

#[tokio::test]
async fn test_unsupported_chain_is_rejected() {
    let mut rpc = RpcMockBuilder::new().await;
    let untouched = rpc.mock_any(0).await;
    let (stack, _) = TestStack::with_memory(&rpc.url(), UNUSED_NEYNAR, None);

    let mut body = read_body("name", "string");
    body["chainId"] = json!(999_999);
    let (status, response) = stack.read(&body).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response, json!({"error": "Contract read failed"}));
    untouched.assert_async().await;
}

#[tokio::test]
async fn test_token_metadata_reads_three_fields() {
    let mut rpc = RpcMockBuilder::new().await;
    let name = rpc.mock_eth_call(NAME_SELECTOR, DynSolValue::String("USD Coin".into()), 1).await;
    let symbol = rpc.mock_eth_call(SYMBOL_SELECTOR, DynSolValue::String("USDC".into()), 1).await;
    let decimals = rpc.mock_eth_call(DECIMALS_SELECTOR, DynSolValue::Uint(U256::from(6), 8), 1).await;
    let (stack, backend) = TestStack::with_memory(&rpc.url(), UNUSED_NEYNAR, None);

    let (status, body) = stack.request(Method::GET, &format!("/token/1/{TOKEN}"), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"name": "USD Coin", "symbol": "USDC", "decimals": 6}));
    name.assert_async().await;
    symbol.assert_async().await;
    decimals.assert_async().await;

    wait_for_entry(&backend, NAME_KEY).await;
    assert_eq!(backend.ttl_of(NAME_KEY), Some(3600));
}

#[tokio::test]
async fn test_token_metadata_rejects_bad_path() {
    let (stack, _) = TestStack::with_memory("http://127.0.0.1:9", UNUSED_NEYNAR, None);

    let (status, body) = stack.request(Method::GET, "/token/abc/0x12", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"].as_array().unwrap().len(), 2);
}
