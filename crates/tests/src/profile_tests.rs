//! Profile lookups through the full server stack.

use crate::mock_infrastructure::*;
use axum::http::{Method, StatusCode};

const UNUSED_RPC: &str = "http://127.0.0.1:9";
const PROFILE_KEY: &str = "cache:neynar:user:3";

#[tokio::test]
async fn test_profile_is_cached_after_first_lookup() {
    let mut neynar = NeynarMockBuilder::new().await;
    let user = neynar.mock_user(3, "dwr", 1).await;
    let (stack, backend) = TestStack::with_memory(UNUSED_RPC, &neynar.url(), Some(TEST_API_KEY));

    let (status, first) = stack.request(Method::GET, "/profile/3", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["fid"], 3);
    assert_eq!(first["handle"], "dwr");
    assert_eq!(first["display_name"], "DWR");
    assert_eq!(first["avatar_url"], "https://img.example.com/3.png");

    wait_for_entry(&backend, PROFILE_KEY).await;
    assert_eq!(backend.ttl_of(PROFILE_KEY), Some(300));

    let (_, second) = stack.request(Method::GET, "/profile/3", None).await;
    assert_eq!(first, second);
    user.assert_async().await;
}

#[tokio::test]
async fn test_fresh_lookup_bypasses_cache() {
    let mut neynar = NeynarMockBuilder::new().await;
    let user = neynar.mock_user(3, "dwr", 2).await;
    let (stack, backend) = TestStack::with_memory(UNUSED_RPC, &neynar.url(), Some(TEST_API_KEY));

    stack.request(Method::GET, "/profile/3", None).await;
    wait_for_entry(&backend, PROFILE_KEY).await;
    let (status, body) = stack.request(Method::GET, "/profile/3?fresh=true", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["handle"], "dwr");
    user.assert_async().await;
}

#[tokio::test]
async fn test_unknown_fid_is_not_found_and_not_cached() {
    let mut neynar = NeynarMockBuilder::new().await;
    let missing = neynar.mock_no_user(404_404, 2).await;
    let (stack, backend) = TestStack::with_memory(UNUSED_RPC, &neynar.url(), Some(TEST_API_KEY));

    for _ in 0..2 {
        let (status, body) = stack.request(Method::GET, "/profile/404404", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Profile not found");
    }

    missing.assert_async().await;
    settle().await;
    assert!(backend.is_empty());
}

#[tokio::test]
async fn test_rate_limited_lookup_is_not_cached() {
    let mut neynar = NeynarMockBuilder::new().await;
    let limited = neynar.mock_error(3, 429, 2).await;
    let (stack, backend) = TestStack::with_memory(UNUSED_RPC, &neynar.url(), Some(TEST_API_KEY));

    for _ in 0..2 {
        let (status, body) = stack.request(Method::GET, "/profile/3", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Profile lookup failed");
    }

    limited.assert_async().await;
    settle().await;
    assert!(backend.is_empty());
}

#[tokio::test]
async fn test_missing_api_key_is_unavailable() {
    let (stack, _) = TestStack::with_memory(UNUSED_RPC, "http://127.0.0.1:9", None);

    let (status, body) = stack.request(Method::GET, "/profile/3", None).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "Profile lookups are not configured");
}

#[tokio::test]
async fn test_non_numeric_fid_is_rejected() {
    let (stack, _) = TestStack::with_memory(UNUSED_RPC, "http://127.0.0.1:9", Some(TEST_API_KEY));

    let (status, body) = stack.request(Method::GET, "/profile/dwr", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["path"][0], "fid");
}
