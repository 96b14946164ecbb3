//! Neynar user API mock.

use mockito::{Matcher, Mock, Server, ServerGuard};
use serde_json::json;

pub const TEST_API_KEY: &str = "test-neynar-key";

pub struct NeynarMockBuilder {
    server: ServerGuard,
}

impl NeynarMockBuilder {
    pub async fn new() -> Self {
        Self { server: Server::new_async().await }
    }

    #[must_use]
    pub fn url(&self) -> String {
        self.server.url()
    }

    fn bulk(&mut self, fid: u64) -> Mock {
        self.server
            .mock("GET", "/v2/farcaster/user/bulk")
            .match_query(Matcher::UrlEncoded("fids".into(), fid.to_string()))
            .match_header("x-api-key", TEST_API_KEY)
    }

    /// Serves a user for `fid` with the given username. Expects exactly `times` calls.
    pub async fn mock_user(&mut self, fid: u64, username: &str, times: usize) -> Mock {
        let body = json!({
            "users": [{
                "fid": fid,
                "username": username,
                "display_name": username.to_uppercase(),
                "pfp_url": format!("https://img.example.com/{fid}.png"),
                "custody_address": "0x0000000000000000000000000000000000000c05",
                "verifications": ["0x0000000000000000000000000000000000000001"],
                "power_badge": false
            }]
        });
        self.bulk(fid)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
            .expect(times)
            .create_async()
            .await
    }

    pub async fn mock_no_user(&mut self, fid: u64, times: usize) -> Mock {
        self.bulk(fid).with_status(200).with_body(r#"{"users":[]}"#).expect(times).create_async().await
    }

    pub async fn mock_error(&mut self, fid: u64, status: usize, times: usize) -> Mock {
        self.bulk(fid)
            .with_status(status)
            .with_body(r#"{"code":"RateLimitExceeded","message":"Too many requests"}"#)
            .expect(times)
            .create_async()
            .await
    }
}
