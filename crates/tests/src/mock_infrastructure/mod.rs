//! Mock upstreams and wiring for the scenario tests.
//!
//! - `RpcMockBuilder`: mockito JSON-RPC node answering `eth_call` by function selector
//! - `NeynarMockBuilder`: mockito Neynar user API
//! - `TestStack`: the server router over mocked upstreams and a chosen cache backend
//!
//! ```ignore
//! use tests::mock_infrastructure::*;
//!
//! let mut rpc = RpcMockBuilder::new().await;
//! let name = rpc.mock_eth_call(NAME_SELECTOR, DynSolValue::String("Token".into()), 1).await;
//! let (stack, backend) = TestStack::with_memory(&rpc.url(), "http://127.0.0.1:1", None);
//! let (status, body) = stack.read(&read_body("name", "string")).await;
//! ```

pub mod neynar_mock;
pub mod rpc_mock;
pub mod test_helpers;

pub use neynar_mock::{NeynarMockBuilder, TEST_API_KEY};
pub use rpc_mock::RpcMockBuilder;
pub use test_helpers::*;
