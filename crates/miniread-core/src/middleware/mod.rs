//! Request checks that run before any cache or upstream work.
//!
//! This module holds the business logic only. The axum adapters that turn a
//! [`ValidationError`] into a `400` response live in `crates/server/src/middleware`.
//!
//! # Validation
//!
//! [`validate_read_request`] checks a contract read body and reports every problem at
//! once, each as a [`ValidationIssue`] with a `code`, a `path` and a `message`:
//!
//! - the body must be a JSON object
//! - `chainId` must be a non-negative integer
//! - `address` must match `^0x[a-fA-F0-9]{40}$`
//! - `abi` must be an array of objects
//! - `functionName` must be a string
//! - `args` is an optional array, `ttl` an optional positive integer
//!
//! ```rust
//! use miniread_core::middleware::validate_read_request;
//! use serde_json::json;
//!
//! let err = validate_read_request(&json!({
//!     "chainId": 1,
//!     "address": "0x123",
//!     "abi": [],
//!     "functionName": "name"
//! }))
//! .unwrap_err();
//!
//! assert!(err.mentions("address"));
//! ```

pub mod validation;

pub use validation::{is_hex_address, validate_read_request, ValidationError, ValidationIssue};
