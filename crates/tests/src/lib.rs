//! Cross-crate scenario tests for miniread.
//!
//! Every test drives the real server router over mocked upstreams (mockito) and an
//! inspectable cache backend:
//!
//! - `contract_read_tests`: first read, repeat read, validation, TTLs, large integers
//! - `degradation_tests`: failing and disabled cache backends
//! - `negative_caching_tests`: failures are never cached
//! - `profile_tests`: cached and fresh profile lookups
//! - `client_tests`: the client query cache against a live listener
//!
//! ```bash
//! cargo test --package tests
//! ```

#[cfg(test)]
mod client_tests;

#[cfg(test)]
mod contract_read_tests;


#[cfg(test)]
mod negative_caching_tests;

#[cfg(test)]
mod profile_tests;

pub mod mock_infrastructure;
