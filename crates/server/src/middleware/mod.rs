//! HTTP middleware for the server.
//!
//! These are axum adapters around `miniread_core::middleware`: the core crate decides
//! whether a request is valid, this module decides what the response looks like.

pub mod correlation_id;
pub mod validation;

pub use correlation_id::{create_request_id_layers, log_request, UuidRequestIdGenerator, X_REQUEST_ID};
pub use validation::{validation_error_response, ReadRejection, ValidatedRead};
