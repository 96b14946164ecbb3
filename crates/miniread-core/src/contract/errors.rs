use thiserror::Error;

use crate::{chain::ChainError, upstream::UpstreamError};

/// Errors raised while reading a contract.
///
/// Only [`ContractError::Upstream`] and [`ContractError::Decode`] can happen after the
/// cache was consulted; everything else is rejected up front.
#[derive(Debug, Error, Clone)]
pub enum ContractError {
    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error("invalid ABI: {0}")]
    InvalidAbi(String),

    #[error("function `{0}` not found in ABI")]
    FunctionNotFound(String),

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("call encoding failed: {0}")]
    Encoding(String),

    #[error("upstream read failed: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("return data could not be decoded: {0}")]
    Decode(String),
}

impl ContractError {
    /// Whether the request itself was at fault (as opposed to the chain or the node).
    #[must_use]
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidAbi(_) | Self::FunctionNotFound(_) | Self::InvalidArguments(_)
        )
    }
}
