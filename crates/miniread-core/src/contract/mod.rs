//! Typed, cached contract reads.
//!
//! A [`ReadRequest`] names a chain, a contract, the ABI fragments describing it, a
//! function and its arguments. [`ContractReader::read`] validates the request against the
//! ABI, derives the cache key, and on a miss runs `eth_call` through the chain's
//! connection and decodes the result into a [`ReadValue`].

pub mod abi;
pub mod errors;
pub mod reader;
pub mod value;

pub use abi::AbiFragment;
pub use errors::ContractError;
pub use reader::{contract_cache_key, ContractReader, ReadRequest, TokenMetadata};
pub use value::ReadValue;
