use alloy_primitives::{Address, Bytes};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::{chain::SupportedChain, upstream::UpstreamError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("unsupported chain id: {0}")]
    UnsupportedChain(u64),

    #[error("failed to create connection for chain {chain_id}: {reason}")]
    Connection { chain_id: u64, reason: String },
}

/// A live connection able to run read-only calls on one chain.
#[async_trait]
pub trait ContractTransport: Send + Sync {
    /// Executes `eth_call` with `data` against `to` at the latest block.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, UpstreamError>;

    /// Endpoint this transport talks to, for logs.
    fn endpoint(&self) -> &str;
}

/// Creates transports for supported chains.
pub trait ConnectionFactory: Send + Sync {
    /// # Errors
    ///
    /// Returns [`ChainError::Connection`] if the transport cannot be built.
    fn create(&self, chain: SupportedChain) -> Result<Arc<dyn ContractTransport>, ChainError>;
}

/// Memoizes one transport per supported chain for the registry's lifetime.
///
/// Two tasks resolving the same chain concurrently may both build a transport; only the
/// first one inserted is kept and both callers receive it.
pub struct ConnectionRegistry {
    factory: Arc<dyn ConnectionFactory>,
    connections: DashMap<u64, Arc<dyn ContractTransport>>,
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRegistry").field("connected", &self.connections.len()).finish()
    }
}

impl ConnectionRegistry {
    #[must_use]
    pub fn new(factory: Arc<dyn ConnectionFactory>) -> Self {
        Self { factory, connections: DashMap::new() }
    }

    /// Returns the transport for `chain_id`, creating it on first use.
    ///
    /// # Errors
    ///
    /// - [`ChainError::UnsupportedChain`] if `chain_id` is not in the chain table
    /// - [`ChainError::Connection`] if the factory fails
    pub fn resolve(&self, chain_id: u64) -> Result<Arc<dyn ContractTransport>, ChainError> {
        let chain = SupportedChain::from_id(chain_id).ok_or(ChainError::UnsupportedChain(chain_id))?;

        if let Some(existing) = self.connections.get(&chain_id) {
            return Ok(Arc::clone(existing.value()));
        }

        let created = self.factory.create(chain)?;
        let conn = Arc::clone(
            self.connections.entry(chain_id).or_insert_with(|| Arc::clone(&created)).value(),
        );

        if Arc::ptr_eq(&conn, &created) {
            info!(chain = %chain, endpoint = conn.endpoint(), "chain connection created");
        } else {
            debug!(chain = %chain, "lost connection creation race, reusing existing handle");
        }
        Ok(conn)
    }

    /// Number of chains with a live handle.
    #[must_use]
    pub fn connected_chains(&self) -> usize {
        self.connections.len()
    }
}
