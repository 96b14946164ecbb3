//! Supported EVM chains and lazily created per-chain connections.
//!
//! The chain table is static: a request naming any other chain id is rejected before
//! it reaches the cache or the network. Each supported chain has a public JSON-RPC
//! endpoint that configuration may override (see
//! [`ChainsConfig`](crate::config::ChainsConfig)).

pub mod registry;

pub use registry::{ChainError, ConnectionFactory, ConnectionRegistry, ContractTransport};

use serde::{Deserialize, Serialize};
use std::fmt;

/// A chain the reader can talk to, identified on the wire by its numeric chain id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub enum SupportedChain {
    Mainnet,
    Base,
    Optimism,
    BaseSepolia,
}

impl SupportedChain {
    pub const ALL: [Self; 4] = [Self::Mainnet, Self::Base, Self::Optimism, Self::BaseSepolia];

    #[must_use]
    pub fn from_id(chain_id: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.id() == chain_id)
    }

    #[must_use]
    pub const fn id(self) -> u64 {
        match self {
            Self::Mainnet => 1,
            Self::Base => 8453,
            Self::Optimism => 10,
            Self::BaseSepolia => 84532,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Base => "base",
            Self::Optimism => "optimism",
            Self::BaseSepolia => "base-sepolia",
        }
    }

    /// Public endpoint used when no override is configured.
    #[must_use]
    pub const fn default_rpc_url(self) -> &'static str {
        match self {
            Self::Mainnet => "https://eth.merkle.io",
            Self::Base => "https://mainnet.base.org",
            Self::Optimism => "https://mainnet.optimism.io",
            Self::BaseSepolia => "https://sepolia.base.org",
        }
    }
}

impl fmt::Display for SupportedChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.id())
    }
}

impl TryFrom<u64> for SupportedChain {
    type Error = ChainError;

    fn try_from(chain_id: u64) -> Result<Self, Self::Error> {
        Self::from_id(chain_id).ok_or(ChainError::UnsupportedChain(chain_id))
    }
}

impl From<SupportedChain> for u64 {
    fn from(chain: SupportedChain) -> Self {
        chain.id()
    }
}
