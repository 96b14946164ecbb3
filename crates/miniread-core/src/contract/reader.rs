use alloy_dyn_abi::{FunctionExt, JsonAbiExt};
use alloy_json_abi::Function;
use alloy_primitives::{hex, Address, Bytes};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::{Arc, LazyLock};
use tracing::{debug, error, warn};

use crate::{
    cache::{
        keys::{hash_args, namespaces, CacheKey},
        read_through::ReadThroughCache,
        ttl::CacheTtl,
    },
    chain::{ChainError, ConnectionRegistry, SupportedChain},
    contract::{
        abi::{self, AbiFragment},
        ContractError, ReadValue,
    },
    upstream::UpstreamError,
};

/// A typed read-only call to run against a contract.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadRequest {
    pub chain_id: u64,
    pub address: Address,
    pub abi: Vec<AbiFragment>,
    pub function_name: String,
    pub args: Vec<Value>,
    /// Cache lifetime in seconds; [`CacheTtl::Long`] when absent.
    pub ttl: Option<u64>,
}

impl ReadRequest {
    #[must_use]
    pub fn new(
        chain_id: u64,
        address: Address,
        abi: Vec<AbiFragment>,
        function_name: impl Into<String>,
    ) -> Self {
        Self { chain_id, address, abi, function_name: function_name.into(), args: Vec::new(), ttl: None }
    }

    #[must_use]
    pub fn with_args(mut self, args: Vec<Value>) -> Self {
        self.args = args;
        self
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl_seconds: u64) -> Self {
        self.ttl = Some(ttl_seconds);
        self
    }

    /// `cache:contract:read:{chainId}:{lowercase address}:{functionName}:{argsToken}`.
    #[must_use]
    pub fn cache_key(&self) -> CacheKey {
        contract_cache_key(self.chain_id, self.address, &self.function_name, &self.args)
    }

    #[must_use]
    pub fn effective_ttl(&self) -> u64 {
        self.ttl.unwrap_or(CacheTtl::Long.as_secs())
    }
}

/// Key under which a contract read is cached.
#[must_use]
pub fn contract_cache_key(
    chain_id: u64,
    address: Address,
    function_name: &str,
    args: &[Value],
) -> CacheKey {
    CacheKey::builder(namespaces::CONTRACT_READ)
        .part(chain_id)
        .part(hex::encode_prefixed(address))
        .part(function_name)
        .part(hash_args(args))
        .build()
}

/// ERC-20 `name`, `symbol` and `decimals`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

static ERC20_METADATA_ABI: LazyLock<Vec<AbiFragment>> = LazyLock::new(|| {
    let abi = json!([
        {
            "type": "function",
            "name": "name",
            "inputs": [],
            "outputs": [{"name": "", "type": "string"}],
            "stateMutability": "view"
        },
        {
            "type": "function",
            "name": "symbol",
            "inputs": [],
            "outputs": [{"name": "", "type": "string"}],
            "stateMutability": "view"
        },
        {
            "type": "function",
            "name": "decimals",
            "inputs": [],
            "outputs": [{"name": "", "type": "uint8"}],
            "stateMutability": "view"
        }
    ]);
    match abi {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
});

/// Typed contract reads behind the read-through cache.
#[derive(Debug, Clone)]
pub struct ContractReader {
    registry: Arc<ConnectionRegistry>,
    cache: ReadThroughCache,
}

impl ContractReader {
    #[must_use]
    pub fn new(registry: Arc<ConnectionRegistry>, cache: ReadThroughCache) -> Self {
        Self { registry, cache }
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Runs `request`, serving it from the cache when possible.
    ///
    /// The chain, the ABI and the arguments are checked before the cache is consulted.
    /// Failed reads are not cached.
    ///
    /// # Errors
    ///
    /// - [`ContractError::Chain`] for an unsupported chain id
    /// - [`ContractError::FunctionNotFound`], [`ContractError::InvalidAbi`] or
    ///   [`ContractError::InvalidArguments`] when the request does not describe a callable
    ///   function
    /// - [`ContractError::Upstream`] or [`ContractError::Decode`] when the call fails
    pub async fn read(&self, request: &ReadRequest) -> Result<ReadValue, ContractError> {
        let chain = SupportedChain::from_id(request.chain_id)
            .ok_or(ChainError::UnsupportedChain(request.chain_id))?;

        let function =
            abi::select_function(&request.abi, &request.function_name, request.args.len())?;
        let values = abi::coerce_args(&function, &request.args)?;
        let calldata: Bytes = function
            .abi_encode_input(&values)
            .map_err(|e| ContractError::Encoding(e.to_string()))?
            .into();

        let key = request.cache_key();
        let ttl = request.effective_ttl();

        self.cache
            .get_or_compute(&key, ttl, || async {
                let result = self.call(chain, request.address, &function, calldata.clone()).await;
                if let Err(e) = &result {
                    log_read_failure(&key, chain, request, e);
                }
                result
            })
            .await
    }

    async fn call(
        &self,
        chain: SupportedChain,
        address: Address,
        function: &Function,
        calldata: Bytes,
    ) -> Result<ReadValue, ContractError> {
        let transport = self.registry.resolve(chain.id())?;
        debug!(chain = %chain, address = %address, function = %function.name, "executing eth_call");

        let output = transport.call(address, calldata).await?;
        let decoded = function
            .abi_decode_output(&output)
            .map_err(|e| ContractError::Decode(e.to_string()))?;

        let values =
            decoded.into_iter().map(ReadValue::try_from).collect::<Result<Vec<_>, _>>()?;
        Ok(ReadValue::from_outputs(values))
    }

    /// Reads an ERC-20 token's `name`, `symbol` and `decimals` concurrently.
    ///
    /// Each field is cached on its own with [`CacheTtl::VeryLong`].
    ///
    /// # Errors
    ///
    /// Fails if any of the three reads fails or returns an unexpected type.
    pub async fn token_metadata(
        &self,
        chain_id: u64,
        token: Address,
    ) -> Result<TokenMetadata, ContractError> {
        let field = |name: &str| {
            ReadRequest::new(chain_id, token, ERC20_METADATA_ABI.clone(), name)
                .with_ttl(CacheTtl::VeryLong.as_secs())
        };
        let (name_req, symbol_req, decimals_req) = (field("name"), field("symbol"), field("decimals"));

        let (name, symbol, decimals) = tokio::try_join!(
            self.read(&name_req),
            self.read(&symbol_req),
            self.read(&decimals_req)
        )?;

        let text = |value: ReadValue, field: &str| match value {
            ReadValue::String(s) => Ok(s),
            other => Err(ContractError::Decode(format!("{field} returned {other:?}"))),
        };
        let decimals = decimals
            .as_u256()
            .and_then(|d| u8::try_from(d).ok())
            .ok_or_else(|| ContractError::Decode(format!("decimals returned {decimals:?}")))?;

        Ok(TokenMetadata { name: text(name, "name")?, symbol: text(symbol, "symbol")?, decimals })
    }
}

/// Reverts are the contract's answer and log at `warn`; node and network failures at `error`.
fn log_read_failure(key: &CacheKey, chain: SupportedChain, request: &ReadRequest, err: &ContractError) {
    let upstream = match err {
        ContractError::Upstream(e) => Some(e),
        _ => None,
    };
    let category = upstream.and_then(UpstreamError::rpc_category).map(|c| c.as_str());
    let transient = upstream.is_some_and(UpstreamError::is_transient);

    if upstream.is_some_and(UpstreamError::is_execution_error) {
        warn!(
            key = %key,
            chain_id = chain.id(),
            address = %request.address,
            function = %request.function_name,
            error = %err,
            "contract call reverted"
        );
    } else {
        error!(
            key = %key,
            chain_id = chain.id(),
            address = %request.address,
            function = %request.function_name,
            category,
            transient,
            error = %err,
            "contract read failed"
        );
    }
}
