//! Application configuration with layered loading.
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded in this order (later overrides earlier):
//!
//! 1. **Compiled defaults**: Hardcoded in struct `Default` implementations
//! 2. **Config file**: TOML file specified by `MINIREAD_CONFIG` env var
//! 3. **Environment variables**: `MINIREAD__SECTION__FIELD` env vars override specific fields
//!
//! # Configuration Sections
//!
//! - [`ServerConfig`]: HTTP server settings (bind address, concurrency, body size)
//! - [`CacheConfig`]: Cache backend selection and Redis connection settings
//! - [`ChainsConfig`]: JSON-RPC timeout and per-chain endpoint overrides
//! - [`ProfileConfig`]: Identity API location, key and timeout
//! - [`LoggingConfig`]: Log level and format
//!
//! # Example
//!
//! ```toml
//! [server]
//! bind_address = "0.0.0.0"
//! bind_port = 3000
//!
//! [cache]
//! backend = "redis"
//! redis_url = "redis://127.0.0.1:6379"
//!
//! [[chains.endpoints]]
//! chain_id = 8453
//! rpc_url = "https://base-mainnet.example.com"
//! ```

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};

use crate::chain::SupportedChain;

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "MINIREAD_CONFIG";

/// Configuration file used when [`CONFIG_PATH_ENV`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// HTTP server configuration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// IP address to bind the server to. Defaults to `127.0.0.1`.
    pub bind_address: String,

    /// Port number to listen on. Must be greater than 0. Defaults to `3000`.
    pub bind_port: u16,

    /// Maximum number of requests handled at once. Defaults to `100`.
    pub max_concurrent_requests: usize,

    /// Whole-request timeout in seconds. Defaults to `30`.
    pub request_timeout_seconds: u64,

    /// Largest accepted request body in bytes. Defaults to 1 MiB.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            bind_port: 3000,
            max_concurrent_requests: 100,
            request_timeout_seconds: 30,
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// Which storage backend the cache uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackendKind {
    #[default]
    Redis,
    Memory,
    Disabled,
}

impl CacheBackendKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Redis => "redis",
            Self::Memory => "memory",
            Self::Disabled => "disabled",
        }
    }
}

/// Cache backend configuration.
///
/// A Redis backend with no `redis_url`, or one that cannot be reached at startup, leaves
/// the service running with caching disabled.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Backend to use. Defaults to `redis`.
    pub backend: CacheBackendKind,

    /// Redis connection URL, e.g. `redis://:password@host:6379/0`.
    pub redis_url: Option<String>,

    /// Budget for connecting and the initial `PING`, in milliseconds. Defaults to `2000`.
    pub connect_timeout_ms: u64,

    /// Budget for each cache command, in milliseconds. Defaults to `1000`.
    pub command_timeout_ms: u64,

    /// Entry cap of the `memory` backend; least recently used entries are evicted
    /// beyond it. Defaults to `100000`.
    pub memory_max_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackendKind::Redis,
            redis_url: None,
            connect_timeout_ms: 2000,
            command_timeout_ms: 1000,
            memory_max_entries: 100_000,
        }
    }
}

/// Replacement JSON-RPC endpoint for one supported chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainEndpoint {
    pub chain_id: u64,
    pub rpc_url: String,
}

/// Chain access configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainsConfig {
    /// Timeout for each `eth_call`, in seconds. Defaults to `10`.
    pub rpc_timeout_seconds: u64,

    /// Maximum in-flight upstream HTTP requests across all chains. Defaults to `256`.
    pub max_concurrent_upstream_requests: usize,

    /// Endpoint overrides. Chains without one use their public default.
    pub endpoints: Vec<ChainEndpoint>,
}

impl Default for ChainsConfig {
    fn default() -> Self {
        Self { rpc_timeout_seconds: 10, max_concurrent_upstream_requests: 256, endpoints: Vec::new() }
    }
}

impl ChainsConfig {
    /// RPC URL configured for `chain_id`, if any.
    #[must_use]
    pub fn endpoint_for(&self, chain_id: u64) -> Option<&str> {
        self.endpoints.iter().find(|e| e.chain_id == chain_id).map(|e| e.rpc_url.as_str())
    }
}

/// Identity API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileConfig {
    /// Base URL of the identity API. Defaults to `https://api.neynar.com`.
    pub api_base_url: String,

    /// API key sent as `x-api-key`. Profile lookups are unavailable without one.
    pub api_key: Option<String>,

    /// Timeout for each lookup, in seconds. Defaults to `10`.
    pub timeout_seconds: u64,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.neynar.com".to_string(),
            api_key: None,
            timeout_seconds: 10,
        }
    }
}

impl ProfileConfig {
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }
}

/// Application logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (e.g., "trace", "debug", "info", "warn", "error"). Defaults to `"info"`.
    pub level: String,

    /// Output format: `"json"` or `"pretty"`. Defaults to `"pretty"`.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: "pretty".to_string() }
    }
}

/// Root application configuration containing all subsystem settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub cache: CacheConfig,
    pub chains: ChainsConfig,
    pub profile: ProfileConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Loads configuration from a TOML file with environment variable overrides.
    ///
    /// The file is optional. Environment variables with the `MINIREAD__` prefix override
    /// any value, with `__` separating nested fields (e.g. `MINIREAD__SERVER__BIND_PORT=8080`).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be parsed or the result cannot be
    /// deserialized.
    pub fn from_file<P: AsRef<Path>>(config_path: P) -> Result<Self, ConfigError> {
        let config_builder = Config::builder()
            .set_default("server.bind_address", "127.0.0.1")?
            .set_default("server.bind_port", 3000)?
            .set_default("cache.backend", "redis")?
            .set_default("chains.rpc_timeout_seconds", 10)?
            .set_default("profile.timeout_seconds", 10)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            .add_source(File::with_name(&config_path.as_ref().to_string_lossy()).required(false))
            .add_source(Environment::with_prefix("MINIREAD").separator("__").try_parsing(true))
            .build()?;

        config_builder.try_deserialize()
    }

    /// Loads configuration from the path in `MINIREAD_CONFIG`, or `config/config.toml`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration cannot be loaded or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_file(Self::config_path())
    }

    /// Path [`AppConfig::load`] reads from.
    #[must_use]
    pub fn config_path() -> String {
        std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
    }

    /// Returns the parsed socket address for the HTTP server.
    ///
    /// # Errors
    ///
    /// Returns an error string if the address cannot be parsed into a valid [`SocketAddr`].
    ///
    /// [`SocketAddr`]: std::net::SocketAddr
    pub fn socket_addr(&self) -> Result<std::net::SocketAddr, String> {
        format!("{}:{}", self.server.bind_address, self.server.bind_port)
            .parse()
            .map_err(|_| {
                format!(
                    "Invalid socket address: {}:{}",
                    self.server.bind_address, self.server.bind_port
                )
            })
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_seconds)
    }

    #[must_use]
    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.chains.rpc_timeout_seconds)
    }

    #[must_use]
    pub fn profile_timeout(&self) -> Duration {
        Duration::from_secs(self.profile.timeout_seconds)
    }

    /// Validates the configuration for correctness and consistency.
    ///
    /// # Errors
    ///
    /// Returns a descriptive error string for the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.server.bind_port == 0 {
            return Err("Bind port must be greater than 0".to_string());
        }

        if self.server.max_concurrent_requests == 0 {
            return Err("Max concurrent requests must be greater than 0".to_string());
        }

        if self.server.request_timeout_seconds == 0 {
            return Err("Request timeout must be greater than 0".to_string());
        }

        if self.server.max_body_bytes == 0 {
            return Err("Max body size must be greater than 0".to_string());
        }

        if self.cache.connect_timeout_ms == 0 || self.cache.command_timeout_ms == 0 {
            return Err("Cache timeouts must be greater than 0".to_string());
        }

        if self.cache.memory_max_entries == 0 {
            return Err("Memory cache capacity must be greater than 0".to_string());
        }

        if let Some(url) = &self.cache.redis_url {
            if !url.is_empty() && !(url.starts_with("redis://") || url.starts_with("rediss://")) {
                return Err(format!("Invalid Redis URL: {url}"));
            }
        }

        if self.chains.rpc_timeout_seconds == 0 {
            return Err("RPC timeout must be greater than 0".to_string());
        }

        if self.chains.max_concurrent_upstream_requests == 0 {
            return Err("Max concurrent upstream requests must be greater than 0".to_string());
        }

        for endpoint in &self.chains.endpoints {
            if SupportedChain::from_id(endpoint.chain_id).is_none() {
                return Err(format!(
                    "Endpoint override for unsupported chain: {}",
                    endpoint.chain_id
                ));
            }
            if !endpoint.rpc_url.starts_with("http") {
                return Err(format!(
                    "Invalid RPC URL for chain {}: {}",
                    endpoint.chain_id, endpoint.rpc_url
                ));
            }
        }

        if !self.profile.api_base_url.starts_with("http") {
            return Err(format!("Invalid profile API URL: {}", self.profile.api_base_url));
        }

        if self.profile.timeout_seconds == 0 {
            return Err("Profile timeout must be greater than 0".to_string());
        }

        if !["json", "pretty"].contains(&self.logging.format.as_str()) {
            return Err("Logging format must be 'json' or 'pretty'".to_string());
        }

        Ok(())
    }
}
