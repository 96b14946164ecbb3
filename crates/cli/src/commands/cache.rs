use alloy_primitives::Address;
use clap::Subcommand;
use miniread_core::{
    cache::{CacheKey, CacheStore},
    config::AppConfig,
    contract::contract_cache_key,
    profile::profile_cache_key,
};
use serde_json::Value;

use super::utils::{parse_json_arg, print_info, print_success, CliError, CliResult};

#[derive(Subcommand)]
pub enum CacheCommands {
    /// Print the cache key a read would use
    #[command(subcommand)]
    Key(KeyCommands),

    /// Print the raw cached value under a key
    Get {
        key: String,

        /// Path to config file
        #[arg(short, long, default_value = "config/config.toml")]
        file: String,
    },

    /// Delete the entry under a key
    Invalidate {
        key: String,

        /// Path to config file
        #[arg(short, long, default_value = "config/config.toml")]
        file: String,
    },
}

#[derive(Subcommand)]
pub enum KeyCommands {
    /// Key of a contract read
    Contract {
        #[arg(long)]
        chain_id: u64,

        #[arg(long)]
        address: Address,

        #[arg(long)]
        function: String,

        /// JSON array of arguments, or @file
        #[arg(long, default_value = "[]")]
        args: String,
    },

    /// Key of a profile lookup
    Profile {
        #[arg(long)]
        fid: u64,
    },
}

pub async fn handle_cache_command(command: CacheCommands) -> CliResult<()> {
    match command {
        CacheCommands::Key(key) => {
            println!("{}", derive_key(key)?);
            Ok(())
        }
        CacheCommands::Get { key, file } => {
            let store = connect(&file).await?;
            match store.get_raw(&CacheKey::from_raw(key.clone())).await {
                Some(raw) => {
                    let pretty = serde_json::from_str::<Value>(&raw)
                        .and_then(|v| serde_json::to_string_pretty(&v))
                        .unwrap_or(raw);
                    println!("{pretty}");
                }
                None => print_info(&format!("No entry under {key}")),
            }
            Ok(())
        }
        CacheCommands::Invalidate { key, file } => {
            let store = connect(&file).await?;
            store.delete(&CacheKey::from_raw(key.clone())).await;
            if store.stats().snapshot().store_errors > 0 {
                return Err(CliError::Cache(format!("could not delete {key}")));
            }
            print_success(&format!("Invalidated {key}"));
            Ok(())
        }
    }
}

fn derive_key(command: KeyCommands) -> CliResult<CacheKey> {
    match command {
        KeyCommands::Contract { chain_id, address, function, args } => {
            let args = match parse_json_arg(&args)? {
                Value::Array(items) => items,
                other => {
                    return Err(CliError::InvalidInput(format!(
                        "--args must be a JSON array, got {other}"
                    )))
                }
            };
            Ok(contract_cache_key(chain_id, address, &function, &args))
        }
        KeyCommands::Profile { fid } => Ok(profile_cache_key(fid)),
    }
}

async fn connect(file: &str) -> CliResult<CacheStore> {
    let config = AppConfig::from_file(file).map_err(|e| CliError::Config(e.to_string()))?;
    let store = CacheStore::connect(&config.cache).await;
    if !store.is_enabled() {
        return Err(CliError::Cache(format!(
            "{} cache backend is not reachable",
            config.cache.backend.as_str()
        )));
    }
    if store.backend_name() == "memory" {
        print_info("The memory backend is local to this process; nothing is shared with the server");
    }
    Ok(store)
}
