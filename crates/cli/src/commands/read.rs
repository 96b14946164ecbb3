use alloy_primitives::Address;
use clap::Args;
use miniread_core::{
    client::{ContractReadClient, ContractReadQuery, DEFAULT_STALE_TIME},
    contract::AbiFragment,
    upstream::HttpClient,
};
use serde_json::Value;
use std::{sync::Arc, time::Duration};

use super::utils::{parse_json_arg, CliError, CliResult};

#[derive(Args)]
pub struct ReadArgs {
    /// Base URL of a running server
    #[arg(long, env = "MINIREAD_SERVER", default_value = "http://127.0.0.1:3000")]
    pub server: String,

    #[arg(long)]
    pub chain_id: u64,

    #[arg(long)]
    pub address: Address,

    /// Function to call
    #[arg(long)]
    pub function: String,

    /// JSON ABI array, or @file
    #[arg(long)]
    pub abi: String,

    /// JSON array of arguments, or @file
    #[arg(long, default_value = "[]")]
    pub args: String,

    /// Cache lifetime in seconds for the server-side entry
    #[arg(long)]
    pub ttl: Option<u64>,

    /// Request timeout in seconds
    #[arg(long, default_value = "30")]
    pub timeout: u64,
}

fn build_query(args: &ReadArgs) -> CliResult<ContractReadQuery> {
    let abi: Vec<AbiFragment> = match parse_json_arg(&args.abi)? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(fragment) => Ok(fragment),
                other => Err(CliError::InvalidInput(format!("ABI entries must be objects, got {other}"))),
            })
            .collect::<CliResult<_>>()?,
        other => return Err(CliError::InvalidInput(format!("--abi must be a JSON array, got {other}"))),
    };
    let call_args = match parse_json_arg(&args.args)? {
        Value::Array(items) => items,
        other => return Err(CliError::InvalidInput(format!("--args must be a JSON array, got {other}"))),
    };

    let mut query =
        ContractReadQuery::new(args.chain_id, args.address, abi, args.function.clone()).with_args(call_args);
    if let Some(ttl) = args.ttl {
        query = query.with_ttl(ttl);
    }
    Ok(query)
}

pub async fn handle_read_command(args: ReadArgs) -> CliResult<()> {
    let query = build_query(&args)?;
    let http = HttpClient::new().map_err(|e| CliError::Request(e.to_string()))?;
    let client = ContractReadClient::new(
        Arc::new(http),
        &args.server,
        DEFAULT_STALE_TIME,
        Duration::from_secs(args.timeout),
    );

    let result = client.read(&query).await?.unwrap_or(Value::Null);
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
