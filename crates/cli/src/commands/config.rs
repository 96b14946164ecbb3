use clap::Subcommand;
use miniread_core::{chain::SupportedChain, config::AppConfig};
use std::path::Path;

use super::utils::{print_error, print_info, print_success, CliError, CliResult};

pub const SAMPLE_CONFIG: &str = r#"# miniread configuration
# Every value can be overridden with MINIREAD__SECTION__FIELD, e.g. MINIREAD__CACHE__REDIS_URL.

[server]
bind_address = "127.0.0.1"
bind_port = 3000
max_concurrent_requests = 100
request_timeout_seconds = 30
max_body_bytes = 1048576

[cache]
# redis, memory or disabled
backend = "redis"
redis_url = "redis://127.0.0.1:6379"
connect_timeout_ms = 2000
command_timeout_ms = 1000
# Only used by the memory backend
memory_max_entries = 100000

[chains]
rpc_timeout_seconds = 10
max_concurrent_upstream_requests = 256

# Chains without an entry use their public RPC endpoint.
[[chains.endpoints]]
chain_id = 1
rpc_url = "https://eth-mainnet.g.alchemy.com/v2/YOUR_API_KEY"

[profile]
api_base_url = "https://api.neynar.com"
api_key = "YOUR_NEYNAR_API_KEY"
timeout_seconds = 10

[logging]
level = "info"
format = "pretty"
"#;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Validate a configuration file
    Validate {
        /// Path to config file
        #[arg(short, long, default_value = "config/config.toml")]
        file: String,
    },

    /// Show the effective configuration (file plus environment overrides)
    Show {
        /// Path to config file
        #[arg(short, long, default_value = "config/config.toml")]
        file: String,

        /// Show sensitive values (API keys, Redis URL)
        #[arg(long)]
        show_sensitive: bool,
    },

    /// Generate a sample configuration file
    Generate {
        /// Output path for the config file
        #[arg(short, long, default_value = "config/config.toml")]
        output: String,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

pub fn handle_config_command(command: ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Validate { file } => validate_config(&file),
        ConfigCommands::Show { file, show_sensitive } => show_config(&file, show_sensitive),
        ConfigCommands::Generate { output, force } => generate_config(&output, force),
    }
}

fn validate_config(file: &str) -> CliResult<()> {
    if !Path::new(file).exists() {
        print_error(&format!("Configuration file not found: {file}"));
        return Err(CliError::Config(format!("File not found: {file}")));
    }

    print_info(&format!("Loading configuration from {file}..."));
    let config = AppConfig::from_file(file).map_err(|e| CliError::Config(e.to_string()))?;

    print_info("Validating configuration...");
    config.validate().map_err(CliError::Config)?;

    print_success("Configuration is valid!");

    println!("Configuration Summary:");
    println!("  Server: {}:{}", config.server.bind_address, config.server.bind_port);
    println!("  Cache: {}", config.cache.backend.as_str());
    println!("  Endpoint overrides: {}", config.chains.endpoints.len());
    println!(
        "  Profiles: {}",
        if config.profile.api_key().is_some() { "enabled" } else { "disabled (no API key)" }
    );

    Ok(())
}

fn mask(value: Option<&str>, show_sensitive: bool) -> String {
    match value {
        None => "(not set)".to_string(),
        Some(v) if show_sensitive => v.to_string(),
        Some(_) => "[hidden - use --show-sensitive to reveal]".to_string(),
    }
}

fn show_config(file: &str, show_sensitive: bool) -> CliResult<()> {
    let config = AppConfig::from_file(file).map_err(|e| CliError::Config(e.to_string()))?;

    println!("Configuration from {file}:");

    println!("\n[Server]");
    println!("  Bind Address: {}", config.server.bind_address);
    println!("  Bind Port: {}", config.server.bind_port);
    println!("  Max Concurrent Requests: {}", config.server.max_concurrent_requests);
    println!("  Request Timeout: {}s", config.server.request_timeout_seconds);
    println!("  Max Body: {} bytes", config.server.max_body_bytes);

    println!("\n[Cache]");
    println!("  Backend: {}", config.cache.backend.as_str());
    println!("  Redis URL: {}", mask(config.cache.redis_url.as_deref(), show_sensitive));
    println!("  Connect Timeout: {}ms", config.cache.connect_timeout_ms);
    println!("  Command Timeout: {}ms", config.cache.command_timeout_ms);
    println!("  Memory Max Entries: {}", config.cache.memory_max_entries);

    println!("\n[Chains]");
    println!("  RPC Timeout: {}s", config.chains.rpc_timeout_seconds);
    for chain in SupportedChain::ALL {
        let url = config.chains.endpoint_for(chain.id()).unwrap_or(chain.default_rpc_url());
        println!("  {} ({}): {}", chain.name(), chain.id(), url);
    }

    println!("\n[Profile]");
    println!("  API Base URL: {}", config.profile.api_base_url);
    println!("  API Key: {}", mask(config.profile.api_key(), show_sensitive));
    println!("  Timeout: {}s", config.profile.timeout_seconds);

    println!("\n[Logging]");
    println!("  Level: {}", config.logging.level);
    println!("  Format: {}", config.logging.format);

    Ok(())
}

fn generate_config(output: &str, force: bool) -> CliResult<()> {
    if Path::new(output).exists() && !force {
        return Err(CliError::Config(format!(
            "File {output} already exists. Use --force to overwrite."
        )));
    }

    if let Some(parent) = Path::new(output).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(output, SAMPLE_CONFIG)?;

    print_success(&format!("Sample configuration generated: {output}"));
    print_info("Remember to:");
    print_info("  1. Replace the YOUR_API_KEY placeholders or remove the entries");
    print_info("  2. Point cache.redis_url at your Redis, or set cache.backend = \"memory\"");

    Ok(())
}
