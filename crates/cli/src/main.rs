use clap::{Parser, Subcommand};

mod commands;
use commands::{
    handle_cache_command, handle_config_command, handle_read_command, CacheCommands,
    ConfigCommands, ReadArgs,
};

#[derive(Parser)]
#[command(name = "miniread-cli")]
#[command(about = "miniread CLI - configuration, cache inspection and ad-hoc contract reads")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configuration Management
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Cache keys and entries
    #[command(subcommand)]
    Cache(CacheCommands),

    /// Read a contract through a running server
    Read(ReadArgs),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Config(config_command) => handle_config_command(config_command)?,
        Commands::Cache(cache_command) => handle_cache_command(cache_command).await?,
        Commands::Read(args) => handle_read_command(args).await?,
    }

    Ok(())
}
