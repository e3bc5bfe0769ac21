//! vaultctl - command-line access to a local data vault
//!
//! Create, read, update, delete and list vault resources:
//! - data packets (`packets`)
//! - profiles (`profiles`)
//! - users (`users`)
//! - provider API keys (`api-keys`)
//!
//! Records are printed to stdout as pretty JSON.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use vault_store::kinds::{ApiKeys, DataPackets, Profiles, Users};
use vault_store::{StoreConfig, Vault};

mod commands;
mod tracing_setup;

use commands::config::ConfigArgs;
use commands::resource::ResourceArgs;

#[derive(Parser, Debug)]
#[command(
    name = "vaultctl",
    author,
    version,
    about = "Manage resources in a local data vault",
    long_about = "Idempotent create/update, tag filtering and paginated listing over the \
                  vault's SQLite store. Retries with the same request id never duplicate work."
)]
struct Cli {
    /// Database file (overrides config file and VAULT_DB_PATH)
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    /// Config file (default: <config dir>/vault/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Data packets: tagged JSON owned by a user profile
    Packets(ResourceArgs),
    /// Profiles under a user account
    Profiles(ResourceArgs),
    /// User accounts
    Users(ResourceArgs),
    /// Provider API keys, one per provider and user
    ApiKeys(ResourceArgs),
    /// Show the effective configuration
    Config(ConfigArgs),
}

fn load_config(cli: &Cli) -> Result<StoreConfig> {
    let mut config = match &cli.config {
        Some(path) => StoreConfig::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => StoreConfig::load().context("Failed to load config")?,
    };
    if let Some(db) = &cli.db {
        config.database_path = db.clone();
    }
    Ok(config)
}

fn open_vault(config: StoreConfig) -> Result<Vault> {
    let path = config.database_path.clone();
    Vault::open(config).with_context(|| format!("Failed to open vault at {}", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_setup::init(&tracing_setup::TracingConfig { debug: cli.debug }).ok();

    let config = load_config(&cli)?;
    match cli.command {
        Commands::Packets(args) => commands::run_resource::<DataPackets>(&open_vault(config)?, args)?,
        Commands::Profiles(args) => commands::run_resource::<Profiles>(&open_vault(config)?, args)?,
        Commands::Users(args) => commands::run_resource::<Users>(&open_vault(config)?, args)?,
        Commands::ApiKeys(args) => commands::run_resource::<ApiKeys>(&open_vault(config)?, args)?,
        Commands::Config(args) => commands::run_config(&config, args)?,
    }

    Ok(())
}
