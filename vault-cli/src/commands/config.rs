//! Config command - inspect the effective store configuration

use anyhow::Result;
use clap::{Parser, Subcommand};
use vault_store::StoreConfig;

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the effective configuration as TOML
    Show,
    /// Print the default config file location
    Path,
}

pub fn run_config(config: &StoreConfig, args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommand::Show => print!("{}", config.to_toml()?),
        ConfigCommand::Path => println!("{}", StoreConfig::config_path().display()),
    }
    Ok(())
}
