//! Command implementations for vaultctl

pub mod config;
pub mod resource;

pub use config::run_config;
pub use resource::run_resource;
