//! Configuration loading
//!
//! Embedded defaults, then optional files, then `XDIAG_*` environment
//! variables.

use super::AppConfig;
use anyhow::{Context, Result};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};

/// Embedded default configuration (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../../config/default.toml");

fn with_defaults() -> ConfigBuilder<DefaultState> {
    Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
}

// prefix_separator("_") so XDIAG_API__BASE_URL matches, not XDIAG__API__BASE_URL
fn environment() -> Environment {
    Environment::with_prefix("XDIAG")
        .prefix_separator("_")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("diagnostics.key_accounts")
        .try_parsing(true)
}

/// Load configuration from files and environment
pub fn load_config() -> Result<AppConfig> {
    let config = with_defaults()
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name("config/local").required(false))
        .add_source(environment())
        .build()
        .context("Failed to build configuration")?;

    config
        .try_deserialize()
        .context("Failed to deserialize configuration")
}
