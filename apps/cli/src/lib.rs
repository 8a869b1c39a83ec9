//! The `strongbox` command line: a thin shell over [`sbox_gateway::FileGateway`] for
//! operators and scripts.

pub mod args;
pub mod commands;

use anyhow::{Context, Result};
use sbox_gateway::domain::config::{AppConfig, LogConfig};
use sbox_logger::Logger;

/// Installs the global subscriber described by `[log]`.
///
/// # Errors
///
/// Fails on an unknown level name or when the subscriber cannot be installed.
pub fn init_logger(config: &LogConfig) -> Result<Logger> {
    let level = Logger::parse_level(&config.level)?;
    let builder = Logger::builder().name("strongbox").level(level).json(config.json);

    let logger = match &config.path {
        Some(dir) => builder.path(dir.clone()).init()?,
        None => builder.init()?,
    };
    Ok(logger)
}

/// Loads [`AppConfig`] from `path`, or from `strongbox.*` in the working directory.
///
/// # Errors
///
/// Fails when the file is missing or does not match the expected layout.
pub fn load(path: Option<&std::path::Path>) -> Result<AppConfig> {
    sbox_kernel::config::load_config(path).context("Configuration is malformed")
}
