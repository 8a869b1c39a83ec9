use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::info;

/// Prefix of environment variables that override file settings.
pub const ENV_PREFIX: &str = "SBOX";
const DEFAULT_CONFIG: &str = "strongbox";

/// Custom error type for config loading.
#[sbox_derive::sbox_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// A reusable configuration loader that combines file-based settings with environment overrides.
///
/// This function implements a layered configuration strategy:
/// 1. **Base File**: Loads settings from a file (e.g., `strongbox.toml`). If no path is provided,
///    it defaults to `"strongbox"` in the current working directory, any supported extension.
/// 2. **Environment Overrides**: Overlays values from environment variables prefixed with `SBOX__`.
///    Nested structures are accessed using double underscores (e.g., `SBOX__STORAGE__KEY` maps
///    to `storage.key`).
///
/// # Errors
/// This function will return an error if:
/// * The specified (or default) configuration file cannot be found.
/// * The content of the file does not match the structure of type `T`.
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    load_layered(path, Environment::with_prefix(ENV_PREFIX))
}

/// Same as [`load_config`] but with an explicit environment source.
///
/// # Errors
/// See [`load_config`].
pub fn load_layered<T>(
    path: Option<impl AsRef<Path>>,
    environment: Environment,
) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let effective_path =
        path.map_or_else(|| PathBuf::from(DEFAULT_CONFIG), |p| p.as_ref().to_path_buf());

    let builder = Config::builder()
        .add_source(File::from(effective_path.as_path()).required(true))
        .add_source(environment.separator("__").convert_case(config::Case::Snake));

    info!("Loading config from {}", effective_path.display());

    let config = builder
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")?;

    Ok(config)
}
