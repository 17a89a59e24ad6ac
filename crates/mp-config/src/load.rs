//! Configuration loading.

use crate::client::ClientConfig;
use crate::resolve::{resolve_config_path, ConfigSource};
use crate::validate::{validate_config, ValidationError};
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

/// Environment variable overriding the project token.
pub const ENV_TOKEN: &str = "MIXPANEL_TOKEN";
/// Environment variable overriding the API key.
pub const ENV_API_KEY: &str = "MIXPANEL_API_KEY";
/// Environment variable overriding the host.
pub const ENV_HOST: &str = "MIXPANEL_HOST";

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Invalid config file {path}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: ValidationError,
    },

    #[error("Semantic validation failed: {0}")]
    Validation(#[from] ValidationError),
}

/// Configuration resolution options, usually filled from CLI flags.
#[derive(Debug, Default, Clone)]
pub struct ConfigOptions {
    /// Explicit config file (highest priority).
    pub config_path: Option<PathBuf>,
    /// Explicit project token.
    pub token: Option<String>,
    /// Explicit API key.
    pub api_key: Option<String>,
    /// Explicit host.
    pub host: Option<String>,
}

/// Resolved configuration with provenance information.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The effective configuration.
    pub config: ClientConfig,
    /// File the configuration was read from, if any.
    pub path: Option<PathBuf>,
    /// Where the file was found.
    pub source: ConfigSource,
}

/// Load configuration with the standard resolution order.
///
/// Precedence (highest first):
/// 1. Explicit options
/// 2. Environment variables (MIXPANEL_TOKEN, MIXPANEL_API_KEY, MIXPANEL_HOST)
/// 3. Config file (see [`resolve_config_path`])
/// 4. Built-in defaults
pub fn load_config(options: &ConfigOptions) -> Result<ResolvedConfig, ConfigError> {
    let (path, source) = resolve_config_path(options.config_path.as_deref());

    let mut config = match &path {
        Some(path) => {
            if !path.exists() {
                return Err(ConfigError::NotFound { path: path.clone() });
            }
            ClientConfig::from_file(path).map_err(|source| ConfigError::Invalid {
                path: path.clone(),
                source,
            })?
        }
        None => ClientConfig::default(),
    };
    debug!(source = %source, path = ?path, "resolved config file");

    apply_env_overrides(&mut config);

    if let Some(token) = &options.token {
        config.token = Some(token.clone());
    }
    if let Some(key) = &options.api_key {
        config.api_key = Some(key.clone());
    }
    if let Some(host) = &options.host {
        config.host = host.clone();
    }

    validate_config(&config)?;

    Ok(ResolvedConfig {
        config,
        path,
        source,
    })
}

fn apply_env_overrides(config: &mut ClientConfig) {
    if let Some(token) = non_empty_env(ENV_TOKEN) {
        config.token = Some(token);
    }
    if let Some(key) = non_empty_env(ENV_API_KEY) {
        config.api_key = Some(key);
    }
    if let Some(host) = non_empty_env(ENV_HOST) {
        config.host = host;
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
