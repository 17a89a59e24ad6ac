//! Mixpanel import configuration loading and validation.
//!
//! This crate provides:
//! - Typed client configuration read from `config.toml`
//! - Config resolution (CLI → env → XDG → system → defaults)
//! - Environment overrides for credentials and host
//! - Semantic validation

pub mod client;
pub mod load;
pub mod resolve;
pub mod validate;

pub use client::{ClientConfig, ImportDefaults, Protocol};
pub use load::{load_config, ConfigError, ConfigOptions, ResolvedConfig};
pub use resolve::{resolve_config_path, ConfigSource};
pub use validate::{validate_config, ValidationError, ValidationResult};

/// Default tracking service host.
pub const DEFAULT_HOST: &str = "api.mixpanel.com";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
