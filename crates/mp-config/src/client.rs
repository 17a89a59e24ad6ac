//! Client configuration types.
//!
//! Layout of `config.toml`:
//! ```toml
//! token = "project-token"
//! api_key = "secret"
//! host = "api.mixpanel.com"
//! protocol = "https"
//! verbose = false
//! timeout_secs = 10
//!
//! [import]
//! max_batch_size = 50
//! max_concurrent_requests = 4
//! ```

use crate::validate::{ValidationError, ValidationResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// URL scheme used to reach the tracking service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    #[default]
    Https,
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Http => write!(f, "http"),
            Protocol::Https => write!(f, "https"),
        }
    }
}

impl std::str::FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "http" => Ok(Protocol::Http),
            "https" => Ok(Protocol::Https),
            _ => Err(format!("unknown protocol: {}", s)),
        }
    }
}

/// Defaults applied to `import_batch` when the caller passes no options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportDefaults {
    /// Events per request (capped at the service limit).
    pub max_batch_size: Option<usize>,

    /// Requests in flight at once; the built-in cap when unset.
    pub max_concurrent_requests: Option<usize>,
}

/// Configuration of a tracking client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Project token stamped onto every event.
    pub token: Option<String>,

    /// API key required by the import endpoint.
    pub api_key: Option<String>,

    /// Tracking service host, without scheme.
    pub host: String,

    /// URL scheme.
    pub protocol: Protocol,

    /// Explicit port; the scheme default when unset.
    pub port: Option<u16>,

    /// Ask the service for a JSON status body instead of `1`/`0`.
    pub verbose: bool,

    /// Send requests in test mode.
    pub test: bool,

    /// Log request payloads at debug level.
    pub debug: bool,

    /// Per-request timeout.
    pub timeout_secs: u64,

    /// Batch import defaults.
    pub import: ImportDefaults,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            token: None,
            api_key: None,
            host: crate::DEFAULT_HOST.to_string(),
            protocol: Protocol::Https,
            port: None,
            verbose: false,
            test: false,
            debug: false,
            timeout_secs: crate::DEFAULT_TIMEOUT_SECS,
            import: ImportDefaults::default(),
        }
    }
}

impl ClientConfig {
    /// Load config from a TOML file.
    pub fn from_file(path: &Path) -> ValidationResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ValidationError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        Self::from_toml_str(&content)
    }

    /// Parse config from a TOML string.
    pub fn from_toml_str(content: &str) -> ValidationResult<Self> {
        toml::from_str(content)
            .map_err(|e| ValidationError::ParseError(format!("Invalid TOML: {}", e)))
    }

    /// Base URL of the tracking service, e.g. `https://api.mixpanel.com`.
    pub fn base_url(&self) -> String {
        match self.port {
            Some(port) => format!("{}://{}:{}", self.protocol, self.host, port),
            None => format!("{}://{}", self.protocol, self.host),
        }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Point the client at another host and scheme.
    pub fn with_endpoint(mut self, protocol: Protocol, host: impl Into<String>, port: Option<u16>) -> Self {
        self.protocol = protocol;
        self.host = host.into();
        self.port = port;
        self
    }

    /// Enable verbose responses.
    pub fn with_verbose(mut self, enabled: bool) -> Self {
        self.verbose = enabled;
        self
    }

    /// A copy safe to print: credentials masked.
    pub fn redacted(&self) -> ClientConfig {
        let mut copy = self.clone();
        copy.api_key = copy.api_key.as_deref().map(mask_secret);
        copy
    }
}

/// Keep the last four characters of a secret.
fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 4 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{}", tail)
}
