//! Configuration validation errors and semantic validation.

use crate::client::ClientConfig;
use thiserror::Error;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::IoError(_) => 60,
            ValidationError::ParseError(_) => 61,
            ValidationError::InvalidValue { .. } => 65,
        }
    }
}

fn invalid(field: &str, message: impl Into<String>) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        message: message.into(),
    }
}

/// Validate a client configuration semantically.
pub fn validate_config(config: &ClientConfig) -> ValidationResult<()> {
    let host = config.host.trim();
    if host.is_empty() {
        return Err(invalid("host", "Must not be empty"));
    }
    if host.contains("://") {
        return Err(invalid(
            "host",
            format!("Must not include a scheme (use `protocol`), got {}", host),
        ));
    }
    if host.contains('/') || host.contains('?') {
        return Err(invalid(
            "host",
            format!("Must be a bare host name, got {}", host),
        ));
    }

    if config.timeout_secs == 0 {
        return Err(invalid("timeout_secs", "Must be greater than 0"));
    }

    if config.port == Some(0) {
        return Err(invalid("port", "Must be greater than 0"));
    }

    if let Some(token) = &config.token {
        if token.trim().is_empty() {
            return Err(invalid("token", "Must not be blank when set"));
        }
    }

    if config.import.max_batch_size == Some(0) {
        return Err(invalid("import.max_batch_size", "Must be greater than 0"));
    }
    if config.import.max_concurrent_requests == Some(0) {
        return Err(invalid(
            "import.max_concurrent_requests",
            "Must be greater than 0",
        ));
    }

    Ok(())
}
