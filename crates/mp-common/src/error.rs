//! Error types for Mixpanel import.
//!
//! Errors carry a stable code and a category so the CLI can map them to exit
//! codes and emit structured JSON:
//! ```json
//! {
//!   "code": 10,
//!   "category": "input",
//!   "message": "import methods require you to specify the time of the event: 'signup' at index 2",
//!   "context": { "event": "signup", "index": 2 }
//! }
//! ```
//!
//! Per-request failures during a batch import are not represented here: they
//! are collected into the batch report instead of being raised.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for Mixpanel import operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Caller-supplied events are malformed.
    Input,
    /// Client configuration is incomplete or invalid.
    Config,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Input => write!(f, "input"),
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

fn at_index(index: &Option<usize>) -> String {
    match index {
        Some(i) => format!(" at index {}", i),
        None => String::new(),
    }
}

/// Unified error type for Mixpanel import.
#[derive(Error, Debug)]
pub enum Error {
    // Input errors (10-19)
    #[error("import methods require you to specify the time of the event: '{event}'{}", at_index(.index))]
    MissingTime { event: String, index: Option<usize> },

    #[error("invalid event time {value} for '{event}'{}", at_index(.index))]
    InvalidTime {
        event: String,
        index: Option<usize>,
        value: String,
    },

    #[error("invalid event: {0}")]
    InvalidEvent(String),

    // Configuration errors (20-29)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("the client needs a project token: `Mixpanel::init(token, config)`")]
    MissingToken,

    #[error("the client needs an api key when importing old events: set `api_key` in the config")]
    MissingApiKey,

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the stable error code for this error.
    ///
    /// - 10-19: input errors
    /// - 20-29: configuration errors
    /// - 60-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::MissingTime { .. } => 10,
            Error::InvalidTime { .. } => 11,
            Error::InvalidEvent(_) => 12,
            Error::Config(_) => 20,
            Error::MissingToken => 21,
            Error::MissingApiKey => 22,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::MissingTime { .. } | Error::InvalidTime { .. } | Error::InvalidEvent(_) => {
                ErrorCategory::Input
            }
            Error::Config(_) | Error::MissingToken | Error::MissingApiKey => ErrorCategory::Config,
            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::MissingTime { .. } => "Missing Event Time",
            Error::InvalidTime { .. } => "Invalid Event Time",
            Error::InvalidEvent(_) => "Invalid Event",
            Error::Config(_) => "Configuration Error",
            Error::MissingToken => "Missing Project Token",
            Error::MissingApiKey => "Missing API Key",
            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Parse Error",
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::MissingTime { .. } => {
                "Every imported event needs a `time` property (Unix seconds or an RFC 3339 date-time)."
            }
            Error::InvalidTime { .. } => {
                "Use Unix seconds (e.g. 1700000000) or an RFC 3339 date-time (e.g. 2024-01-01T00:00:00Z)."
            }
            Error::InvalidEvent(_) => "Each event needs a non-empty `event` name.",
            Error::Config(_) => "Run 'mp-import config show' to inspect the resolved configuration.",
            Error::MissingToken => "Pass --token or set MIXPANEL_TOKEN.",
            Error::MissingApiKey => "Pass --api-key or set MIXPANEL_API_KEY.",
            Error::Io(_) => "Check that the input file exists and is readable.",
            Error::Json(_) => "Input must be a JSON array of events or one JSON event per line.",
        }
    }
}

/// Structured error response for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Additional structured context (e.g., event name, index).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::MissingTime { event, index } => {
                context.insert("event".to_string(), serde_json::json!(event));
                if let Some(index) = index {
                    context.insert("index".to_string(), serde_json::json!(index));
                }
            }
            Error::InvalidTime {
                event,
                index,
                value,
            } => {
                context.insert("event".to_string(), serde_json::json!(event));
                context.insert("value".to_string(), serde_json::json!(value));
                if let Some(index) = index {
                    context.insert("index".to_string(), serde_json::json!(index));
                }
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            context,
        }
    }
}

impl StructuredError {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }
}
