//! Response checking.
//!
//! In plain mode the service answers `1` on success and `0` otherwise. In
//! verbose mode it answers `{"status": 1, "error": null}`.

use crate::transport::TransportError;
use serde::Deserialize;
use thiserror::Error;

/// Longest response excerpt kept in an error message.
const MAX_BODY_EXCERPT: usize = 200;

/// Failure of a single API request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// The request never produced a usable response.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The service rejected the request.
    #[error("Mixpanel Server Error: {0}")]
    Server(String),

    /// A verbose response body was not the expected JSON.
    #[error("Could not parse response from Mixpanel: {0}")]
    UnparseableResponse(String),

    /// The worker thread sending the request panicked.
    #[error("request worker panicked")]
    WorkerPanicked,

    /// No worker thread could be started for the request.
    #[error("could not start request worker: {0}")]
    WorkerSpawn(String),
}

#[derive(Debug, Deserialize)]
struct VerboseResponse {
    #[serde(default)]
    status: i64,
    #[serde(default)]
    error: Option<String>,
}

/// Interpret a response body.
pub fn check_response(body: &str, verbose: bool) -> Result<(), RequestError> {
    let trimmed = body.trim();

    if verbose {
        let parsed: VerboseResponse = serde_json::from_str(trimmed)
            .map_err(|_| RequestError::UnparseableResponse(excerpt(trimmed)))?;
        if parsed.status != 1 {
            let reason = parsed
                .error
                .unwrap_or_else(|| format!("status {}", parsed.status));
            return Err(RequestError::Server(reason));
        }
        return Ok(());
    }

    if trimmed == "1" {
        Ok(())
    } else {
        Err(RequestError::Server(excerpt(trimmed)))
    }
}

fn excerpt(body: &str) -> String {
    if body.len() <= MAX_BODY_EXCERPT {
        return body.to_string();
    }
    let mut end = MAX_BODY_EXCERPT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
