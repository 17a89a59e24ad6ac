//! Request delivery.
//!
//! [`Transport`] is the seam between the client and the network. The client
//! builds an [`ApiRequest`], the transport delivers it and hands back the raw
//! response body, and the client decides whether the body means success.

use crate::request::ApiRequest;
use mp_config::ClientConfig;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use tracing::trace;

/// Failure to obtain a response body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Connection, DNS, TLS or timeout failure.
    #[error("network error: {0}")]
    Network(String),

    /// The service answered with a non-success HTTP status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be read.
    #[error("failed to read response body: {0}")]
    Body(String),
}

/// Delivers API requests.
pub trait Transport: Send + Sync {
    /// Send one request and return the response body.
    fn send(&self, request: &ApiRequest) -> Result<String, TransportError>;
}

/// Blocking HTTP transport backed by a shared `ureq` agent.
pub struct HttpTransport {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("mixpanel-import/", env!("CARGO_PKG_VERSION")))
            .build();
        HttpTransport {
            agent,
            base_url: config.base_url(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &ApiRequest) -> Result<String, TransportError> {
        let url = format!("{}{}", self.base_url, request.endpoint.path());
        let mut call = self.agent.get(&url);
        for (key, value) in request.query_pairs() {
            call = call.query(key, &value);
        }
        trace!(url = %url, events = request.event_count(), "http get");

        match call.call() {
            Ok(response) => response
                .into_string()
                .map_err(|e| TransportError::Body(e.to_string())),
            Err(ureq::Error::Status(status, response)) => Err(TransportError::Status {
                status,
                body: response.into_string().unwrap_or_default(),
            }),
            Err(ureq::Error::Transport(err)) => Err(TransportError::Network(err.to_string())),
        }
    }
}

type Responder = dyn Fn(&ApiRequest) -> Result<String, TransportError> + Send + Sync;

/// In-memory transport that records requests instead of sending them.
///
/// Used by `--dry-run` and by tests. Replies `1` unless given another
/// responder; an optional delay keeps requests in flight long enough to
/// observe concurrency.
pub struct RecordingTransport {
    requests: Mutex<Vec<ApiRequest>>,
    responder: Box<Responder>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl RecordingTransport {
    /// Transport that accepts every request.
    pub fn new() -> Self {
        Self::replying("1")
    }

    /// Transport that answers every request with `body`.
    pub fn replying(body: impl Into<String>) -> Self {
        let body = body.into();
        Self::with_responder(move |_| Ok(body.clone()))
    }

    /// Transport whose answer depends on the request.
    pub fn with_responder<F>(responder: F) -> Self
    where
        F: Fn(&ApiRequest) -> Result<String, TransportError> + Send + Sync + 'static,
    {
        RecordingTransport {
            requests: Mutex::new(Vec::new()),
            responder: Box::new(responder),
            delay: None,
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Hold each request for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Requests received so far, in arrival order.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Highest number of requests that were in flight at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Default for RecordingTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RecordingTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingTransport")
            .field("requests", &self.request_count())
            .field("delay", &self.delay)
            .finish()
    }
}

impl Transport for RecordingTransport {
    fn send(&self, request: &ApiRequest) -> Result<String, TransportError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request.clone());

        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        let reply = (self.responder)(request);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Endpoint;
    use serde_json::json;

    fn track_request() -> ApiRequest {
        ApiRequest {
            endpoint: Endpoint::Track,
            data: json!({"event": "test"}),
            api_key: None,
            verbose: false,
            test: false,
        }
    }

    #[test]
    fn test_recording_transport_records_and_replies() {
        let transport = RecordingTransport::new();
        assert_eq!(transport.send(&track_request()).unwrap(), "1");
        assert_eq!(transport.request_count(), 1);
        assert_eq!(transport.requests()[0].endpoint, Endpoint::Track);
        assert_eq!(transport.max_in_flight(), 1);
    }

    #[test]
    fn test_recording_transport_responder() {
        let transport = RecordingTransport::with_responder(|req| {
            if req.endpoint == Endpoint::Import {
                Err(TransportError::Network("refused".into()))
            } else {
                Ok("0".into())
            }
        });
        assert_eq!(transport.send(&track_request()).unwrap(), "0");

        let mut import = track_request();
        import.endpoint = Endpoint::Import;
        assert!(matches!(
            transport.send(&import),
            Err(TransportError::Network(_))
        ));
    }

    #[test]
    fn test_http_transport_base_url() {
        let config = ClientConfig::default();
        let transport = HttpTransport::new(&config);
        assert_eq!(transport.base_url(), "https://api.mixpanel.com");
    }

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::Status {
            status: 503,
            body: "unavailable".into(),
        };
        assert_eq!(err.to_string(), "HTTP 503: unavailable");
    }
}
