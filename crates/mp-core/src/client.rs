//! Tracking client.
//!
//! ```ignore
//! use mp_core::{ImportOptions, Mixpanel};
//! use mp_config::ClientConfig;
//!
//! let client = Mixpanel::init("token", ClientConfig::default().with_api_key("key"))?;
//! client.import("signup", 1_700_000_000, Properties::new())?;
//!
//! let report = client.import_batch(events, &ImportOptions::default())?;
//! for failure in &report.errors {
//!     eprintln!("batch {} failed: {}", failure.batch_index, failure.error);
//! }
//! ```

use crate::batch::{dispatch, BatchPlan, BatchReport, ImportOptions};
use crate::request::{ApiRequest, Endpoint};
use crate::response::{check_response, RequestError};
use crate::transport::{HttpTransport, Transport};
use mp_common::event::{TIME_PROPERTY, TOKEN_PROPERTY};
use mp_common::{Error, Event, EventTime, Properties, Result, LIB_NAME};
use mp_config::ClientConfig;
use serde_json::{json, Value};
use std::sync::Arc;
use std::thread::JoinHandle;
use thiserror::Error;
use tracing::{debug, info};

/// Failure of a single-event call.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The call was rejected before anything was sent.
    #[error(transparent)]
    Invalid(#[from] Error),

    /// The request was sent and failed.
    #[error(transparent)]
    Request(#[from] RequestError),
}

/// Client for the tracking service, bound to one project token.
///
/// Cloning is cheap; clones share the transport.
#[derive(Clone)]
pub struct Mixpanel {
    token: String,
    config: ClientConfig,
    transport: Arc<dyn Transport>,
}

impl Mixpanel {
    /// Create a client that talks HTTP to the configured host.
    pub fn init(token: impl Into<String>, config: ClientConfig) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new(&config));
        Self::with_transport(token, config, transport)
    }

    /// Create a client using the token stored in `config`.
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        let token = config.token.clone().ok_or(Error::MissingToken)?;
        Self::init(token, config)
    }

    /// Create a client with an explicit transport.
    pub fn with_transport(
        token: impl Into<String>,
        config: ClientConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(Error::MissingToken);
        }
        Ok(Mixpanel {
            token,
            config,
            transport,
        })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn api_key(&self) -> Result<&str> {
        self.config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(Error::MissingApiKey)
    }

    fn request(&self, endpoint: Endpoint, data: Value, api_key: Option<String>) -> ApiRequest {
        ApiRequest {
            endpoint,
            data,
            api_key,
            verbose: self.config.verbose,
            test: self.config.test,
        }
    }

    /// Build a request for `endpoint`, attaching the API key where required.
    pub fn build_request(&self, endpoint: Endpoint, data: Value) -> Result<ApiRequest> {
        let api_key = if endpoint.requires_api_key() {
            Some(self.api_key()?.to_string())
        } else {
            None
        };
        Ok(self.request(endpoint, data, api_key))
    }

    /// Send a built request and check the response.
    pub fn deliver(&self, request: &ApiRequest) -> std::result::Result<(), RequestError> {
        if self.config.debug {
            debug!(endpoint = %request.endpoint, payload = %request.data, "sending request");
        } else {
            debug!(endpoint = %request.endpoint, events = request.event_count(), "sending request");
        }
        let body = self.transport.send(request)?;
        check_response(&body, self.config.verbose)
    }

    /// Build and send a request in one step.
    pub fn send_request(
        &self,
        endpoint: Endpoint,
        data: Value,
    ) -> std::result::Result<(), ClientError> {
        let request = self.build_request(endpoint, data)?;
        Ok(self.deliver(&request)?)
    }

    /// Track a live event.
    pub fn track(
        &self,
        event: &str,
        mut properties: Properties,
    ) -> std::result::Result<(), RequestError> {
        properties.insert(TOKEN_PROPERTY.to_string(), Value::from(self.token.as_str()));
        properties.insert("mp_lib".to_string(), Value::from(LIB_NAME));
        let data = json!({ "event": event, "properties": properties });
        self.deliver(&self.request(Endpoint::Track, data, None))
    }

    /// Track an event that happened at `time`.
    pub fn import(
        &self,
        event: &str,
        time: impl Into<EventTime>,
        mut properties: Properties,
    ) -> std::result::Result<(), RequestError> {
        properties.insert(TIME_PROPERTY.to_string(), time.into().to_value());
        self.track(event, properties)
    }

    /// Import an event whose time is carried in its `time` property.
    pub fn import_event(&self, event: Event) -> std::result::Result<(), ClientError> {
        event.validate_name(None)?;
        let time = event.import_time(None)?;
        Ok(self.import(&event.event, time, event.properties)?)
    }

    /// Validate events and normalize them for the import endpoint.
    ///
    /// Fails on the first event without a usable name or time; `time` is
    /// rewritten to whole seconds and the project token is added.
    pub fn prepare_batch(&self, events: Vec<Event>) -> Result<Vec<Event>> {
        events
            .into_iter()
            .enumerate()
            .map(|(index, mut event)| {
                event.validate_name(Some(index))?;
                let time = event.import_time(Some(index))?;
                event
                    .properties
                    .insert(TIME_PROPERTY.to_string(), time.to_value());
                event
                    .properties
                    .insert(TOKEN_PROPERTY.to_string(), Value::from(self.token.as_str()));
                Ok(event)
            })
            .collect()
    }

    /// The plan `import_batch` would follow for `event_count` events.
    pub fn plan_batch(&self, event_count: usize, options: &ImportOptions) -> BatchPlan {
        BatchPlan::new(event_count, &options.or_defaults(&self.config.import))
    }

    fn prepare_import(
        &self,
        events: Vec<Event>,
        options: &ImportOptions,
    ) -> Result<(Vec<Event>, BatchPlan, Option<String>)> {
        let events = self.prepare_batch(events)?;
        let api_key = if events.is_empty() {
            None
        } else {
            Some(self.api_key()?.to_string())
        };
        let plan = self.plan_batch(events.len(), options);
        Ok((events, plan, api_key))
    }

    fn run_batches(&self, plan: BatchPlan, events: &[Event], api_key: Option<String>) -> BatchReport {
        info!(
            events = plan.total_events,
            requests = plan.request_count,
            batch_size = plan.batch_size,
            concurrency = ?plan.concurrency,
            "starting batch import"
        );

        let errors = dispatch(&plan, events, |_, chunk| {
            let data = Value::Array(
                chunk
                    .iter()
                    .map(|event| json!({ "event": event.event, "properties": event.properties }))
                    .collect(),
            );
            self.deliver(&self.request(Endpoint::Import, data, api_key.clone()))
        });

        let report = BatchReport {
            plan,
            requests: plan.request_count,
            events: plan.total_events,
            errors,
        };
        info!(
            requests = report.requests,
            failed_requests = report.errors.len(),
            failed_events = report.failed_events(),
            "batch import finished"
        );
        report
    }

    /// Import historical events in service-sized batches.
    ///
    /// Validation problems are returned as `Err` before any request is sent.
    /// Request failures are not errors: they are listed in the report, which
    /// is returned once every request has finished.
    pub fn import_batch(&self, events: Vec<Event>, options: &ImportOptions) -> Result<BatchReport> {
        let (events, plan, api_key) = self.prepare_import(events, options)?;
        Ok(self.run_batches(plan, &events, api_key))
    }

    /// Like [`import_batch`](Self::import_batch), but sends from a worker
    /// thread and hands the report to `callback` when done.
    ///
    /// Validation still happens on the calling thread. The handle may be
    /// dropped if the caller does not need to wait.
    pub fn import_batch_background<F>(
        &self,
        events: Vec<Event>,
        options: ImportOptions,
        callback: F,
    ) -> Result<JoinHandle<()>>
    where
        F: FnOnce(BatchReport) + Send + 'static,
    {
        let (events, plan, api_key) = self.prepare_import(events, &options)?;
        let client = self.clone();
        let handle = std::thread::Builder::new()
            .name("mp-import-batch".to_string())
            .spawn(move || {
                let report = client.run_batches(plan, &events, api_key);
                callback(report);
            })?;
        Ok(handle)
    }
}

impl std::fmt::Debug for Mixpanel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mixpanel")
            .field("token", &self.token)
            .field("config", &self.config.redacted())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::RecordingTransport;

    fn client_with(transport: Arc<RecordingTransport>) -> Mixpanel {
        let config = ClientConfig::default().with_api_key("key");
        Mixpanel::with_transport("token", config, transport).unwrap()
    }

    #[test]
    fn test_blank_token_rejected() {
        let transport = Arc::new(RecordingTransport::new());
        let err = Mixpanel::with_transport("  ", ClientConfig::default(), transport).unwrap_err();
        assert!(matches!(err, Error::MissingToken));
        assert!(matches!(
            Mixpanel::from_config(ClientConfig::default()),
            Err(Error::MissingToken)
        ));
    }

    #[test]
    fn test_build_request_attaches_key_for_import_only() {
        let client = client_with(Arc::new(RecordingTransport::new()));
        let import = client.build_request(Endpoint::Import, json!([])).unwrap();
        assert_eq!(import.api_key.as_deref(), Some("key"));
        let track = client.build_request(Endpoint::Track, json!({})).unwrap();
        assert!(track.api_key.is_none());
    }

    #[test]
    fn test_build_request_without_key_fails_for_import() {
        let transport = Arc::new(RecordingTransport::new());
        let client = Mixpanel::with_transport("token", ClientConfig::default(), transport).unwrap();
        assert!(matches!(
            client.build_request(Endpoint::Import, json!([])),
            Err(Error::MissingApiKey)
        ));
    }

    #[test]
    fn test_track_stamps_token_and_lib() {
        let transport = Arc::new(RecordingTransport::new());
        let client = client_with(transport.clone());
        let mut props = Properties::new();
        props.insert("plan".into(), json!("pro"));

        client.track("signup", props).unwrap();

        let sent = &transport.requests()[0];
        assert_eq!(sent.endpoint, Endpoint::Track);
        assert_eq!(sent.data["event"], "signup");
        assert_eq!(sent.data["properties"]["token"], "token");
        assert_eq!(sent.data["properties"]["mp_lib"], "rust");
        assert_eq!(sent.data["properties"]["plan"], "pro");
    }

    #[test]
    fn test_send_request_surfaces_server_error() {
        let transport = Arc::new(RecordingTransport::replying("0"));
        let client = client_with(transport);
        let err = client
            .send_request(Endpoint::Track, json!({"event": "x"}))
            .unwrap_err();
        assert!(matches!(err, ClientError::Request(RequestError::Server(_))));
    }

    #[test]
    fn test_verbose_config_is_forwarded() {
        let transport = Arc::new(RecordingTransport::replying(r#"{"status": 1, "error": null}"#));
        let config = ClientConfig::default().with_verbose(true);
        let client = Mixpanel::with_transport("token", config, transport.clone()).unwrap();

        client.track("x", Properties::new()).unwrap();
        assert!(transport.requests()[0].verbose);
    }

    #[test]
    fn test_plan_uses_configured_defaults() {
        let mut config = ClientConfig::default();
        config.import.max_batch_size = Some(10);
        let client =
            Mixpanel::with_transport("token", config, Arc::new(RecordingTransport::new())).unwrap();
        let plan = client.plan_batch(25, &ImportOptions::default());
        assert_eq!(plan.batch_size, 10);
        assert_eq!(plan.request_count, 3);

        let overridden = client.plan_batch(25, &ImportOptions::default().with_max_batch_size(25));
        assert_eq!(overridden.request_count, 1);
    }

    #[test]
    fn test_debug_masks_api_key() {
        let client = client_with(Arc::new(RecordingTransport::new()));
        let rendered = format!("{:?}", client);
        assert!(rendered.contains("token"));
        assert!(!rendered.contains("\"key\""));
    }
}
