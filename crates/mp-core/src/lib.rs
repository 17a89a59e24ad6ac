//! Mixpanel import core library.
//!
//! This library provides the client side of event forwarding:
//! - Request encoding for the `/track` and `/import` endpoints
//! - A pluggable HTTP transport
//! - Splitting historical events into service-sized batches
//! - Aggregating per-batch failures into a single report
//! - Logging setup and exit codes for the `mp-import` binary
//!
//! The binary entry point is in `main.rs`.

pub mod batch;
pub mod client;
pub mod exit_codes;
pub mod input;
pub mod logging;
pub mod request;
pub mod response;
pub mod transport;

pub use batch::{
    BatchFailure, BatchPlan, BatchReport, ImportOptions, DEFAULT_MAX_CONCURRENT_REQUESTS,
    MAX_BATCH_SIZE,
};
pub use client::{ClientError, Mixpanel};
pub use request::{ApiRequest, Endpoint};
pub use response::RequestError;
pub use transport::{HttpTransport, RecordingTransport, Transport, TransportError};
