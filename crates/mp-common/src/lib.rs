//! Mixpanel import common types and errors.
//!
//! This crate provides the foundational types shared by the client and CLI:
//! - Event records and their property maps
//! - Event time normalization (Unix seconds or date-times)
//! - Common error type with stable codes

pub mod error;
pub mod event;
pub mod time;

pub use error::{Error, ErrorCategory, Result, StructuredError};
pub use event::{Event, Properties};
pub use time::EventTime;

/// Library identifier sent as the `mp_lib` property on tracked events.
pub const LIB_NAME: &str = "rust";
