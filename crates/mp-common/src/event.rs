//! Event records.

use crate::error::{Error, Result};
use crate::time::EventTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event property map.
pub type Properties = serde_json::Map<String, Value>;

/// Property carrying the event timestamp.
pub const TIME_PROPERTY: &str = "time";

/// Property carrying the project token.
pub const TOKEN_PROPERTY: &str = "token";

/// A single analytics event as sent to the tracking service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event name.
    pub event: String,

    /// Arbitrary event properties.
    #[serde(default)]
    pub properties: Properties,
}

impl Event {
    /// Create an event with no properties.
    pub fn new(event: impl Into<String>) -> Self {
        Event {
            event: event.into(),
            properties: Properties::new(),
        }
    }

    /// Create an event with the given properties.
    pub fn with_properties(event: impl Into<String>, properties: Properties) -> Self {
        Event {
            event: event.into(),
            properties,
        }
    }

    /// Set a property, replacing any existing value.
    pub fn property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Raw `time` property; JSON `null` counts as absent.
    pub fn time_value(&self) -> Option<&Value> {
        self.properties
            .get(TIME_PROPERTY)
            .filter(|value| !value.is_null())
    }

    /// Check the event has a usable name.
    pub fn validate_name(&self, index: Option<usize>) -> Result<()> {
        if self.event.trim().is_empty() {
            let position = match index {
                Some(i) => format!("event name is empty at index {}", i),
                None => "event name is empty".to_string(),
            };
            return Err(Error::InvalidEvent(position));
        }
        Ok(())
    }

    /// Resolve the event time required by import.
    ///
    /// `index` is the event's position in a batch and only feeds error
    /// context. Zero is a valid time.
    pub fn import_time(&self, index: Option<usize>) -> Result<EventTime> {
        let value = self.time_value().ok_or_else(|| Error::MissingTime {
            event: self.event.clone(),
            index,
        })?;
        EventTime::from_value(value).ok_or_else(|| Error::InvalidTime {
            event: self.event.clone(),
            index,
            value: value.to_string(),
        })
    }
}
