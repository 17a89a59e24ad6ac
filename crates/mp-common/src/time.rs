//! Event time normalization.
//!
//! The tracking service expects `properties.time` as whole Unix seconds.
//! Callers may supply seconds directly or a date-time, which is floored to
//! the second.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::time::SystemTime;

/// Time at which an event happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTime {
    /// Unix timestamp in seconds.
    Seconds(i64),
    /// Wall-clock date-time.
    DateTime(DateTime<Utc>),
}

impl EventTime {
    /// Whole Unix seconds, flooring any sub-second part.
    pub fn unix_seconds(&self) -> i64 {
        match self {
            EventTime::Seconds(secs) => *secs,
            EventTime::DateTime(dt) => dt.timestamp(),
        }
    }

    /// Interpret a JSON property value as an event time.
    ///
    /// Integers are seconds, floats are floored to seconds, strings are
    /// either decimal seconds or RFC 3339 date-times. Returns `None` for any
    /// other shape.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => {
                if let Some(secs) = n.as_i64() {
                    return Some(EventTime::Seconds(secs));
                }
                let f = n.as_f64()?;
                let floored = f.floor();
                if floored.is_finite() && floored >= i64::MIN as f64 && floored <= i64::MAX as f64
                {
                    Some(EventTime::Seconds(floored as i64))
                } else {
                    None
                }
            }
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// The normalized JSON value sent on the wire.
    pub fn to_value(&self) -> Value {
        Value::from(self.unix_seconds())
    }
}

impl From<i64> for EventTime {
    fn from(secs: i64) -> Self {
        EventTime::Seconds(secs)
    }
}

impl From<DateTime<Utc>> for EventTime {
    fn from(dt: DateTime<Utc>) -> Self {
        EventTime::DateTime(dt)
    }
}

impl From<SystemTime> for EventTime {
    fn from(t: SystemTime) -> Self {
        EventTime::DateTime(DateTime::<Utc>::from(t))
    }
}

/// Error returned when a string is neither seconds nor an RFC 3339 date-time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEventTimeError(String);

impl fmt::Display for ParseEventTimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' is neither Unix seconds nor an RFC 3339 date-time",
            self.0
        )
    }
}

impl std::error::Error for ParseEventTimeError {}

impl FromStr for EventTime {
    type Err = ParseEventTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(secs) = trimmed.parse::<i64>() {
            return Ok(EventTime::Seconds(secs));
        }
        DateTime::parse_from_rfc3339(trimmed)
            .map(|dt| EventTime::DateTime(dt.with_timezone(&Utc)))
            .map_err(|_| ParseEventTimeError(s.to_string()))
    }
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.unix_seconds())
    }
}

impl Serialize for EventTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.unix_seconds())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_seconds_pass_through() {
        assert_eq!(EventTime::from(500).unix_seconds(), 500);
    }

    #[test]
    fn test_datetime_at_epoch_is_zero() {
        let epoch = Utc.timestamp_opt(0, 0).unwrap();
        assert_eq!(EventTime::from(epoch).unix_seconds(), 0);
        assert_eq!(EventTime::from(SystemTime::UNIX_EPOCH).unix_seconds(), 0);
    }

    #[test]
    fn test_datetime_floors_milliseconds() {
        let dt = Utc.timestamp_millis_opt(1999).unwrap();
        assert_eq!(EventTime::from(dt).unix_seconds(), 1);

        let before_epoch = Utc.timestamp_millis_opt(-1).unwrap();
        assert_eq!(EventTime::from(before_epoch).unix_seconds(), -1);
    }

    #[test]
    fn test_from_value_shapes() {
        assert_eq!(
            EventTime::from_value(&json!(1000)),
            Some(EventTime::Seconds(1000))
        );
        assert_eq!(
            EventTime::from_value(&json!(1500.9)),
            Some(EventTime::Seconds(1500))
        );
        assert_eq!(
            EventTime::from_value(&json!("1700000000")).map(|t| t.unix_seconds()),
            Some(1_700_000_000)
        );
        assert_eq!(
            EventTime::from_value(&json!("1970-01-01T00:00:10.500Z")).map(|t| t.unix_seconds()),
            Some(10)
        );
        assert_eq!(EventTime::from_value(&json!("tomorrow")), None);
        assert_eq!(EventTime::from_value(&json!(true)), None);
        assert_eq!(EventTime::from_value(&json!({"secs": 1})), None);
    }

    #[test]
    fn test_parse_with_offset() {
        let t: EventTime = "1970-01-01T01:00:00+01:00".parse().unwrap();
        assert_eq!(t.unix_seconds(), 0);
    }

    #[test]
    fn test_parse_error_message() {
        let err = "later".parse::<EventTime>().unwrap_err();
        assert!(err.to_string().contains("'later'"));
    }

    #[test]
    fn test_serializes_as_seconds() {
        let dt = Utc.timestamp_millis_opt(2500).unwrap();
        let value = serde_json::to_value(EventTime::from(dt)).unwrap();
        assert_eq!(value, json!(2));
    }
}
