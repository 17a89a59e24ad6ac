//! Event input for the CLI.
//!
//! Accepts either a JSON array of events or JSON Lines (one event per line,
//! blank lines ignored).

use mp_common::{Error, Event, Properties, Result};
use serde_json::Value;
use std::io::Read;
use std::path::Path;

/// Parse events from a JSON array or JSON Lines document.
pub fn parse_events(content: &str) -> Result<Vec<Event>> {
    let trimmed = content.trim_start();
    if trimmed.starts_with('[') {
        return Ok(serde_json::from_str(trimmed)?);
    }

    let mut events = Vec::new();
    for (lineno, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let event: Event = serde_json::from_str(line)
            .map_err(|e| Error::InvalidEvent(format!("line {}: {}", lineno + 1, e)))?;
        events.push(event);
    }
    Ok(events)
}

/// Read events from `path`, or from stdin when `path` is `-`.
pub fn read_events(path: &Path) -> Result<Vec<Event>> {
    let content = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path)?
    };
    parse_events(&content)
}

/// Parse a `key=value` property argument.
///
/// The value is read as JSON when it parses, so `count=3` is a number and
/// `flag=true` a boolean; anything else is kept as a string.
pub fn parse_property(arg: &str) -> std::result::Result<(String, Value), String> {
    let (key, raw) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", arg))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty property name in '{}'", arg));
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

/// Collect parsed property arguments into a map; later keys win.
pub fn properties_from_pairs(pairs: Vec<(String, Value)>) -> Properties {
    pairs.into_iter().collect()
}
