//! Request encoding for the tracking API.
//!
//! Every call is a `GET {endpoint}?data=<base64 json>&ip=0&verbose=<0|1>`,
//! with `api_key` added for `/import` and `test=1` in test mode.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Serialize;
use serde_json::Value;

/// Tracking API endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Endpoint {
    /// Live (and recent) events.
    Track,
    /// Historical events; requires an API key.
    Import,
}

impl Endpoint {
    /// URL path of the endpoint.
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Track => "/track",
            Endpoint::Import => "/import",
        }
    }

    /// Whether requests to this endpoint must carry the API key.
    pub fn requires_api_key(&self) -> bool {
        matches!(self, Endpoint::Import)
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// A fully built API request, independent of how it is delivered.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub endpoint: Endpoint,
    /// JSON payload: one event object, or an array of events for `/import`.
    pub data: Value,
    pub api_key: Option<String>,
    pub verbose: bool,
    pub test: bool,
}

impl ApiRequest {
    /// Base64 of the JSON payload.
    pub fn encoded_data(&self) -> String {
        STANDARD.encode(self.data.to_string())
    }

    /// Query parameters in wire order.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("data", self.encoded_data()),
            ("ip", "0".to_string()),
            ("verbose", if self.verbose { "1" } else { "0" }.to_string()),
        ];
        if let Some(key) = &self.api_key {
            pairs.push(("api_key", key.clone()));
        }
        if self.test {
            pairs.push(("test", "1".to_string()));
        }
        pairs
    }

    /// Number of events carried by the payload.
    pub fn event_count(&self) -> usize {
        match &self.data {
            Value::Array(items) => items.len(),
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(endpoint: Endpoint, data: Value) -> ApiRequest {
        ApiRequest {
            endpoint,
            data,
            api_key: None,
            verbose: false,
            test: false,
        }
    }

    #[test]
    fn test_endpoint_paths() {
        assert_eq!(Endpoint::Track.path(), "/track");
        assert_eq!(Endpoint::Import.path(), "/import");
        assert!(Endpoint::Import.requires_api_key());
        assert!(!Endpoint::Track.requires_api_key());
    }

    #[test]
    fn test_encoded_data_decodes_to_payload() {
        let payload = json!({"event": "test", "properties": {"time": 500}});
        let req = request(Endpoint::Track, payload.clone());
        let decoded = STANDARD.decode(req.encoded_data()).unwrap();
        let parsed: Value = serde_json::from_slice(&decoded).unwrap();
        assert_eq!(parsed, payload);
    }

    #[test]
    fn test_query_pairs_for_track() {
        let req = request(Endpoint::Track, json!({"event": "x"}));
        let keys: Vec<&str> = req.query_pairs().iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["data", "ip", "verbose"]);
        assert_eq!(req.query_pairs()[1].1, "0");
        assert_eq!(req.query_pairs()[2].1, "0");
    }

    #[test]
    fn test_query_pairs_for_import_in_test_mode() {
        let mut req = request(Endpoint::Import, json!([{"event": "x"}]));
        req.api_key = Some("key".to_string());
        req.verbose = true;
        req.test = true;
        let pairs = req.query_pairs();
        assert_eq!(pairs[2], ("verbose", "1".to_string()));
        assert_eq!(pairs[3], ("api_key", "key".to_string()));
        assert_eq!(pairs[4], ("test", "1".to_string()));
    }

    #[test]
    fn test_event_count() {
        assert_eq!(request(Endpoint::Track, json!({"event": "x"})).event_count(), 1);
        assert_eq!(
            request(Endpoint::Import, json!([{"event": "a"}, {"event": "b"}])).event_count(),
            2
        );
    }
}
