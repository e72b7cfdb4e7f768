//! Request record exchanged with the edge platform.
//!
//! Mirrors the shape of `Records[].cf.request`: headers are keyed by their
//! lower-cased name and hold a list of `{key, value}` pairs so the original
//! casing can be restored when the request leaves the edge.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Header mapping, lower-cased name → entries.
pub type Headers = BTreeMap<String, Vec<HeaderEntry>>;

/// A single header value with its original-case name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HeaderEntry {
    /// Header name as the client sent it. Optional on input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    pub value: String,
}

impl HeaderEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            value: value.into(),
        }
    }
}

/// Request body as exposed by the edge platform.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestBody {
    /// Base64-encoded payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,

    /// `base64` or `text`. Passed through, never inspected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_truncated: Option<bool>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RequestBody {
    /// Body carrying an already base64-encoded payload.
    pub fn base64(data: impl Into<String>) -> Self {
        Self {
            data: Some(data.into()),
            encoding: Some("base64".to_string()),
            ..Self::default()
        }
    }

    /// True when there is no payload to hash. An empty string counts as absent.
    pub fn is_empty(&self) -> bool {
        self.data.as_deref().map_or(true, str::is_empty)
    }
}

/// A single HTTP request intercepted at the edge.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestRecord {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub method: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: Headers,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<RequestBody>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub querystring: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_ip: Option<String>,

    /// Fields this crate does not model (e.g. `origin`), kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RequestRecord {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers
            .entry(name.to_ascii_lowercase())
            .or_default()
            .push(HeaderEntry::new(name, value));
        self
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }

    /// First value stored under `name` (exact key match).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name)
            .and_then(|entries| entries.first())
            .map(|entry| entry.value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_platform_request_deserializes() {
        let raw = json!({
            "clientIp": "203.0.113.178",
            "method": "PUT",
            "uri": "/bucket/object.txt",
            "querystring": "",
            "headers": {
                "host": [{ "key": "Host", "value": "d111111abcdef8.cloudfront.net" }],
                "user-agent": [{ "value": "curl/8.4.0" }]
            },
            "body": {
                "action": "read-only",
                "data": "aGVsbG8=",
                "encoding": "base64",
                "inputTruncated": false
            }
        });

        let record: RequestRecord = serde_json::from_value(raw).unwrap();
        assert_eq!(record.method, "PUT");
        assert_eq!(record.header("host"), Some("d111111abcdef8.cloudfront.net"));
        assert_eq!(record.headers["user-agent"][0].key, None);
        let body = record.body.unwrap();
        assert_eq!(body.data.as_deref(), Some("aGVsbG8="));
        assert_eq!(body.input_truncated, Some(false));
    }

    #[test]
    fn test_unknown_fields_survive_reserialization() {
        let raw = json!({
            "method": "GET",
            "headers": {},
            "origin": { "s3": { "domainName": "bucket.s3.amazonaws.com" } },
            "body": { "data": "", "customFlag": 7 }
        });

        let record: RequestRecord = serde_json::from_value(raw.clone()).unwrap();
        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["origin"], raw["origin"]);
        assert_eq!(back["body"]["customFlag"], 7);
    }

    #[test]
    fn test_sparse_request_round_trips_exactly() {
        let raw = json!({ "uri": "/health", "querystring": "" });

        let record: RequestRecord = serde_json::from_value(raw.clone()).unwrap();

        assert_eq!(record.method, "");
        assert!(record.headers.is_empty());
        assert_eq!(serde_json::to_value(&record).unwrap(), raw);
    }

    #[test]
    fn test_empty_data_counts_as_empty_body() {
        assert!(RequestBody::default().is_empty());
        assert!(RequestBody::base64("").is_empty());
        assert!(!RequestBody::base64("AA==").is_empty());
    }

    #[test]
    fn test_with_header_groups_by_lowercase_name() {
        let record = RequestRecord::new("GET")
            .with_header("Accept", "text/plain")
            .with_header("ACCEPT", "application/json");

        let entries = &record.headers["accept"];
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].key.as_deref(), Some("Accept"));
        assert_eq!(entries[1].key.as_deref(), Some("ACCEPT"));
    }
}
