//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate unique request IDs (UUID v4)
//! - Convert an incoming HTTP request into a `RequestRecord`
//! - Rebuild forwardable headers from a record, minus hop-by-hop headers and
//!   any header the sender named in `Connection`
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Header values must be UTF-8 to enter a record; others are rejected

use std::net::IpAddr;

use axum::http::{
    request::Parts,
    HeaderMap, HeaderName, HeaderValue, Request,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use thiserror::Error;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::edge::record::{HeaderEntry, Headers, RequestBody, RequestRecord};

/// Correlation header set on every proxied request and response.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Headers scoped to a single connection; never forwarded.
const HOP_BY_HOP: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Errors converting between HTTP requests and records.
#[derive(Debug, Error)]
pub enum RequestConversionError {
    #[error("header {0} has a non UTF-8 value")]
    NonUtf8Header(String),

    #[error("invalid header name {0:?}")]
    HeaderName(String),

    #[error("invalid value for header {0}")]
    HeaderValue(String),
}

/// Generates `x-request-id` values for requests that arrive without one.
#[derive(Clone, Copy, Debug, Default)]
pub struct MakeEdgeRequestId;

impl MakeRequestId for MakeEdgeRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let value = HeaderValue::from_str(&Uuid::new_v4().to_string()).ok()?;
        Some(RequestId::new(value))
    }
}

/// Build a record from request parts and the buffered body.
pub fn to_record(
    parts: &Parts,
    body: &[u8],
    client_ip: Option<IpAddr>,
) -> Result<RequestRecord, RequestConversionError> {
    let mut headers = Headers::new();
    for (name, value) in parts.headers.iter() {
        let value = value
            .to_str()
            .map_err(|_| RequestConversionError::NonUtf8Header(name.to_string()))?;
        headers
            .entry(name.as_str().to_string())
            .or_default()
            .push(HeaderEntry::new(name.as_str(), value));
    }

    Ok(RequestRecord {
        method: parts.method.as_str().to_string(),
        headers,
        body: (!body.is_empty()).then(|| RequestBody::base64(STANDARD.encode(body))),
        uri: Some(parts.uri.path().to_string()),
        querystring: Some(parts.uri.query().unwrap_or_default().to_string()),
        client_ip: client_ip.map(|ip| ip.to_string()),
        ..RequestRecord::default()
    })
}

/// Rebuild the header map to send upstream.
pub fn to_header_map(headers: &Headers) -> Result<HeaderMap, RequestConversionError> {
    let listed = connection_listed(headers);
    let mut map = HeaderMap::new();
    for (name, entries) in headers {
        if is_hop_by_hop(name) || listed.iter().any(|l| l.eq_ignore_ascii_case(name)) {
            continue;
        }
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| RequestConversionError::HeaderName(name.clone()))?;
        for entry in entries {
            let value = HeaderValue::from_str(&entry.value)
                .map_err(|_| RequestConversionError::HeaderValue(name.clone()))?;
            map.append(header_name.clone(), value);
        }
    }
    Ok(map)
}

fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP.iter().any(|h| h.eq_ignore_ascii_case(name))
}

/// Extra hop-by-hop names the sender listed in `Connection`.
fn connection_listed(headers: &Headers) -> Vec<&str> {
    headers
        .get("connection")
        .into_iter()
        .flatten()
        .flat_map(|entry| entry.value.split(','))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .collect()
}
