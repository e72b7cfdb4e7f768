//! Edge platform event envelope.
//!
//! The platform invokes the handler with `{"Records": [{"cf": {"config": ..., "request": ...}}]}`
//! and expects the (possibly mutated) request back.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::edge::content_hash::{inject_content_hash, ContentHashError, Outcome};
use crate::edge::record::RequestRecord;
use crate::observability::metrics;

/// Errors returned to the platform callback.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("event contains no records")]
    NoRecords,

    #[error(transparent)]
    ContentHash(#[from] ContentHashError),
}

/// Top-level event delivered by the edge platform.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EdgeEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<EdgeEventRecord>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EdgeEventRecord {
    pub cf: CfPayload,
}

/// The `cf` object: distribution metadata plus the request.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CfPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,

    pub request: RequestRecord,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EdgeEvent {
    /// Wrap a single request in an envelope.
    pub fn from_request(request: RequestRecord) -> Self {
        Self {
            records: vec![EdgeEventRecord {
                cf: CfPayload {
                    config: None,
                    request,
                    extra: Map::new(),
                },
            }],
        }
    }
}

/// Handle one origin-request event: take the first record's request, add the
/// content hash when eligible, and return it.
pub fn handle_event(event: EdgeEvent) -> Result<RequestRecord, HandlerError> {
    let mut request = event
        .records
        .into_iter()
        .next()
        .map(|record| record.cf.request)
        .ok_or(HandlerError::NoRecords)?;

    process_request(&mut request)?;
    Ok(request)
}

/// Run the injector over `request`, logging and counting the outcome.
pub fn process_request(request: &mut RequestRecord) -> Result<Outcome, ContentHashError> {
    match inject_content_hash(request) {
        Ok(outcome) => {
            metrics::record_content_hash(outcome.label());
            match &outcome {
                Outcome::Injected(digest) => tracing::debug!(
                    method = %request.method,
                    digest = %digest,
                    "Injected content hash"
                ),
                Outcome::Skipped(reason) => tracing::debug!(
                    method = %request.method,
                    reason = reason.as_str(),
                    "Request passed through"
                ),
            }
            Ok(outcome)
        }
        Err(e) => {
            metrics::record_content_hash("decode_error");
            tracing::warn!(method = %request.method, error = %e, "Rejecting request body");
            Err(e)
        }
    }
}
