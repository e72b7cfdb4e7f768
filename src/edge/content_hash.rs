//! Content-hash injection.
//!
//! # Responsibilities
//! - Decide whether a request needs an `x-amz-content-sha256` header
//! - Hash the decoded body and add the header as a single entry
//!
//! # Design Decisions
//! - Method check is a literal, case-sensitive membership test
//! - Header presence is an exact key lookup; a caller-supplied hash is never replaced
//! - An empty `data` string is treated as no body
//! - Padding on the body is optional; characters outside the alphabet fail fast
//!   and leave the record untouched

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::edge::record::{HeaderEntry, RequestRecord};

/// Header carrying the hex SHA-256 of the request payload.
pub const CONTENT_SHA256_HEADER: &str = "x-amz-content-sha256";

/// Methods whose bodies are hashed.
pub const HASHABLE_METHODS: [&str; 3] = ["POST", "PATCH", "PUT"];

/// Standard alphabet, padded or not.
const BODY_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Errors raised while hashing a request body.
#[derive(Debug, Error)]
pub enum ContentHashError {
    #[error("request body is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),
}

/// Why a record was passed through unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MethodNotHashable,
    HashPresent,
    NoBody,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::MethodNotHashable => "method_not_hashable",
            SkipReason::HashPresent => "hash_present",
            SkipReason::NoBody => "no_body",
        }
    }
}

/// Result of running the injector over one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Header added with this hex digest.
    Injected(String),
    Skipped(SkipReason),
}

impl Outcome {
    /// Short label used for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Injected(_) => "injected",
            Outcome::Skipped(reason) => reason.as_str(),
        }
    }
}

/// Render the SHA-256 digest of `bytes` as 64 lowercase hex characters.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Add `x-amz-content-sha256` to an eligible record, in place.
pub fn inject_content_hash(request: &mut RequestRecord) -> Result<Outcome, ContentHashError> {
    if !HASHABLE_METHODS.contains(&request.method.as_str()) {
        return Ok(Outcome::Skipped(SkipReason::MethodNotHashable));
    }

    if request.headers.contains_key(CONTENT_SHA256_HEADER) {
        return Ok(Outcome::Skipped(SkipReason::HashPresent));
    }

    let Some(data) = request
        .body
        .as_ref()
        .filter(|body| !body.is_empty())
        .and_then(|body| body.data.as_deref())
    else {
        return Ok(Outcome::Skipped(SkipReason::NoBody));
    };

    let payload = BODY_ENGINE.decode(data)?;
    let digest = sha256_hex(&payload);

    request.headers.insert(
        CONTENT_SHA256_HEADER.to_string(),
        vec![HeaderEntry::new(CONTENT_SHA256_HEADER, digest.clone())],
    );

    Ok(Outcome::Injected(digest))
}

/// By-value form of [`inject_content_hash`].
pub fn with_content_hash(mut request: RequestRecord) -> Result<RequestRecord, ContentHashError> {
    inject_content_hash(&mut request)?;
    Ok(request)
}
