//! Edge request processing subsystem.
//!
//! # Data Flow
//! ```text
//! Edge event (Records[0].cf.request)      Live HTTP request
//!     → event.rs (unwrap envelope)            → http::request (build record)
//!                  \                          /
//!                   → record.rs (RequestRecord)
//!                   → content_hash.rs (maybe add x-amz-content-sha256)
//!                   → hand back to caller / forward upstream
//! ```
//!
//! # Design Decisions
//! - The injector is pure: no I/O, no logging, deterministic
//! - Callers own logging and metrics for each outcome
//! - Unknown request fields survive a deserialize/serialize cycle

pub mod content_hash;
pub mod event;
pub mod record;

pub use content_hash::{
    inject_content_hash, sha256_hex, with_content_hash, ContentHashError, Outcome, SkipReason,
    CONTENT_SHA256_HEADER, HASHABLE_METHODS,
};
pub use event::{handle_event, process_request, EdgeEvent, HandlerError};
pub use record::{HeaderEntry, Headers, RequestBody, RequestRecord};
