//! HTTP edge proxy subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, limits, timeout)
//!     → request.rs (HTTP request → RequestRecord)
//!     → edge::process_request (maybe add x-amz-content-sha256)
//!     → request.rs (RequestRecord headers → HeaderMap)
//!     → server.rs (forward upstream, stream response back)
//! ```

pub mod request;
pub mod server;

pub use request::{MakeEdgeRequestId, RequestConversionError, X_REQUEST_ID};
pub use server::EdgeServer;
