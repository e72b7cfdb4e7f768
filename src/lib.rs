//! Edge content-hash injection library.
//!
//! Adds `x-amz-content-sha256` to eligible requests, either inside an edge
//! platform event or on live traffic proxied to an upstream origin.

pub mod config;
pub mod edge;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::EdgeConfig;
pub use edge::{handle_event, inject_content_hash, EdgeEvent, RequestRecord};
pub use http::EdgeServer;
pub use lifecycle::Shutdown;
