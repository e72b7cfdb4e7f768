//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! edge handler / proxy handler produce:
//!     → logging.rs (structured log events on stderr)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (pretty for humans, JSON for machines)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through proxy spans and logs
//! - Metric calls are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
