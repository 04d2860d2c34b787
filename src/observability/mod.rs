//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Pipeline stages and dispatcher produce:
//!     → logging.rs (structured log events, request spans)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every log line via the request span
//! - Metrics calls are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
