//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! dispatcher, stock middleware, server adapter:
//!     → logging.rs (tracing subscriber: env filter, pretty or JSON)
//!     → metrics.rs (counters and histograms, Prometheus scrape endpoint)
//! ```
//!
//! # Design Decisions
//! - Structured fields on every event, request ID included when known
//! - Metric updates are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;

pub use logging::init_tracing;
pub use metrics::init_metrics;
