//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! relay + HTTP front end produce:
//!     → logging.rs (structured log events, request ID spans)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout
//!     → Metrics endpoint (Prometheus scrape), when enabled
//! ```

pub mod logging;
pub mod metrics;
