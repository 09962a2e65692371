//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! dispatcher, breakers, admin API produce:
//!     → logging.rs (structured log events, one span per dispatch)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```

pub mod logging;
pub mod metrics;
