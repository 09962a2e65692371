//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Hedged dispatch outcome for a node:
//!     → success / domain rejection → circuit_breaker.rs success
//!     → transport error / non-terminal code → circuit_breaker.rs fail
//!     → open circuits drop out of the next healthy snapshot
//! ```
//!
//! # Design Decisions
//! - No per-node retries; hedging across nodes replaces them
//! - Cancellation-induced outcomes never reach the breaker

pub mod circuit_breaker;

pub use circuit_breaker::{CircuitBreaker, CircuitState, NodeHealth};
