//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Logging/metrics → Pools + dispatcher → Admin API
//!
//! Shutdown (shutdown.rs):
//!     Ctrl+C → broadcast → admin API drains, reload loop exits
//! ```

pub mod shutdown;

pub use shutdown::Shutdown;
