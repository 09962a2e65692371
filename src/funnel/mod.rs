//! Funnel protocol subsystem.
//!
//! # Data Flow
//! ```text
//! FormPayload + Endpoint + node address
//!     → client.rs (POST form, decode envelope)
//!     → response.rs (FunnelResponse, code → Verdict)
//!     → dispatcher decides what the verdict means
//! ```

pub mod api;
pub mod client;
pub mod response;

pub use api::{Endpoint, FormPayload, LoginType};
pub use client::{CallError, FunnelTransport, HttpFunnelClient};
pub use response::{FunnelResponse, Verdict};
