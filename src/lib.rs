//! Funnel request dispatcher.
//!
//! Forwards authentication requests to interchangeable funnel nodes. ZF-family
//! endpoints are hedged across every healthy node of the request's login
//! type; everything else goes to a single node. Per-node circuit breakers
//! decide which nodes count as healthy.

pub mod admin;
pub mod config;
pub mod dispatch;
pub mod funnel;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod resilience;

pub use config::FunnelConfig;
pub use dispatch::{DispatchError, Dispatcher};
pub use funnel::{Endpoint, FormPayload, LoginType};
pub use lifecycle::Shutdown;
pub use load_balancer::LoadBalance;
