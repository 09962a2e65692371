//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatch for a login type
//!     → balance.rs (select the OAuth or ZF lane)
//!     → pool.rs (copy of pool members)
//!     → circuit breaker (drop members whose circuit is open)
//!     → healthy snapshot for hedging, or one random pick
//! ```
//!
//! # Design Decisions
//! - Pools own membership, breakers own health; a snapshot is their intersection
//! - Snapshots are copies; later membership changes never reach in-flight dispatches
//! - One mutex per pool and per breaker, independent across login types

pub mod balance;
pub mod pool;

pub use balance::{LoadBalance, NodeStatus};
pub use pool::NodePool;
