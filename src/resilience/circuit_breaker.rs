//! Circuit breaker for funnel node protection.
//!
//! # States
//! - Closed: normal operation, node is listed for traffic
//! - Open: node assumed down, excluded from snapshots
//! - Half-Open: node listed again on probation
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive failures >= failure_threshold
//! Open → Half-Open: cooldown elapsed since the circuit opened
//! Half-Open → Closed: any success
//! Half-Open → Open: any failure (open time refreshed)
//! Closed → Closed: any success resets the failure count
//! ```
//!
//! # Design Decisions
//! - One breaker per login type; entries keyed by node address
//! - Entries are created lazily on first feedback and never removed
//! - Open → Half-Open is evaluated lazily whenever an entry is read or written
//! - All access goes through one mutex per breaker instance

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::config::BreakerConfig;
use crate::funnel::LoginType;
use crate::observability::metrics;

/// Circuit state of a single node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    /// Whether nodes in this state may receive traffic.
    pub fn admits_traffic(self) -> bool {
        !matches!(self, CircuitState::Open)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

/// Point-in-time view of one node's breaker entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NodeHealth {
    pub state: CircuitState,
    pub consecutive_failures: u32,
}

#[derive(Debug)]
struct Entry {
    state: CircuitState,
    consecutive_failures: u32,
    changed_at: Instant,
}

impl Entry {
    fn new(now: Instant) -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            changed_at: now,
        }
    }

    /// Move Open → HalfOpen once the cooldown has passed.
    fn refresh(&mut self, now: Instant, cooldown: Duration) -> bool {
        if self.state == CircuitState::Open && now.duration_since(self.changed_at) >= cooldown {
            self.state = CircuitState::HalfOpen;
            self.changed_at = now;
            return true;
        }
        false
    }

    fn health(&self) -> NodeHealth {
        NodeHealth {
            state: self.state,
            consecutive_failures: self.consecutive_failures,
        }
    }
}

/// Per-node health gate for one login type.
#[derive(Debug)]
pub struct CircuitBreaker {
    login_type: LoginType,
    failure_threshold: u32,
    cooldown: Duration,
    nodes: Mutex<HashMap<String, Entry>>,
}

impl CircuitBreaker {
    pub fn new(login_type: LoginType, config: &BreakerConfig) -> Self {
        Self {
            login_type,
            failure_threshold: config.failure_threshold.max(1),
            cooldown: Duration::from_secs(config.cooldown_secs),
            nodes: Mutex::new(HashMap::new()),
        }
    }

    pub fn login_type(&self) -> LoginType {
        self.login_type
    }

    /// Record a failed call to `node`.
    pub fn fail(&self, node: &str) {
        let now = Instant::now();
        let mut nodes = self.lock();
        let entry = nodes.entry(node.to_string()).or_insert_with(|| Entry::new(now));
        if entry.refresh(now, self.cooldown) {
            self.log_transition(node, CircuitState::HalfOpen);
        }

        match entry.state {
            CircuitState::Closed => {
                entry.consecutive_failures = entry.consecutive_failures.saturating_add(1);
                if entry.consecutive_failures >= self.failure_threshold {
                    entry.state = CircuitState::Open;
                    entry.changed_at = now;
                    self.log_transition(node, CircuitState::Open);
                }
            }
            CircuitState::HalfOpen => {
                entry.consecutive_failures = entry.consecutive_failures.saturating_add(1);
                entry.state = CircuitState::Open;
                entry.changed_at = now;
                self.log_transition(node, CircuitState::Open);
            }
            // Still cooling down; late failures from in-flight calls do not
            // extend the cooldown.
            CircuitState::Open => {}
        }
    }

    /// Record a healthy answer from `node`.
    pub fn success(&self, node: &str) {
        let now = Instant::now();
        let mut nodes = self.lock();
        let entry = nodes.entry(node.to_string()).or_insert_with(|| Entry::new(now));
        if entry.refresh(now, self.cooldown) {
            self.log_transition(node, CircuitState::HalfOpen);
        }

        match entry.state {
            CircuitState::Closed => entry.consecutive_failures = 0,
            CircuitState::HalfOpen => {
                entry.consecutive_failures = 0;
                entry.state = CircuitState::Closed;
                entry.changed_at = now;
                self.log_transition(node, CircuitState::Closed);
            }
            // A node can only answer while open if it was raced before it
            // tripped; the cooldown still applies.
            CircuitState::Open => {}
        }
    }

    /// Current state of `node`; unseen nodes are Closed.
    pub fn state(&self, node: &str) -> CircuitState {
        self.health(node).state
    }

    /// Current health entry of `node`.
    pub fn health(&self, node: &str) -> NodeHealth {
        let now = Instant::now();
        let mut nodes = self.lock();
        match nodes.get_mut(node) {
            Some(entry) => {
                if entry.refresh(now, self.cooldown) {
                    self.log_transition(node, CircuitState::HalfOpen);
                }
                entry.health()
            }
            None => NodeHealth {
                state: CircuitState::Closed,
                consecutive_failures: 0,
            },
        }
    }

    /// Keep only the nodes that currently admit traffic, preserving order.
    pub fn retain_available(&self, candidates: Vec<String>) -> Vec<String> {
        let now = Instant::now();
        let mut nodes = self.lock();
        candidates
            .into_iter()
            .filter(|node| match nodes.get_mut(node.as_str()) {
                Some(entry) => {
                    if entry.refresh(now, self.cooldown) {
                        self.log_transition(node, CircuitState::HalfOpen);
                    }
                    entry.state.admits_traffic()
                }
                None => true,
            })
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        // Entries stay consistent across a panic in a caller, so a poisoned
        // lock is still usable.
        self.nodes.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn log_transition(&self, node: &str, to: CircuitState) {
        match to {
            CircuitState::Open => tracing::warn!(
                node = %node,
                login_type = %self.login_type,
                cooldown_secs = self.cooldown.as_secs(),
                "Circuit opened, node removed from rotation"
            ),
            CircuitState::HalfOpen => tracing::info!(
                node = %node,
                login_type = %self.login_type,
                "Circuit half-open, node back on probation"
            ),
            CircuitState::Closed => tracing::info!(
                node = %node,
                login_type = %self.login_type,
                "Circuit closed, node recovered"
            ),
        }
        metrics::record_breaker_transition(self.login_type, to);
    }
}
