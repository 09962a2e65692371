//! Node pool for one login type.
//!
//! # Responsibilities
//! - Hold the ordered member list of a pool
//! - Hand out defensive copies for hedging
//! - Pick a single random member in O(1)

use std::sync::{Mutex, MutexGuard};

/// Random-selection pool of funnel node addresses.
#[derive(Debug, Default)]
pub struct NodePool {
    nodes: Mutex<Vec<String>>,
}

impl NodePool {
    pub fn new(nodes: Vec<String>) -> Self {
        Self {
            nodes: Mutex::new(nodes),
        }
    }

    /// Copy of the current members, in insertion order.
    pub fn list(&self) -> Vec<String> {
        self.lock().clone()
    }

    /// Uniformly random member, `None` when the pool is empty.
    pub fn pick(&self) -> Option<String> {
        let nodes = self.lock();
        match nodes.len() {
            0 => None,
            1 => Some(nodes[0].clone()),
            n => Some(nodes[fastrand::usize(..n)].clone()),
        }
    }

    pub fn add(&self, node: impl Into<String>) {
        self.lock().push(node.into());
    }

    /// Remove the first occurrence of `node`. Returns whether it was a member.
    pub fn remove(&self, node: &str) -> bool {
        let mut nodes = self.lock();
        match nodes.iter().position(|n| n == node) {
            Some(idx) => {
                nodes.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Replace the whole membership.
    pub fn rebalance(&self, nodes: Vec<String>) {
        *self.lock() = nodes;
    }

    pub fn contains(&self, node: &str) -> bool {
        self.lock().iter().any(|n| n == node)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.nodes.lock().unwrap_or_else(|e| e.into_inner())
    }
}
