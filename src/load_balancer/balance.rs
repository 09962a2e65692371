//! Login-type aware load balancing.
//!
//! # Responsibilities
//! - Own one node pool and one circuit breaker per login family
//! - Produce healthy snapshots (pool members the breaker admits)
//! - Route breaker feedback to the right family
//! - Runtime membership changes (admin API, config reload)

use serde::Serialize;

use crate::config::{BreakerConfig, PoolsConfig};
use crate::dispatch::DispatchError;
use crate::funnel::LoginType;
use crate::load_balancer::pool::NodePool;
use crate::observability::metrics;
use crate::resilience::circuit_breaker::{CircuitBreaker, CircuitState};

/// Admin view of one pool member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeStatus {
    pub address: String,
    pub state: CircuitState,
    pub consecutive_failures: u32,
}

#[derive(Debug)]
struct Lane {
    pool: NodePool,
    breaker: CircuitBreaker,
}

impl Lane {
    fn new(login_type: LoginType, nodes: Vec<String>, breaker: &BreakerConfig) -> Self {
        Self {
            pool: NodePool::new(nodes),
            breaker: CircuitBreaker::new(login_type, breaker),
        }
    }

    fn healthy(&self) -> Vec<String> {
        self.breaker.retain_available(self.pool.list())
    }

    fn pick(&self) -> Option<String> {
        // Fast path: a random member that is not open.
        let node = self.pool.pick()?;
        if self.breaker.state(&node).admits_traffic() {
            return Some(node);
        }
        let healthy = self.healthy();
        match healthy.len() {
            0 => None,
            n => Some(healthy[fastrand::usize(..n)].clone()),
        }
    }
}

/// The OAuth and ZF node pools with their breakers.
///
/// `Unknown` login types are served from the ZF pool.
#[derive(Debug)]
pub struct LoadBalance {
    oauth: Lane,
    zf: Lane,
}

impl LoadBalance {
    pub fn new(pools: &PoolsConfig, breaker: &BreakerConfig) -> Self {
        Self {
            oauth: Lane::new(LoginType::OAuth, pools.oauth.clone(), breaker),
            zf: Lane::new(LoginType::Zf, pools.zf.clone(), breaker),
        }
    }

    fn lane(&self, login_type: LoginType) -> &Lane {
        match login_type.pool() {
            LoginType::OAuth => &self.oauth,
            _ => &self.zf,
        }
    }

    /// Snapshot of the nodes currently admitted by the breaker.
    pub fn list(&self, login_type: LoginType) -> Vec<String> {
        let healthy = self.lane(login_type).healthy();
        metrics::record_healthy_nodes(login_type.pool(), healthy.len());
        healthy
    }

    /// One random healthy node of `login_type`'s pool.
    pub fn pick_node(&self, login_type: LoginType) -> Option<String> {
        self.lane(login_type).pick()
    }

    /// Pick a node among the allowed families.
    ///
    /// With both families allowed and available, the family is chosen 50/50.
    pub fn pick(&self, zf_flag: bool, oauth_flag: bool) -> Result<(String, LoginType), DispatchError> {
        let oauth = if oauth_flag { self.oauth.pick() } else { None };
        let zf = if zf_flag { self.zf.pick() } else { None };

        match (oauth, zf) {
            (Some(o), Some(z)) => {
                if fastrand::bool() {
                    Ok((o, LoginType::OAuth))
                } else {
                    Ok((z, LoginType::Zf))
                }
            }
            (Some(o), None) => Ok((o, LoginType::OAuth)),
            (None, Some(z)) => Ok((z, LoginType::Zf)),
            (None, None) => Err(DispatchError::NoNodeAvailable),
        }
    }

    /// Add `node` to the pool. Returns false when it is already a member.
    pub fn add(&self, node: &str, login_type: LoginType) -> bool {
        let lane = self.lane(login_type);
        if lane.pool.contains(node) {
            return false;
        }
        lane.pool.add(node);
        tracing::info!(node = %node, login_type = %login_type.pool(), "Node added to pool");
        true
    }

    /// Remove `node` from the pool. Removing a non-member is a no-op.
    pub fn remove(&self, node: &str, login_type: LoginType) -> bool {
        let removed = self.lane(login_type).pool.remove(node);
        if removed {
            tracing::info!(node = %node, login_type = %login_type.pool(), "Node removed from pool");
        }
        removed
    }

    /// Replace a pool's membership. Breaker history of surviving nodes is kept.
    pub fn rebalance(&self, login_type: LoginType, nodes: Vec<String>) {
        tracing::info!(login_type = %login_type.pool(), nodes = nodes.len(), "Pool rebalanced");
        self.lane(login_type).pool.rebalance(nodes);
    }

    /// Apply reloaded pool configuration.
    pub fn apply(&self, pools: &PoolsConfig) {
        self.rebalance(LoginType::OAuth, pools.oauth.clone());
        self.rebalance(LoginType::Zf, pools.zf.clone());
    }

    /// Report a failed call.
    pub fn fail(&self, node: &str, login_type: LoginType) {
        metrics::record_node_failure(login_type.pool());
        self.lane(login_type).breaker.fail(node);
    }

    /// Report a healthy answer.
    pub fn success(&self, node: &str, login_type: LoginType) {
        self.lane(login_type).breaker.success(node);
    }

    /// Breaker state of `node` within `login_type`'s pool.
    pub fn state(&self, node: &str, login_type: LoginType) -> CircuitState {
        self.lane(login_type).breaker.state(node)
    }

    /// Every member of the pool with its breaker status.
    pub fn nodes(&self, login_type: LoginType) -> Vec<NodeStatus> {
        let lane = self.lane(login_type);
        lane.pool
            .list()
            .into_iter()
            .map(|address| {
                let health = lane.breaker.health(&address);
                NodeStatus {
                    address,
                    state: health.state,
                    consecutive_failures: health.consecutive_failures,
                }
            })
            .collect()
    }
}
