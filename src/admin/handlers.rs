use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::admin::AdminState;
use crate::config::validate_node_address;
use crate::funnel::LoginType;
use crate::load_balancer::NodeStatus;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub healthy_oauth_nodes: usize,
    pub healthy_zf_nodes: usize,
}

#[derive(Serialize)]
pub struct PoolsStatus {
    pub oauth: Vec<NodeStatus>,
    pub zf: Vec<NodeStatus>,
}

#[derive(Debug, Deserialize)]
pub struct NodeRequest {
    pub address: String,
    pub login_type: LoginType,
}

#[derive(Serialize)]
pub struct NodeChange {
    pub address: String,
    pub login_type: LoginType,
    pub changed: bool,
}

pub async fn get_status(
    State(state): State<AdminState>,
) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        healthy_oauth_nodes: state.balance.list(LoginType::OAuth).len(),
        healthy_zf_nodes: state.balance.list(LoginType::Zf).len(),
    })
}

pub async fn get_nodes(
    State(state): State<AdminState>,
) -> Json<PoolsStatus> {
    Json(PoolsStatus {
        oauth: state.balance.nodes(LoginType::OAuth),
        zf: state.balance.nodes(LoginType::Zf),
    })
}

pub async fn add_node(
    State(state): State<AdminState>,
    Json(req): Json<NodeRequest>,
) -> Result<(StatusCode, Json<NodeChange>), (StatusCode, String)> {
    if let Err(reason) = validate_node_address(&req.address) {
        return Err((StatusCode::BAD_REQUEST, format!("invalid node address: {}", reason)));
    }

    let login_type = req.login_type.pool();
    let changed = state.balance.add(&req.address, login_type);
    let status = if changed { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(NodeChange {
        address: req.address,
        login_type,
        changed,
    })))
}

pub async fn remove_node(
    State(state): State<AdminState>,
    Json(req): Json<NodeRequest>,
) -> Json<NodeChange> {
    let login_type = req.login_type.pool();
    let changed = state.balance.remove(&req.address, login_type);
    Json(NodeChange {
        address: req.address,
        login_type,
        changed,
    })
}
