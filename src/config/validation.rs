//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Node addresses are http(s) URLs, unique within their pool
//! - Thresholds and timeouts are non-zero
//! - Bind addresses parse when their listener is enabled
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: FunnelConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::{FunnelConfig, PLACEHOLDER_API_KEY};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("pools.{pool}: invalid node address '{address}': {reason}")]
    InvalidNode {
        pool: &'static str,
        address: String,
        reason: String,
    },

    #[error("pools.{pool}: duplicate node address '{address}'")]
    DuplicateNode { pool: &'static str, address: String },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("{field}: invalid socket address '{value}'")]
    InvalidBindAddress { field: &'static str, value: String },

    #[error("admin.api_key must not be empty when the admin API is enabled")]
    EmptyApiKey,

    #[error("admin.api_key is still the shipped placeholder; set a real key to enable the admin API")]
    PlaceholderApiKey,
}

/// Validate a parsed configuration.
pub fn validate_config(config: &FunnelConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    validate_pool("oauth", &config.pools.oauth, &mut errors);
    validate_pool("zf", &config.pools.zf, &mut errors);

    if config.breaker.failure_threshold == 0 {
        errors.push(ValidationError::Zero { field: "breaker.failure_threshold" });
    }
    if config.breaker.cooldown_secs == 0 {
        errors.push(ValidationError::Zero { field: "breaker.cooldown_secs" });
    }
    if config.client.connect_timeout_secs == 0 {
        errors.push(ValidationError::Zero { field: "client.connect_timeout_secs" });
    }
    if config.client.request_timeout_secs == 0 {
        errors.push(ValidationError::Zero { field: "client.request_timeout_secs" });
    }

    if config.admin.enabled {
        if config.admin.bind_address.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::InvalidBindAddress {
                field: "admin.bind_address",
                value: config.admin.bind_address.clone(),
            });
        }
        let api_key = config.admin.api_key.trim();
        if api_key.is_empty() {
            errors.push(ValidationError::EmptyApiKey);
        } else if api_key == PLACEHOLDER_API_KEY {
            errors.push(ValidationError::PlaceholderApiKey);
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidBindAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Check that `address` is an absolute http(s) URL usable as a node base.
pub fn validate_node_address(address: &str) -> Result<Url, String> {
    let url = Url::parse(address).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(format!("unsupported scheme '{}'", scheme)),
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    Ok(url)
}

fn validate_pool(pool: &'static str, nodes: &[String], errors: &mut Vec<ValidationError>) {
    let mut seen = HashSet::new();
    for address in nodes {
        if let Err(reason) = validate_node_address(address) {
            errors.push(ValidationError::InvalidNode {
                pool,
                address: address.clone(),
                reason,
            });
        }
        if !seen.insert(address.as_str()) {
            errors.push(ValidationError::DuplicateNode {
                pool,
                address: address.clone(),
            });
        }
    }
}
