//! Single-node funnel call.
//!
//! # Responsibilities
//! - POST a form payload to `node + endpoint`
//! - Decode the response envelope without interpreting its code
//! - Collapse transport and decode failures into one error
//! - Honour the caller's cancellation token before and during the call

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::config::ClientConfig;
use crate::funnel::api::{Endpoint, FormPayload};
use crate::funnel::response::FunnelResponse;

/// Failure of a single node call.
#[derive(Debug, Error)]
pub enum CallError {
    /// Transport failure or undecodable envelope.
    #[error("funnel request failed: {0}")]
    Request(String),

    /// The shared cancellation token fired before the call produced a result.
    #[error("funnel call cancelled")]
    Cancelled,
}

/// One outbound call to one funnel node.
#[async_trait]
pub trait FunnelTransport: Send + Sync {
    async fn post_form(
        &self,
        node: &str,
        endpoint: &Endpoint,
        form: &FormPayload,
        cancel: &CancellationToken,
    ) -> Result<FunnelResponse, CallError>;
}

/// reqwest-backed funnel client.
#[derive(Debug, Clone)]
pub struct HttpFunnelClient {
    client: reqwest::Client,
}

impl HttpFunnelClient {
    pub fn new(config: &ClientConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self { client })
    }

    async fn send(&self, url: &str, form: &FormPayload) -> Result<FunnelResponse, CallError> {
        let response = self
            .client
            .post(url)
            .form(form)
            .send()
            .await
            .map_err(|e| CallError::Request(e.to_string()))?;

        let body = response
            .bytes()
            .await
            .map_err(|e| CallError::Request(e.to_string()))?;

        serde_json::from_slice(&body).map_err(|e| CallError::Request(format!("bad envelope: {}", e)))
    }
}

#[async_trait]
impl FunnelTransport for HttpFunnelClient {
    async fn post_form(
        &self,
        node: &str,
        endpoint: &Endpoint,
        form: &FormPayload,
        cancel: &CancellationToken,
    ) -> Result<FunnelResponse, CallError> {
        if cancel.is_cancelled() {
            return Err(CallError::Cancelled);
        }
        if node.is_empty() {
            return Err(CallError::Request("empty node address".to_string()));
        }

        let url = endpoint.url_for(node);
        tracing::trace!(url = %url, "Calling funnel node");

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(CallError::Cancelled),
            result = self.send(&url, form) => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cancelled_before_call() {
        let client = HttpFunnelClient::new(&ClientConfig::default()).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        // Unroutable node: if a call were attempted it would be a Request error.
        let result = client
            .post_form("http://0.0.0.0:1", &Endpoint::new("/zf/login"), &FormPayload::new(), &cancel)
            .await;
        assert!(matches!(result, Err(CallError::Cancelled)));
    }

    #[tokio::test]
    async fn test_empty_node_is_request_error() {
        let client = HttpFunnelClient::new(&ClientConfig::default()).unwrap();
        let result = client
            .post_form("", &Endpoint::new("/zf/login"), &FormPayload::new(), &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(CallError::Request(_))));
    }
}
