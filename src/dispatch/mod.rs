//! Request dispatch to funnel nodes.
//!
//! # Data Flow
//! ```text
//! dispatch(form, preferred node, endpoint)
//!     → endpoint tagged ZF?
//!         no  → single node: preferred (or one random healthy pick), one call, no breaker feedback
//!         yes → hedge.rs: healthy snapshot, preferred first, race all, breaker feedback
//!     → response code → data or DispatchError
//! ```
//!
//! # Design Decisions
//! - No per-node retries, including on 413; hedging plus breaker feedback
//!   replaces them
//! - Only 200, 412 and 416 are distinguished; every other code is a server error
//! - The dispatcher holds no locks; pools and breakers synchronise themselves

pub mod error;
pub mod hedge;

pub use error::DispatchError;

use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::FunnelConfig;
use crate::funnel::{Endpoint, FormPayload, FunnelResponse, FunnelTransport, HttpFunnelClient, Verdict};
use crate::load_balancer::LoadBalance;
use crate::observability::metrics;

/// Map a funnel envelope to the caller-visible result.
pub(crate) fn interpret(rc: FunnelResponse) -> Result<Value, DispatchError> {
    match rc.verdict() {
        Verdict::Success => Ok(rc.data),
        Verdict::WrongPassword => Err(DispatchError::WrongPassword),
        Verdict::OAuthNotUpdated => Err(DispatchError::OAuthNotUpdated),
        Verdict::NodeFailure => Err(DispatchError::ServerError),
    }
}

/// Forwards requests to funnel nodes.
///
/// Cheap to clone; clones share the same pools and transport.
#[derive(Clone)]
pub struct Dispatcher {
    balance: Arc<LoadBalance>,
    transport: Arc<dyn FunnelTransport>,
}

impl Dispatcher {
    pub fn new(balance: Arc<LoadBalance>, transport: Arc<dyn FunnelTransport>) -> Self {
        Self { balance, transport }
    }

    /// Build pools, breakers and the HTTP funnel client from configuration.
    pub fn from_config(config: &FunnelConfig) -> Result<Self, reqwest::Error> {
        let balance = Arc::new(LoadBalance::new(&config.pools, &config.breaker));
        let client = HttpFunnelClient::new(&config.client)?;
        Ok(Self::new(balance, Arc::new(client)))
    }

    pub fn balance(&self) -> &Arc<LoadBalance> {
        &self.balance
    }

    /// Send `form` to `endpoint` and return the funnel's `data` payload.
    ///
    /// An empty `preferred` node is treated as absent.
    pub async fn dispatch(
        &self,
        form: &FormPayload,
        preferred: Option<&str>,
        endpoint: &Endpoint,
    ) -> Result<Value, DispatchError> {
        let start = Instant::now();
        let preferred = preferred.filter(|node| !node.is_empty());
        let mode = if endpoint.is_hedged() { "hedged" } else { "single" };
        let span = tracing::info_span!(
            "dispatch",
            id = %Uuid::new_v4(),
            endpoint = %endpoint,
            mode,
            login_type = %form.login_type(),
        );

        let result = async {
            if endpoint.is_hedged() {
                self.dispatch_hedged(form, preferred, endpoint).await
            } else {
                self.dispatch_single(form, preferred, endpoint).await
            }
        }
        .instrument(span)
        .await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.label(),
        };
        metrics::record_dispatch(mode, outcome, start);
        result
    }

    async fn dispatch_single(
        &self,
        form: &FormPayload,
        preferred: Option<&str>,
        endpoint: &Endpoint,
    ) -> Result<Value, DispatchError> {
        let node = match preferred {
            Some(node) => node.to_string(),
            None => self
                .balance
                .pick_node(form.login_type())
                .ok_or(DispatchError::NoNodeAvailable)?,
        };

        // Never cancelled: single-node calls run to completion.
        let cancel = CancellationToken::new();
        match self.transport.post_form(&node, endpoint, form, &cancel).await {
            Ok(rc) => {
                if rc.verdict() == Verdict::NodeFailure {
                    tracing::warn!(node = %node, code = rc.code, message = %rc.message, "Funnel call failed");
                }
                interpret(rc)
            }
            Err(e) => {
                tracing::warn!(node = %node, error = %e, "Funnel request failed");
                Err(DispatchError::ServerError)
            }
        }
    }

    async fn dispatch_hedged(
        &self,
        form: &FormPayload,
        preferred: Option<&str>,
        endpoint: &Endpoint,
    ) -> Result<Value, DispatchError> {
        let login_type = form.login_type();
        let candidates = hedge::order_candidates(self.balance.list(login_type), preferred);
        if candidates.is_empty() {
            tracing::warn!("No healthy funnel node for hedged dispatch");
            return Err(DispatchError::NoNodeAvailable);
        }

        tracing::debug!(candidates = candidates.len(), "Hedging across funnel nodes");
        hedge::race(
            self.transport.clone(),
            self.balance.clone(),
            login_type,
            endpoint,
            form,
            candidates,
        )
        .await
    }
}
