//! Hedged fan-out across every healthy node.
//!
//! # Data Flow
//! ```text
//! candidates (preferred first)
//!     → one task per candidate, all sharing one CancellationToken
//!     → each task: call node → publish report (bounded channel, capacity = candidates)
//!     → consumer: first terminal verdict wins, cancels the rest
//!     → non-terminal reports feed the breaker and keep the race going
//! ```
//!
//! # Design Decisions
//! - Reports caused by cancellation are dropped without breaker feedback
//! - A panicking branch counts as a failure of its node and nothing else
//! - Returning for any reason cancels outstanding branches (drop guard)

use futures_util::FutureExt;
use serde_json::Value;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::dispatch::error::DispatchError;
use crate::dispatch::interpret;
use crate::funnel::{CallError, Endpoint, FormPayload, FunnelResponse, FunnelTransport, LoginType};
use crate::load_balancer::LoadBalance;

/// Put `preferred` first: moved if already a candidate, prepended otherwise.
pub fn order_candidates(mut candidates: Vec<String>, preferred: Option<&str>) -> Vec<String> {
    let Some(preferred) = preferred else {
        return candidates;
    };
    match candidates.iter().position(|n| n == preferred) {
        Some(0) => {}
        Some(idx) => {
            let node = candidates.remove(idx);
            candidates.insert(0, node);
        }
        None => candidates.insert(0, preferred.to_string()),
    }
    candidates
}

/// Everything a branch needs, shared across the fan-out.
struct Race {
    transport: Arc<dyn FunnelTransport>,
    balance: Arc<LoadBalance>,
    login_type: LoginType,
    endpoint: Endpoint,
    form: FormPayload,
    cancel: CancellationToken,
}

struct Report {
    node: String,
    outcome: Result<FunnelResponse, CallError>,
}

/// Race `candidates` and return the first terminal outcome.
///
/// `candidates` must not be empty.
pub async fn race(
    transport: Arc<dyn FunnelTransport>,
    balance: Arc<LoadBalance>,
    login_type: LoginType,
    endpoint: &Endpoint,
    form: &FormPayload,
    candidates: Vec<String>,
) -> Result<Value, DispatchError> {
    let cancel = CancellationToken::new();
    let _cancel_on_return = cancel.clone().drop_guard();

    let race = Arc::new(Race {
        transport,
        balance: balance.clone(),
        login_type,
        endpoint: endpoint.clone(),
        form: form.clone(),
        cancel: cancel.clone(),
    });

    let (tx, mut rx) = mpsc::channel(candidates.len().max(1));
    for node in candidates {
        tokio::spawn(run_branch(race.clone(), node, tx.clone()));
    }
    drop(tx);

    let mut pending: Option<DispatchError> = None;

    while let Some(report) = rx.recv().await {
        let rc = match report.outcome {
            Ok(rc) => rc,
            Err(CallError::Cancelled) => continue,
            Err(CallError::Request(reason)) => {
                tracing::warn!(node = %report.node, error = %reason, "Funnel node request failed");
                balance.fail(&report.node, login_type);
                pending.get_or_insert(DispatchError::ServerError);
                continue;
            }
        };

        let verdict = rc.verdict();
        if verdict.is_terminal() {
            cancel.cancel();
            balance.success(&report.node, login_type);
            tracing::debug!(node = %report.node, code = rc.code, "Hedge won");
            return interpret(rc);
        }

        tracing::warn!(
            node = %report.node,
            code = rc.code,
            message = %rc.message,
            "Funnel node answered with a non-terminal code"
        );
        balance.fail(&report.node, login_type);
        pending.get_or_insert(DispatchError::ServerError);
    }

    tracing::warn!("All hedge candidates failed");
    Err(pending.unwrap_or(DispatchError::ServerError))
}

async fn run_branch(race: Arc<Race>, node: String, tx: mpsc::Sender<Report>) {
    if race.cancel.is_cancelled() {
        return;
    }

    let call = race
        .transport
        .post_form(&node, &race.endpoint, &race.form, &race.cancel);

    let outcome = match AssertUnwindSafe(call).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(_) => {
            tracing::error!(node = %node, "Hedge branch panicked, counting as node failure");
            race.balance.fail(&node, race.login_type);
            return;
        }
    };

    tokio::select! {
        biased;
        _ = race.cancel.cancelled() => {}
        _ = tx.send(Report { node, outcome }) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nodes(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_order_without_preferred() {
        assert_eq!(order_candidates(nodes(&["a", "b"]), None), nodes(&["a", "b"]));
    }

    #[test]
    fn test_order_moves_existing_to_front() {
        assert_eq!(
            order_candidates(nodes(&["a", "b", "c"]), Some("c")),
            nodes(&["c", "a", "b"])
        );
        assert_eq!(
            order_candidates(nodes(&["a", "b", "c"]), Some("a")),
            nodes(&["a", "b", "c"])
        );
    }

    #[test]
    fn test_order_prepends_missing() {
        assert_eq!(
            order_candidates(nodes(&["a", "b"]), Some("x")),
            nodes(&["x", "a", "b"])
        );
        assert_eq!(order_candidates(Vec::new(), Some("x")), nodes(&["x"]));
    }
}
