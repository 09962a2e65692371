//! Errors surfaced to dispatch callers.

use thiserror::Error;

/// Outcome classes a caller can observe.
///
/// Transport and decode failures never appear here directly; they collapse
/// into `ServerError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// Any node-side failure, or an exhausted hedge.
    #[error("funnel server error")]
    ServerError,

    /// The funnel rejected the credentials (code 412).
    #[error("wrong username or password")]
    WrongPassword,

    /// The unified OAuth password has not been updated (code 416).
    #[error("oauth password not updated")]
    OAuthNotUpdated,

    /// Every node of the requested pool is open or the pool is empty.
    #[error("no funnel node available")]
    NoNodeAvailable,
}

impl DispatchError {
    /// Short label for metrics.
    pub fn label(self) -> &'static str {
        match self {
            DispatchError::ServerError => "server_error",
            DispatchError::WrongPassword => "wrong_password",
            DispatchError::OAuthNotUpdated => "oauth_not_updated",
            DispatchError::NoNodeAvailable => "no_node_available",
        }
    }
}
