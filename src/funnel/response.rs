//! Funnel response envelope and status codes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Business status codes returned inside the envelope.
pub mod code {
    pub const SUCCESS: i64 = 200;
    pub const INVALID_ARGS: i64 = 410;
    pub const WRONG_PASSWORD: i64 = 412;
    /// Node overloaded or captcha solving failed.
    pub const CAPTCHA_FAILED: i64 = 413;
    pub const SESSION_EXPIRED: i64 = 414;
    pub const OAUTH_ERROR: i64 = 415;
    pub const OAUTH_NOT_UPDATED: i64 = 416;
}

/// Envelope every funnel node answers with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunnelResponse {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Value,
}

/// How the dispatcher reads a response code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Success,
    WrongPassword,
    OAuthNotUpdated,
    /// 410, 413, 414, 415 and anything unrecognised.
    NodeFailure,
}

impl Verdict {
    /// Terminal verdicts end a hedge race and prove the node is healthy.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Verdict::NodeFailure)
    }
}

impl FunnelResponse {
    pub fn verdict(&self) -> Verdict {
        match self.code {
            code::SUCCESS => Verdict::Success,
            code::WRONG_PASSWORD => Verdict::WrongPassword,
            code::OAUTH_NOT_UPDATED => Verdict::OAuthNotUpdated,
            _ => Verdict::NodeFailure,
        }
    }
}
