//! Funnel API identifiers: login types, endpoints and form payloads.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Endpoints whose identifier contains this marker belong to the ZF family
/// and are dispatched in hedged mode.
pub const HEDGED_ENDPOINT_MARKER: &str = "zf";

/// Login family a request authenticates against.
///
/// Each family has its own node pool. `Unknown` shares the ZF pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginType {
    OAuth,
    Zf,
    Unknown,
}

impl LoginType {
    /// Parse the `type` form field. Matching is case-insensitive; anything
    /// unrecognised becomes `Unknown`.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("oauth") {
            LoginType::OAuth
        } else if raw.eq_ignore_ascii_case("zf") {
            LoginType::Zf
        } else {
            LoginType::Unknown
        }
    }

    /// The pool this login type draws nodes from.
    pub fn pool(self) -> LoginType {
        match self {
            LoginType::OAuth => LoginType::OAuth,
            LoginType::Zf | LoginType::Unknown => LoginType::Zf,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LoginType::OAuth => "oauth",
            LoginType::Zf => "zf",
            LoginType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for LoginType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A funnel endpoint path, appended verbatim to a node address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint(String);

impl Endpoint {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// ZF-family endpoints race every healthy node; everything else goes to
    /// a single node.
    pub fn is_hedged(&self) -> bool {
        self.0.contains(HEDGED_ENDPOINT_MARKER)
    }

    /// Full request URL for `node`.
    pub fn url_for(&self, node: &str) -> String {
        format!("{}{}", node, self.0)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Endpoint {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

/// Form-encoded key/value payload forwarded to a funnel node.
///
/// Keys may repeat; `get` returns the first value, matching form semantics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormPayload(Vec<(String, String)>);

impl FormPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(key, value);
        self
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.push((key.into(), value.into()));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Login type carried in the `type` field.
    pub fn login_type(&self) -> LoginType {
        self.get("type").map(LoginType::parse).unwrap_or(LoginType::Unknown)
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormPayload {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_type_parse() {
        assert_eq!(LoginType::parse("OAUTH"), LoginType::OAuth);
        assert_eq!(LoginType::parse("zf"), LoginType::Zf);
        assert_eq!(LoginType::parse(""), LoginType::Unknown);
        assert_eq!(LoginType::parse("ldap"), LoginType::Unknown);
    }

    #[test]
    fn test_unknown_shares_zf_pool() {
        assert_eq!(LoginType::Unknown.pool(), LoginType::Zf);
        assert_eq!(LoginType::Zf.pool(), LoginType::Zf);
        assert_eq!(LoginType::OAuth.pool(), LoginType::OAuth);
    }

    #[test]
    fn test_endpoint_classification() {
        assert!(Endpoint::new("/student/zf/score").is_hedged());
        assert!(!Endpoint::new("/student/library/borrow").is_hedged());
        assert_eq!(
            Endpoint::new("/student/zf/score").url_for("http://10.0.0.1:8080"),
            "http://10.0.0.1:8080/student/zf/score"
        );
    }

    #[test]
    fn test_form_payload() {
        let form = FormPayload::new()
            .with("username", "2021001")
            .with("type", "OAUTH")
            .with("type", "ZF");

        assert_eq!(form.get("username"), Some("2021001"));
        assert_eq!(form.get("missing"), None);
        assert_eq!(form.login_type(), LoginType::OAuth);
        assert_eq!(FormPayload::new().login_type(), LoginType::Unknown);
    }
}
