use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Decoded claims of a verified token.
///
/// Only [`crate::TokenVerifier`] builds one from a token, so holding a
/// `ClaimSet` implies the signature, audience, issuer and expiry checked out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimSet(Map<String, Value>);

impl ClaimSet {
    pub fn new(claims: Map<String, Value>) -> Self {
        Self(claims)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn subject(&self) -> Option<&str> {
        self.string_claim("sub")
    }

    pub fn issuer(&self) -> Option<&str> {
        self.string_claim("iss")
    }

    /// Entries of the `permissions` claim.
    ///
    /// Returns `None` when the claim is absent. A present claim that is not an
    /// array, and non-string array items, grant nothing.
    pub fn permissions(&self) -> Option<Vec<&str>> {
        let value = self.0.get("permissions")?;
        Some(
            value
                .as_array()
                .map(|items| items.iter().filter_map(Value::as_str).collect())
                .unwrap_or_default(),
        )
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    fn string_claim(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }
}

impl From<Map<String, Value>> for ClaimSet {
    fn from(claims: Map<String, Value>) -> Self {
        Self(claims)
    }
}
