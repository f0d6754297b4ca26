use serde::{Deserialize, Serialize};

/// One public key as published in a JWKS document.
///
/// Fields other than `kty` are optional so that sets mixing RSA and EC keys
/// (or carrying `x5c` chains) still deserialize. Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    pub kty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub use_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
}

impl Jwk {
    pub fn rsa(kid: impl Into<String>, n: impl Into<String>, e: impl Into<String>) -> Self {
        Self {
            kty: "RSA".to_string(),
            kid: Some(kid.into()),
            use_field: Some("sig".to_string()),
            alg: Some("RS256".to_string()),
            n: Some(n.into()),
            e: Some(e.into()),
        }
    }

    /// Modulus and exponent, when this is an RSA key that carries both.
    pub fn rsa_components(&self) -> Option<(&str, &str)> {
        if self.kty != "RSA" {
            return None;
        }
        Some((self.n.as_deref()?, self.e.as_deref()?))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwks {
    pub keys: Vec<Jwk>,
}

impl Jwks {
    /// First RSA key whose `kid` matches. Keys of other types are skipped.
    pub fn find_rsa(&self, kid: &str) -> Option<&Jwk> {
        self.keys
            .iter()
            .find(|key| key.kty == "RSA" && key.kid.as_deref() == Some(kid))
    }
}
