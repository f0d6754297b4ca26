//! Signature and claim verification for bearer tokens.
//!
//! # Purpose
//! Validate a raw JWT against the issuer's published RSA keys and the
//! configured audience, then hand back the decoded claims.
//!
//! # Verification order
//! 1. Refuse to run without an issuer domain and audience.
//! 2. Fetch the issuer's key set.
//! 3. Decode the unverified header for `alg` and `kid`.
//! 4. Reject symmetric algorithms and algorithms outside the allow-list.
//! 5. Locate the RSA key with the token's `kid`.
//! 6. Verify the signature, `exp`, `aud` and `iss`.
//!
//! # Security
//! - The algorithm used for verification comes from the allow-list, never
//!   from the token alone.
//! - The decoded claims are only exposed after step 6 succeeds.
use crate::errors::{AUTHORIZATION_MALFORMED, NO_MATCHING_KEY, USE_RS256};
use crate::{AuthError, AuthResult, ClaimSet, Jwks, KeyProvider};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Header, Validation, decode, decode_header};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Issuer, audience and algorithm policy for token verification.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthConfig {
    /// Bare issuer host such as `tenant.auth0.com`.
    pub issuer_domain: Option<String>,
    pub audience: Option<String>,
    pub allowed_algorithms: Vec<Algorithm>,
    /// Clock skew tolerated for `exp`, in seconds.
    pub leeway_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            issuer_domain: None,
            audience: None,
            allowed_algorithms: vec![Algorithm::RS256],
            leeway_secs: 0,
        }
    }
}

impl AuthConfig {
    pub fn new(issuer_domain: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            issuer_domain: Some(issuer_domain.into()),
            audience: Some(audience.into()),
            ..Self::default()
        }
    }

    /// Expected `iss` claim: `https://<issuer_domain>/`.
    pub fn issuer(&self) -> Option<String> {
        self.issuer_domain
            .as_deref()
            .map(|domain| format!("https://{}/", domain.trim_end_matches('/')))
    }

    pub fn is_configured(&self) -> bool {
        let present = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.is_empty());
        present(&self.issuer_domain) && present(&self.audience)
    }
}

#[derive(Clone)]
pub struct TokenVerifier {
    config: AuthConfig,
    provider: Arc<dyn KeyProvider>,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl TokenVerifier {
    pub fn new(config: AuthConfig, provider: Arc<dyn KeyProvider>) -> Self {
        Self { config, provider }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Verify `token` and return its claims.
    ///
    /// # Errors
    /// - [`AuthError::Misconfigured`] if issuer domain or audience is unset.
    /// - [`AuthError::KeyProviderUnavailable`] if the key set cannot be fetched.
    /// - [`AuthError::UnparsableToken`] for undecodable tokens, algorithms
    ///   outside the allow-list and bad signatures.
    /// - [`AuthError::InvalidHeader`] for `HS*` tokens, a missing `kid` or an
    ///   unknown `kid`.
    /// - [`AuthError::TokenExpired`] and [`AuthError::InvalidClaims`] for
    ///   failed time and audience/issuer checks.
    pub async fn verify(&self, token: &str) -> AuthResult<ClaimSet> {
        let (Some(domain), Some(audience), Some(issuer)) = (
            self.config.issuer_domain.as_deref(),
            self.config.audience.as_deref(),
            self.config.issuer(),
        ) else {
            return Err(AuthError::Misconfigured);
        };
        if !self.config.is_configured() {
            return Err(AuthError::Misconfigured);
        }

        let jwks = self.provider.fetch_keys(domain).await?;
        let header = decode_header(token).map_err(|_| AuthError::UnparsableToken)?;
        self.check_algorithm(&header)?;
        let kid = header
            .kid
            .as_deref()
            .ok_or(AuthError::InvalidHeader(AUTHORIZATION_MALFORMED))?;

        let key = match decoding_key(&jwks, kid)? {
            Some(key) => key,
            None if self.provider.is_cached() => {
                let refreshed = self.provider.refresh_keys(domain).await?;
                decoding_key(&refreshed, kid)?
                    .ok_or(AuthError::InvalidHeader(NO_MATCHING_KEY))?
            }
            None => return Err(AuthError::InvalidHeader(NO_MATCHING_KEY)),
        };

        let mut validation = Validation::new(header.alg);
        validation.set_audience(&[audience]);
        validation.set_issuer(&[issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "aud", "iss"]);
        validation.validate_nbf = true;
        validation.leeway = self.config.leeway_secs;

        let data = decode::<Map<String, Value>>(token, &key, &validation).map_err(classify)?;
        Ok(ClaimSet::new(data.claims))
    }

    fn check_algorithm(&self, header: &Header) -> AuthResult<()> {
        if matches!(
            header.alg,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512
        ) {
            return Err(AuthError::InvalidHeader(USE_RS256));
        }
        if !self.config.allowed_algorithms.contains(&header.alg) {
            return Err(AuthError::UnparsableToken);
        }
        Ok(())
    }
}

fn decoding_key(jwks: &Jwks, kid: &str) -> AuthResult<Option<DecodingKey>> {
    let Some((n, e)) = jwks.find_rsa(kid).and_then(|key| key.rsa_components()) else {
        return Ok(None);
    };
    DecodingKey::from_rsa_components(n, e)
        .map(Some)
        .map_err(|_| AuthError::UnparsableToken)
}

fn classify(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        ErrorKind::InvalidAudience | ErrorKind::InvalidIssuer | ErrorKind::ImmatureSignature => {
            AuthError::InvalidClaims
        }
        ErrorKind::MissingRequiredClaim(claim) if claim == "aud" || claim == "iss" => {
            AuthError::InvalidClaims
        }
        _ => AuthError::UnparsableToken,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        StaticKeyProvider, TEST_AUDIENCE, TEST_DOMAIN, TEST_KID, claims_with_permissions,
        mint_hs256_token, mint_token, now_epoch_seconds, test_jwks,
    };
    use crate::{CachingKeyProvider, Jwk};
    use serde_json::json;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn verifier() -> TokenVerifier {
        TokenVerifier::new(
            AuthConfig::new(TEST_DOMAIN, TEST_AUDIENCE),
            Arc::new(StaticKeyProvider::new(test_jwks())),
        )
    }

    #[tokio::test]
    async fn accepts_valid_token() {
        let token = mint_token(&claims_with_permissions(&["get:movies"]), Some(TEST_KID));
        let claims = verifier().verify(&token).await.expect("valid");
        assert_eq!(claims.permissions(), Some(vec!["get:movies"]));
        assert_eq!(claims.issuer(), Some("https://casting.test.example/"));
        assert_eq!(claims.subject(), Some("auth0|tester"));
    }

    #[tokio::test]
    async fn misconfigured_without_domain_or_audience() {
        let provider = StaticKeyProvider::new(test_jwks());
        let calls = provider.call_counter();
        let verifier = TokenVerifier::new(AuthConfig::default(), Arc::new(provider));
        let token = mint_token(&claims_with_permissions(&[]), Some(TEST_KID));
        assert_eq!(verifier.verify(&token).await, Err(AuthError::Misconfigured));

        let config = AuthConfig::new(TEST_DOMAIN, "");
        let verifier = TokenVerifier::new(config, Arc::new(StaticKeyProvider::new(test_jwks())));
        assert_eq!(verifier.verify(&token).await, Err(AuthError::Misconfigured));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn garbage_token_is_unparsable() {
        assert_eq!(
            verifier().verify("not-a-jwt").await,
            Err(AuthError::UnparsableToken)
        );
    }

    #[tokio::test]
    async fn keys_are_fetched_before_header_is_parsed() {
        let provider = StaticKeyProvider::new(test_jwks());
        let calls = provider.call_counter();
        let verifier = TokenVerifier::new(
            AuthConfig::new(TEST_DOMAIN, TEST_AUDIENCE),
            Arc::new(provider),
        );
        let _ = verifier.verify("not-a-jwt").await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn symmetric_tokens_are_rejected() {
        let token = mint_hs256_token(&claims_with_permissions(&["get:movies"]), Some(TEST_KID));
        assert_eq!(
            verifier().verify(&token).await,
            Err(AuthError::InvalidHeader(USE_RS256))
        );
    }

    #[tokio::test]
    async fn algorithm_outside_allow_list_is_unparsable() {
        let mut config = AuthConfig::new(TEST_DOMAIN, TEST_AUDIENCE);
        config.allowed_algorithms = vec![Algorithm::RS512];
        let verifier = TokenVerifier::new(config, Arc::new(StaticKeyProvider::new(test_jwks())));
        let token = mint_token(&claims_with_permissions(&[]), Some(TEST_KID));
        assert_eq!(verifier.verify(&token).await, Err(AuthError::UnparsableToken));
    }

    #[tokio::test]
    async fn missing_kid_is_malformed() {
        let token = mint_token(&claims_with_permissions(&[]), None);
        assert_eq!(
            verifier().verify(&token).await,
            Err(AuthError::InvalidHeader(AUTHORIZATION_MALFORMED))
        );
    }

    #[tokio::test]
    async fn unknown_kid_has_no_matching_key() {
        let token = mint_token(&claims_with_permissions(&[]), Some("rotated-away"));
        assert_eq!(
            verifier().verify(&token).await,
            Err(AuthError::InvalidHeader(NO_MATCHING_KEY))
        );
    }

    #[tokio::test]
    async fn kid_on_non_rsa_key_has_no_matching_key() {
        let jwks = Jwks {
            keys: vec![Jwk {
                kty: "EC".to_string(),
                kid: Some(TEST_KID.to_string()),
                use_field: Some("sig".to_string()),
                alg: Some("ES256".to_string()),
                n: None,
                e: None,
            }],
        };
        let verifier = TokenVerifier::new(
            AuthConfig::new(TEST_DOMAIN, TEST_AUDIENCE),
            Arc::new(StaticKeyProvider::new(jwks)),
        );
        let token = mint_token(&claims_with_permissions(&[]), Some(TEST_KID));
        assert_eq!(
            verifier.verify(&token).await,
            Err(AuthError::InvalidHeader(NO_MATCHING_KEY))
        );
    }

    #[tokio::test]
    async fn expired_token() {
        let mut claims = claims_with_permissions(&["get:movies"]);
        claims["exp"] = json!(now_epoch_seconds() - 600);
        let token = mint_token(&claims, Some(TEST_KID));
        assert_eq!(verifier().verify(&token).await, Err(AuthError::TokenExpired));
    }

    #[tokio::test]
    async fn leeway_admits_recently_expired_token() {
        let mut config = AuthConfig::new(TEST_DOMAIN, TEST_AUDIENCE);
        config.leeway_secs = 120;
        let verifier = TokenVerifier::new(config, Arc::new(StaticKeyProvider::new(test_jwks())));
        let mut claims = claims_with_permissions(&["get:movies"]);
        claims["exp"] = json!(now_epoch_seconds() - 30);
        let token = mint_token(&claims, Some(TEST_KID));
        assert!(verifier.verify(&token).await.is_ok());
    }

    #[tokio::test]
    async fn not_yet_valid_token_has_invalid_claims() {
        let mut claims = claims_with_permissions(&["get:movies"]);
        claims["nbf"] = json!(now_epoch_seconds() + 3600);
        let token = mint_token(&claims, Some(TEST_KID));
        assert_eq!(verifier().verify(&token).await, Err(AuthError::InvalidClaims));
    }

    #[tokio::test]
    async fn past_not_before_is_accepted() {
        let mut claims = claims_with_permissions(&["get:movies"]);
        claims["nbf"] = json!(now_epoch_seconds() - 60);
        let token = mint_token(&claims, Some(TEST_KID));
        assert!(verifier().verify(&token).await.is_ok());
    }

    #[tokio::test]
    async fn wrong_audience() {
        let mut claims = claims_with_permissions(&["get:movies"]);
        claims["aud"] = json!("someone-else");
        let token = mint_token(&claims, Some(TEST_KID));
        assert_eq!(verifier().verify(&token).await, Err(AuthError::InvalidClaims));
    }

    #[tokio::test]
    async fn audience_list_containing_expected_value_is_accepted() {
        let mut claims = claims_with_permissions(&["get:movies"]);
        claims["aud"] = json!([TEST_AUDIENCE, "https://casting.test.example/userinfo"]);
        let token = mint_token(&claims, Some(TEST_KID));
        assert!(verifier().verify(&token).await.is_ok());
    }

    #[tokio::test]
    async fn wrong_issuer() {
        let mut claims = claims_with_permissions(&["get:movies"]);
        claims["iss"] = json!("https://evil.example/");
        let token = mint_token(&claims, Some(TEST_KID));
        assert_eq!(verifier().verify(&token).await, Err(AuthError::InvalidClaims));
    }

    #[tokio::test]
    async fn missing_audience_claim() {
        let mut claims = claims_with_permissions(&["get:movies"]);
        claims.as_object_mut().expect("object").remove("aud");
        let token = mint_token(&claims, Some(TEST_KID));
        assert_eq!(verifier().verify(&token).await, Err(AuthError::InvalidClaims));
    }

    #[tokio::test]
    async fn tampered_payload_fails_signature() {
        let token = mint_token(&claims_with_permissions(&["get:movies"]), Some(TEST_KID));
        let forged = mint_token(
            &claims_with_permissions(&["get:movies", "delete:movies"]),
            Some(TEST_KID),
        );
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged_payload = forged.split('.').nth(1).expect("payload");
        parts[1] = forged_payload;
        let tampered = parts.join(".");
        assert_ne!(tampered, forged);
        assert_eq!(
            verifier().verify(&tampered).await,
            Err(AuthError::UnparsableToken)
        );
    }

    #[tokio::test]
    async fn provider_failure_propagates() {
        let verifier = TokenVerifier::new(
            AuthConfig::new(TEST_DOMAIN, TEST_AUDIENCE),
            Arc::new(StaticKeyProvider::failing()),
        );
        let token = mint_token(&claims_with_permissions(&[]), Some(TEST_KID));
        assert!(matches!(
            verifier.verify(&token).await,
            Err(AuthError::KeyProviderUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn uncached_provider_is_not_refetched_on_kid_miss() {
        let provider = StaticKeyProvider::new(test_jwks());
        let calls = provider.call_counter();
        let verifier = TokenVerifier::new(
            AuthConfig::new(TEST_DOMAIN, TEST_AUDIENCE),
            Arc::new(provider),
        );
        let token = mint_token(&claims_with_permissions(&[]), Some("unknown"));
        let _ = verifier.verify(&token).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cached_provider_refetches_once_on_kid_miss() {
        let provider = StaticKeyProvider::new(Jwks::default());
        let calls = provider.call_counter();
        let keys = provider.keys_handle();
        let cached = CachingKeyProvider::new(provider, Duration::from_secs(300));
        let verifier = TokenVerifier::new(
            AuthConfig::new(TEST_DOMAIN, TEST_AUDIENCE),
            Arc::new(cached),
        );
        let token = mint_token(&claims_with_permissions(&["get:movies"]), Some(TEST_KID));

        // Prime the cache with an empty key set, then rotate the key in.
        assert_eq!(
            verifier.verify(&token).await,
            Err(AuthError::InvalidHeader(NO_MATCHING_KEY))
        );
        *keys.write().expect("keys lock") = test_jwks();
        let claims = verifier.verify(&token).await.expect("rotated key");
        assert_eq!(claims.permissions(), Some(vec!["get:movies"]));
        // Initial fetch + refresh on the first miss + refresh on the second miss.
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn issuer_is_derived_from_domain() {
        let config = AuthConfig::new("tenant.auth0.com", "casting");
        assert_eq!(config.issuer().as_deref(), Some("https://tenant.auth0.com/"));
        assert!(config.is_configured());
        assert!(!AuthConfig::default().is_configured());
        assert_eq!(AuthConfig::default().allowed_algorithms, vec![Algorithm::RS256]);
    }
}
