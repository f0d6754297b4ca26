use crate::{AuthResult, ClaimSet, TokenVerifier, bearer_token, check_permission};

/// Progress of a single request through the authorization pipeline.
///
/// A rejection is reported together with the last stage that completed, so
/// `Start` means the header itself was the problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardStage {
    Start,
    HeaderExtracted,
    Verified,
    Authorized,
}

impl GuardStage {
    pub fn as_str(self) -> &'static str {
        match self {
            GuardStage::Start => "start",
            GuardStage::HeaderExtracted => "header_extracted",
            GuardStage::Verified => "verified",
            GuardStage::Authorized => "authorized",
        }
    }
}

impl std::fmt::Display for GuardStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runs extraction, verification and the permission check in order.
///
/// Holds no per-request state; one instance is shared by every route.
#[derive(Debug, Clone)]
pub struct Authorizer {
    verifier: TokenVerifier,
}

impl Authorizer {
    pub fn new(verifier: TokenVerifier) -> Self {
        Self { verifier }
    }

    pub fn verifier(&self) -> &TokenVerifier {
        &self.verifier
    }

    /// Authorize a request carrying `header` for a route needing `required`.
    ///
    /// Stops at the first failing stage. The claim set is only returned when
    /// every stage passed.
    pub async fn authorize(&self, header: Option<&str>, required: &str) -> AuthResult<ClaimSet> {
        let mut stage = GuardStage::Start;
        let outcome = self.run(header, required, &mut stage).await;
        match &outcome {
            Ok(claims) => tracing::debug!(
                required,
                subject = claims.subject().unwrap_or_default(),
                "request authorized"
            ),
            Err(err) => tracing::info!(
                required,
                stage = %stage,
                code = err.code(),
                error = %err,
                "request rejected"
            ),
        }
        outcome
    }

    async fn run(
        &self,
        header: Option<&str>,
        required: &str,
        stage: &mut GuardStage,
    ) -> AuthResult<ClaimSet> {
        let token = bearer_token(header)?;
        *stage = GuardStage::HeaderExtracted;
        let claims = self.verifier.verify(token).await?;
        *stage = GuardStage::Verified;
        check_permission(required, &claims)?;
        *stage = GuardStage::Authorized;
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        StaticKeyProvider, TEST_AUDIENCE, TEST_DOMAIN, TEST_KID, claims_with_permissions,
        mint_token, test_jwks,
    };
    use crate::{AuthConfig, AuthError};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn authorizer() -> (Authorizer, Arc<AtomicUsize>) {
        let provider = StaticKeyProvider::new(test_jwks());
        let calls = provider.call_counter();
        let verifier = TokenVerifier::new(
            AuthConfig::new(TEST_DOMAIN, TEST_AUDIENCE),
            Arc::new(provider),
        );
        (Authorizer::new(verifier), calls)
    }

    #[tokio::test]
    async fn authorizes_granted_permission() {
        let (authorizer, _) = authorizer();
        let token = mint_token(&claims_with_permissions(&["get:actors"]), Some(TEST_KID));
        let header = format!("Bearer {token}");
        let claims = authorizer
            .authorize(Some(&header), "get:actors")
            .await
            .expect("authorized");
        assert_eq!(claims.permissions(), Some(vec!["get:actors"]));
    }

    #[tokio::test]
    async fn header_failures_skip_key_fetch() {
        let (authorizer, calls) = authorizer();
        assert_eq!(
            authorizer.authorize(None, "get:actors").await,
            Err(AuthError::MissingHeader)
        );
        assert!(matches!(
            authorizer
                .authorize(Some("InvalidFormat token"), "get:actors")
                .await,
            Err(AuthError::MalformedHeader(_))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_permission_is_denied_after_verification() {
        let (authorizer, calls) = authorizer();
        let token = mint_token(&claims_with_permissions(&["get:actors"]), Some(TEST_KID));
        let header = format!("Bearer {token}");
        assert_eq!(
            authorizer.authorize(Some(&header), "post:actors").await,
            Err(AuthError::PermissionDenied("post:actors".to_string()))
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_requirement_only_needs_a_valid_token() {
        let (authorizer, _) = authorizer();
        let mut claims = claims_with_permissions(&[]);
        claims.as_object_mut().expect("object").remove("permissions");
        let token = mint_token(&claims, Some(TEST_KID));
        let header = format!("Bearer {token}");
        assert!(authorizer.authorize(Some(&header), "").await.is_ok());
        assert_eq!(
            authorizer.authorize(Some(&header), "get:actors").await,
            Err(AuthError::ClaimsMissingPermissions)
        );
    }

    #[tokio::test]
    async fn same_request_gets_same_decision() {
        let (authorizer, _) = authorizer();
        let token = mint_token(&claims_with_permissions(&["get:movies"]), Some(TEST_KID));
        let header = format!("Bearer {token}");
        let first = authorizer.authorize(Some(&header), "get:movies").await;
        let second = authorizer.authorize(Some(&header), "get:movies").await;
        assert_eq!(first, second);
    }

    #[test]
    fn stage_names() {
        assert_eq!(GuardStage::Start.to_string(), "start");
        assert_eq!(GuardStage::HeaderExtracted.as_str(), "header_extracted");
        assert_eq!(GuardStage::Verified.as_str(), "verified");
        assert_eq!(GuardStage::Authorized.as_str(), "authorized");
    }
}
