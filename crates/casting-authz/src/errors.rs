use thiserror::Error;

/// Reasons a request can be refused by the authorization pipeline.
///
/// Each variant maps to a stable wire `code` and a human readable
/// `description`. The HTTP layer picks the status from the variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("authorization header missing")]
    MissingHeader,
    #[error("malformed authorization header: {0}")]
    MalformedHeader(&'static str),
    /// The token could not be decoded or its signature did not verify.
    #[error("unable to parse token")]
    UnparsableToken,
    /// The token decoded but its header cannot be used for verification.
    #[error("invalid token header: {0}")]
    InvalidHeader(&'static str),
    #[error("token expired")]
    TokenExpired,
    #[error("audience or issuer mismatch")]
    InvalidClaims,
    #[error("permissions claim missing")]
    ClaimsMissingPermissions,
    #[error("permission {0} not granted")]
    PermissionDenied(String),
    #[error("issuer domain or audience not configured")]
    Misconfigured,
    #[error("key provider unavailable: {0}")]
    KeyProviderUnavailable(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

pub(crate) const MUST_START_WITH_BEARER: &str = "Authorization header must start with Bearer.";
pub(crate) const TOKEN_NOT_FOUND: &str = "Token not found.";
pub(crate) const MUST_BE_BEARER_TOKEN: &str = "Authorization header must be Bearer token.";
pub(crate) const USE_RS256: &str = "Invalid header. Use an RS256 signed JWT Access Token.";
pub(crate) const AUTHORIZATION_MALFORMED: &str = "Authorization malformed.";
pub(crate) const NO_MATCHING_KEY: &str = "Unable to find the appropriate key.";

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::MissingHeader => "authorization_header_missing",
            AuthError::MalformedHeader(_)
            | AuthError::UnparsableToken
            | AuthError::InvalidHeader(_) => "invalid_header",
            AuthError::TokenExpired => "token_expired",
            AuthError::InvalidClaims | AuthError::ClaimsMissingPermissions => "invalid_claims",
            AuthError::PermissionDenied(_) => "unauthorized",
            AuthError::Misconfigured => "misconfigured",
            AuthError::KeyProviderUnavailable(_) => "key_provider_unavailable",
        }
    }

    /// Client-facing explanation. Never includes token or key material.
    pub fn description(&self) -> &'static str {
        match self {
            AuthError::MissingHeader => "Authorization header is expected.",
            AuthError::MalformedHeader(detail) | AuthError::InvalidHeader(detail) => detail,
            AuthError::UnparsableToken => "Unable to parse authentication token.",
            AuthError::TokenExpired => "Token expired.",
            AuthError::InvalidClaims => "Incorrect claims. Check the audience and issuer.",
            AuthError::ClaimsMissingPermissions => "Permissions not included in JWT.",
            AuthError::PermissionDenied(_) => "Permission not found.",
            AuthError::Misconfigured => "AUTH0_DOMAIN and API_AUDIENCE must be configured.",
            AuthError::KeyProviderUnavailable(_) => "Unable to fetch token signing keys.",
        }
    }

    /// True when the failure is caused by server state rather than the caller.
    pub fn is_server_fault(&self) -> bool {
        matches!(
            self,
            AuthError::Misconfigured | AuthError::KeyProviderUnavailable(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_failure_kind() {
        assert_eq!(AuthError::MissingHeader.code(), "authorization_header_missing");
        assert_eq!(
            AuthError::MalformedHeader(TOKEN_NOT_FOUND).code(),
            "invalid_header"
        );
        assert_eq!(AuthError::UnparsableToken.code(), "invalid_header");
        assert_eq!(AuthError::InvalidHeader(NO_MATCHING_KEY).code(), "invalid_header");
        assert_eq!(AuthError::TokenExpired.code(), "token_expired");
        assert_eq!(AuthError::InvalidClaims.code(), "invalid_claims");
        assert_eq!(AuthError::ClaimsMissingPermissions.code(), "invalid_claims");
        assert_eq!(
            AuthError::PermissionDenied("post:actors".into()).code(),
            "unauthorized"
        );
        assert_eq!(AuthError::Misconfigured.code(), "misconfigured");
        assert_eq!(
            AuthError::KeyProviderUnavailable("timeout".into()).code(),
            "key_provider_unavailable"
        );
    }

    #[test]
    fn descriptions_carry_header_detail() {
        assert_eq!(
            AuthError::MalformedHeader(MUST_START_WITH_BEARER).description(),
            "Authorization header must start with Bearer."
        );
        assert_eq!(
            AuthError::InvalidHeader(USE_RS256).description(),
            "Invalid header. Use an RS256 signed JWT Access Token."
        );
    }

    #[test]
    fn server_faults_are_flagged() {
        assert!(AuthError::Misconfigured.is_server_fault());
        assert!(AuthError::KeyProviderUnavailable("down".into()).is_server_fault());
        assert!(!AuthError::TokenExpired.is_server_fault());
        assert!(!AuthError::PermissionDenied("get:movies".into()).is_server_fault());
    }

    #[test]
    fn key_provider_detail_stays_out_of_description() {
        let err = AuthError::KeyProviderUnavailable("connect refused 10.0.0.1".into());
        assert!(!err.description().contains("10.0.0.1"));
        assert!(err.to_string().contains("10.0.0.1"));
    }
}
