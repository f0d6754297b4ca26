//! API error type and helpers.
//!
//! # Purpose and responsibility
//! Every failure a handler or the request guard can produce is rendered as
//! `{code, description}` with a status that matches the failure kind.
//!
//! # Key invariants
//! - Authorization failures keep the code chosen by `casting-authz`; only the
//!   HTTP status is decided here.
//! - Internal errors log details server-side and return a generic description.
use crate::api::types::ErrorResponse;
use crate::model::ValidationError;
use crate::store::StoreError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use casting_authz::AuthError;

/// Structured API error returned by handlers and the guard.
///
/// # Example
/// ```rust
/// use axum::http::StatusCode;
/// use casting_api::api::error::ApiError;
/// use casting_api::api::types::ErrorResponse;
///
/// let err = ApiError {
///     status: StatusCode::NOT_FOUND,
///     body: ErrorResponse {
///         code: "not_found".to_string(),
///         description: "movie not found".to_string(),
///     },
/// };
/// assert_eq!(err.body.code, "not_found");
/// ```
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    fn new(status: StatusCode, code: &str, description: &str) -> Self {
        Self {
            status,
            body: ErrorResponse {
                code: code.to_string(),
                description: description.to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let status = match &err {
            AuthError::MissingHeader
            | AuthError::MalformedHeader(_)
            | AuthError::InvalidHeader(_)
            | AuthError::TokenExpired
            | AuthError::InvalidClaims => StatusCode::UNAUTHORIZED,
            AuthError::UnparsableToken | AuthError::ClaimsMissingPermissions => {
                StatusCode::BAD_REQUEST
            }
            AuthError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AuthError::Misconfigured | AuthError::KeyProviderUnavailable(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        ApiError::new(status, err.code(), err.description())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        api_validation_error(&err.to_string())
    }
}

pub fn api_not_found(description: &str) -> ApiError {
    ApiError::new(StatusCode::NOT_FOUND, "not_found", description)
}

/// 422 with code `validation_error`.
pub fn api_validation_error(description: &str) -> ApiError {
    ApiError::new(
        StatusCode::UNPROCESSABLE_ENTITY,
        "validation_error",
        description,
    )
}

/// Build a 500 from a store error.
///
/// The store error is logged; the response only carries `description`.
pub fn api_internal(description: &str, err: &StoreError) -> ApiError {
    tracing::error!(error = ?err, "casting storage error");
    ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", description)
}

/// Map a store error for an entity lookup: `NotFound` becomes 404 with
/// `not_found_description`, anything else a generic 500.
pub(crate) fn store_error(
    err: StoreError,
    not_found_description: &str,
    internal_description: &str,
) -> ApiError {
    match err {
        StoreError::NotFound(_) => api_not_found(not_found_description),
        err => api_internal(internal_description, &err),
    }
}
