//! Per-route request guard.
//!
//! # Purpose
//! Wraps a handler so it only runs once the caller's bearer token has been
//! verified and shown to carry the route's permission.
//!
//! # Key invariants
//! - On rejection the handler is never invoked, so no store call happens.
//! - The verified [`ClaimSet`] is placed in request extensions for handlers
//!   that want the caller identity.
//! - Each guarded request increments `casting_auth_decisions_total` exactly
//!   once.
use crate::api::error::ApiError;
use crate::auth::Permission;
use crate::observability;
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use casting_authz::Authorizer;

/// State for one guarded route: the shared authorizer plus the permission
/// that route requires.
#[derive(Debug, Clone)]
pub struct RouteGuard {
    authorizer: Authorizer,
    permission: Permission,
}

impl RouteGuard {
    pub fn new(authorizer: Authorizer, permission: Permission) -> Self {
        Self {
            authorizer,
            permission,
        }
    }
}

/// Axum middleware used with `middleware::from_fn_with_state`.
pub async fn require_permission(
    State(guard): State<RouteGuard>,
    mut request: Request,
    next: Next,
) -> Response {
    // A non-UTF-8 header cannot start with "Bearer"; treat it as empty.
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .map(|value| value.to_str().unwrap_or_default().to_string());

    match guard
        .authorizer
        .authorize(header.as_deref(), guard.permission.as_str())
        .await
    {
        Ok(claims) => {
            observability::record_auth_decision("authorized", "ok");
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(err) => {
            observability::record_auth_decision("rejected", err.code());
            if err.is_server_fault() {
                tracing::error!(
                    permission = %guard.permission,
                    error = %err,
                    "authorization unavailable"
                );
            }
            ApiError::from(err).into_response()
        }
    }
}
