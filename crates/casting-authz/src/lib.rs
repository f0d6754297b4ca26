//! Bearer-token authorization primitives for the casting agency API.
//!
//! # Purpose
//! Turns an inbound `Authorization` header into a verified claim set and
//! decides whether that claim set grants a route's required permission.
//!
//! # How it fits
//! The HTTP service wraps every protected route with a guard that calls
//! [`Authorizer::authorize`]. The authorizer runs three stages in order:
//! 1. [`bearer_token`] pulls the raw token out of the header.
//! 2. [`TokenVerifier`] fetches the issuer's JWKS, checks the signature and the
//!    `aud`/`iss`/`exp` claims.
//! 3. [`check_permission`] looks for the required string in `permissions`.
//!
//! The first failing stage produces an [`AuthError`]; no later stage runs.
//!
//! # Key invariants
//! - Symmetric (`HS*`) tokens are always rejected.
//! - A claim set only exists after signature verification succeeds.
//! - The key set is fetched on every verification unless a
//!   [`CachingKeyProvider`] is configured.
//!
//! # Examples
//! ```rust
//! use casting_authz::{AuthError, bearer_token};
//!
//! assert_eq!(bearer_token(Some("Bearer abc")), Ok("abc"));
//! assert_eq!(bearer_token(None), Err(AuthError::MissingHeader));
//! ```

mod authorizer;
mod claims;
mod errors;
mod extract;
mod gate;
mod jwks;
mod provider;
mod verifier;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use authorizer::{Authorizer, GuardStage};
pub use claims::ClaimSet;
pub use errors::{AuthError, AuthResult};
pub use extract::bearer_token;
pub use gate::check_permission;
pub use jwks::{Jwk, Jwks};
pub use provider::{CachingKeyProvider, HttpKeyProvider, KeyProvider, jwks_url_for};
pub use verifier::{AuthConfig, TokenVerifier};
