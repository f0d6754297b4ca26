//! Route-level authorization for the HTTP API.
//!
//! [`permissions::Permission`] names what each route needs and
//! [`guard::require_permission`] enforces it before the handler runs.
pub mod guard;
pub mod permissions;

pub use guard::{RouteGuard, require_permission};
pub use permissions::Permission;
