use crate::{AuthError, AuthResult, ClaimSet};

/// Decide whether `claims` grants `required`.
///
/// An empty `required` string means the route needs no permission and always
/// passes. Matching is exact; there are no wildcards.
///
/// # Errors
/// - [`AuthError::ClaimsMissingPermissions`] when the token has no
///   `permissions` claim at all.
/// - [`AuthError::PermissionDenied`] when the claim exists but lacks
///   `required`.
pub fn check_permission(required: &str, claims: &ClaimSet) -> AuthResult<()> {
    if required.is_empty() {
        return Ok(());
    }
    let granted = claims
        .permissions()
        .ok_or(AuthError::ClaimsMissingPermissions)?;
    if granted.contains(&required) {
        Ok(())
    } else {
        Err(AuthError::PermissionDenied(required.to_string()))
    }
}
