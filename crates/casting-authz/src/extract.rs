use crate::errors::{MUST_BE_BEARER_TOKEN, MUST_START_WITH_BEARER, TOKEN_NOT_FOUND};
use crate::{AuthError, AuthResult};

/// Pull the bare token out of an `Authorization` header value.
///
/// The value is split on whitespace. The first part must be `Bearer` (any
/// case) and exactly one more part must follow it.
///
/// # Errors
/// - [`AuthError::MissingHeader`] when `header` is `None`.
/// - [`AuthError::MalformedHeader`] for a wrong scheme, a missing token, or
///   extra trailing parts.
pub fn bearer_token(header: Option<&str>) -> AuthResult<&str> {
    let header = header.ok_or(AuthError::MissingHeader)?;
    let mut parts = header.split_whitespace();
    match parts.next() {
        Some(scheme) if scheme.eq_ignore_ascii_case("bearer") => {}
        _ => return Err(AuthError::MalformedHeader(MUST_START_WITH_BEARER)),
    }
    let token = parts
        .next()
        .ok_or(AuthError::MalformedHeader(TOKEN_NOT_FOUND))?;
    if parts.next().is_some() {
        return Err(AuthError::MalformedHeader(MUST_BE_BEARER_TOKEN));
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_token_for_well_formed_header() {
        assert_eq!(bearer_token(Some("Bearer abc.def.ghi")), Ok("abc.def.ghi"));
    }

    #[test]
    fn scheme_is_case_insensitive() {
        assert_eq!(bearer_token(Some("bearer tok")), Ok("tok"));
        assert_eq!(bearer_token(Some("BEARER tok")), Ok("tok"));
    }

    #[test]
    fn tolerates_surrounding_whitespace() {
        assert_eq!(bearer_token(Some("  Bearer   tok  ")), Ok("tok"));
    }

    #[test]
    fn missing_header() {
        assert_eq!(bearer_token(None), Err(AuthError::MissingHeader));
    }

    #[test]
    fn wrong_scheme() {
        assert_eq!(
            bearer_token(Some("InvalidFormat token")),
            Err(AuthError::MalformedHeader(MUST_START_WITH_BEARER))
        );
        assert_eq!(
            bearer_token(Some("Basic dXNlcjpwYXNz")),
            Err(AuthError::MalformedHeader(MUST_START_WITH_BEARER))
        );
    }

    #[test]
    fn empty_header_is_wrong_scheme() {
        assert_eq!(
            bearer_token(Some("")),
            Err(AuthError::MalformedHeader(MUST_START_WITH_BEARER))
        );
        assert_eq!(
            bearer_token(Some("   ")),
            Err(AuthError::MalformedHeader(MUST_START_WITH_BEARER))
        );
    }

    #[test]
    fn scheme_without_token() {
        assert_eq!(
            bearer_token(Some("Bearer")),
            Err(AuthError::MalformedHeader(TOKEN_NOT_FOUND))
        );
    }

    #[test]
    fn extra_parts() {
        assert_eq!(
            bearer_token(Some("Bearer one two")),
            Err(AuthError::MalformedHeader(MUST_BE_BEARER_TOKEN))
        );
    }
}
