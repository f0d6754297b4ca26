//! Domain types shared by the API handlers and storage backends.
//!
//! Request payloads are deserialized loosely (every field optional) and then
//! checked by `validate`, so that a missing field and an out-of-range value
//! both surface as a [`ValidationError`] naming the field.
pub mod actor;
pub mod cast;
pub mod movie;

pub use actor::{Actor, ActorCreateRequest, ActorPatch, ActorPatchRequest, NewActor};
pub use cast::{ActorFilmography, MovieCast};
pub use movie::{Movie, MovieCreateRequest, MoviePatch, MoviePatchRequest, NewMovie};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use thiserror::Error;

pub const MAX_TEXT_LEN: usize = 120;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }

    pub fn missing(field: &'static str) -> Self {
        Self::new(field, "Missing data for required field.")
    }
}

pub(crate) fn required<T>(field: &'static str, value: Option<T>) -> Result<T, ValidationError> {
    value.ok_or_else(|| ValidationError::missing(field))
}

/// Trimmed text between 1 and `max` characters.
pub(crate) fn text(field: &'static str, value: String, max: usize) -> Result<String, ValidationError> {
    let value = value.trim().to_string();
    let len = value.chars().count();
    if len == 0 || len > max {
        return Err(ValidationError::new(
            field,
            format!("Length must be between 1 and {max}."),
        ));
    }
    Ok(value)
}

/// Parse an ISO-8601 timestamp. Offsets are normalized to UTC and a bare
/// date means midnight.
pub(crate) fn timestamp(field: &'static str, value: &str) -> Result<NaiveDateTime, ValidationError> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.naive_utc());
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(parsed);
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(parsed);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| ValidationError::new(field, "Not a valid datetime."))
}
