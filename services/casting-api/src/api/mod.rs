//! HTTP API module.
//!
//! Handler modules for movies, actors and cast membership, plus the shared
//! error type, payload shapes and the OpenAPI document.
pub mod actors;
pub mod cast;
pub mod error;
pub mod movies;
pub mod openapi;
pub mod system;
pub mod types;

use crate::api::error::{ApiError, api_not_found, api_validation_error};
use axum::Json;
use axum::extract::Path;
use axum::extract::rejection::{JsonRejection, PathRejection};

/// Unwrap a JSON body, reporting a malformed one as a validation error.
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value).map_err(|rejection| {
        tracing::debug!(error = %rejection, "rejected request body");
        api_validation_error(&rejection.body_text())
    })
}

/// Ids in paths are integers; anything else names no resource.
pub(crate) fn path_ids<T>(path: Result<Path<T>, PathRejection>) -> Result<T, ApiError> {
    path.map(|Path(ids)| ids)
        .map_err(|_| api_not_found("resource not found"))
}
