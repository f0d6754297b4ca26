//! Actor API handlers.
//!
//! Every handler here sits behind the request guard; by the time one runs the
//! caller holds the matching `*:actors` permission.
use crate::api::error::{ApiError, api_internal, store_error};
use crate::api::types::{DeletedResponse, ActorListResponse, ActorResponse};
use crate::api::{json_body, path_ids};
use crate::app::AppState;
use crate::model::{ActorCreateRequest, ActorPatchRequest};
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

#[utoipa::path(
    get,
    path = "/api/actors",
    tag = "actors",
    security(("bearer" = ["get:actors"])),
    responses(
        (status = 200, description = "All actors", body = ActorListResponse),
        (status = 401, description = "Missing or invalid token", body = crate::api::types::ErrorResponse),
        (status = 403, description = "Permission missing", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn list_actors(
    State(state): State<AppState>,
) -> Result<Json<ActorListResponse>, ApiError> {
    let actors = state
        .store
        .list_actors()
        .await
        .map_err(|err| api_internal("failed to list actors", &err))?;
    Ok(Json(ActorListResponse {
        success: true,
        total_actors: actors.len(),
        actors,
    }))
}

#[utoipa::path(
    get,
    path = "/api/actors/{id}",
    tag = "actors",
    security(("bearer" = ["get:actors"])),
    params(("id" = i64, Path, description = "Actor id")),
    responses(
        (status = 200, description = "Actor", body = ActorResponse),
        (status = 404, description = "Actor not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn get_actor(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<ActorResponse>, ApiError> {
    let id = path_ids(path)?;
    match state.store.get_actor(id).await {
        Ok(actor) => Ok(Json(ActorResponse {
            success: true,
            actor,
        })),
        Err(err) => Err(store_error(err, "actor not found", "failed to load actor")),
    }
}

#[utoipa::path(
    post,
    path = "/api/actors",
    tag = "actors",
    security(("bearer" = ["post:actors"])),
    request_body = ActorCreateRequest,
    responses(
        (status = 201, description = "Actor created", body = ActorResponse),
        (status = 422, description = "Invalid actor", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn create_actor(
    State(state): State<AppState>,
    body: Result<Json<ActorCreateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = json_body(body)?.validate()?;
    let actor = state
        .store
        .create_actor(actor)
        .await
        .map_err(|err| api_internal("failed to create actor", &err))?;
    tracing::info!(actor_id = actor.id, "actor created");
    Ok((
        StatusCode::CREATED,
        Json(ActorResponse {
            success: true,
            actor,
        }),
    ))
}

#[utoipa::path(
    patch,
    path = "/api/actors/{id}",
    tag = "actors",
    security(("bearer" = ["patch:actors"])),
    params(("id" = i64, Path, description = "Actor id")),
    request_body = ActorPatchRequest,
    responses(
        (status = 200, description = "Actor updated", body = ActorResponse),
        (status = 404, description = "Actor not found", body = crate::api::types::ErrorResponse),
        (status = 422, description = "Invalid actor", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn update_actor(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<ActorPatchRequest>, JsonRejection>,
) -> Result<Json<ActorResponse>, ApiError> {
    let id = path_ids(path)?;
    let patch = json_body(body)?.validate()?;
    match state.store.update_actor(id, patch).await {
        Ok(actor) => Ok(Json(ActorResponse {
            success: true,
            actor,
        })),
        Err(err) => Err(store_error(err, "actor not found", "failed to update actor")),
    }
}

#[utoipa::path(
    delete,
    path = "/api/actors/{id}",
    tag = "actors",
    security(("bearer" = ["delete:actors"])),
    params(("id" = i64, Path, description = "Actor id")),
    responses(
        (status = 200, description = "Actor deleted", body = DeletedResponse),
        (status = 404, description = "Actor not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn delete_actor(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let id = path_ids(path)?;
    match state.store.delete_actor(id).await {
        Ok(()) => {
            tracing::info!(actor_id = id, "actor deleted");
            Ok(Json(DeletedResponse {
                success: true,
                deleted: id,
            }))
        }
        Err(err) => Err(store_error(err, "actor not found", "failed to delete actor")),
    }
}
