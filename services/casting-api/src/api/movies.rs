//! Movie API handlers.
//!
//! Every handler here sits behind the request guard; by the time one runs the
//! caller holds the matching `*:movies` permission.
use crate::api::error::{ApiError, api_internal, store_error};
use crate::api::types::{DeletedResponse, MovieListResponse, MovieResponse};
use crate::api::{json_body, path_ids};
use crate::app::AppState;
use crate::model::{MovieCreateRequest, MoviePatchRequest};
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

#[utoipa::path(
    get,
    path = "/api/movies",
    tag = "movies",
    security(("bearer" = ["get:movies"])),
    responses(
        (status = 200, description = "All movies", body = MovieListResponse),
        (status = 401, description = "Missing or invalid token", body = crate::api::types::ErrorResponse),
        (status = 403, description = "Permission missing", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn list_movies(
    State(state): State<AppState>,
) -> Result<Json<MovieListResponse>, ApiError> {
    let movies = state
        .store
        .list_movies()
        .await
        .map_err(|err| api_internal("failed to list movies", &err))?;
    Ok(Json(MovieListResponse {
        success: true,
        total_movies: movies.len(),
        movies,
    }))
}

#[utoipa::path(
    get,
    path = "/api/movies/{id}",
    tag = "movies",
    security(("bearer" = ["get:movies"])),
    params(("id" = i64, Path, description = "Movie id")),
    responses(
        (status = 200, description = "Movie", body = MovieResponse),
        (status = 404, description = "Movie not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn get_movie(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<MovieResponse>, ApiError> {
    let id = path_ids(path)?;
    match state.store.get_movie(id).await {
        Ok(movie) => Ok(Json(MovieResponse {
            success: true,
            movie,
        })),
        Err(err) => Err(store_error(err, "movie not found", "failed to load movie")),
    }
}

#[utoipa::path(
    post,
    path = "/api/movies",
    tag = "movies",
    security(("bearer" = ["post:movies"])),
    request_body = MovieCreateRequest,
    responses(
        (status = 201, description = "Movie created", body = MovieResponse),
        (status = 422, description = "Invalid movie", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn create_movie(
    State(state): State<AppState>,
    body: Result<Json<MovieCreateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let movie = json_body(body)?.validate()?;
    let movie = state
        .store
        .create_movie(movie)
        .await
        .map_err(|err| api_internal("failed to create movie", &err))?;
    tracing::info!(movie_id = movie.id, "movie created");
    Ok((
        StatusCode::CREATED,
        Json(MovieResponse {
            success: true,
            movie,
        }),
    ))
}

#[utoipa::path(
    patch,
    path = "/api/movies/{id}",
    tag = "movies",
    security(("bearer" = ["patch:movies"])),
    params(("id" = i64, Path, description = "Movie id")),
    request_body = MoviePatchRequest,
    responses(
        (status = 200, description = "Movie updated", body = MovieResponse),
        (status = 404, description = "Movie not found", body = crate::api::types::ErrorResponse),
        (status = 422, description = "Invalid movie", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn update_movie(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<MoviePatchRequest>, JsonRejection>,
) -> Result<Json<MovieResponse>, ApiError> {
    let id = path_ids(path)?;
    let patch = json_body(body)?.validate()?;
    match state.store.update_movie(id, patch).await {
        Ok(movie) => Ok(Json(MovieResponse {
            success: true,
            movie,
        })),
        Err(err) => Err(store_error(err, "movie not found", "failed to update movie")),
    }
}

#[utoipa::path(
    delete,
    path = "/api/movies/{id}",
    tag = "movies",
    security(("bearer" = ["delete:movies"])),
    params(("id" = i64, Path, description = "Movie id")),
    responses(
        (status = 200, description = "Movie deleted", body = DeletedResponse),
        (status = 404, description = "Movie not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn delete_movie(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let id = path_ids(path)?;
    match state.store.delete_movie(id).await {
        Ok(()) => {
            tracing::info!(movie_id = id, "movie deleted");
            Ok(Json(DeletedResponse {
                success: true,
                deleted: id,
            }))
        }
        Err(err) => Err(store_error(err, "movie not found", "failed to delete movie")),
    }
}
