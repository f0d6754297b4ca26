//! Cast membership handlers.
//!
//! Reading a cast requires the read permission of the entity in the path.
//! Linking and unlinking count as editing the movie, so both need
//! `patch:movies`.
use crate::api::error::{ApiError, store_error};
use crate::api::path_ids;
use crate::api::types::{ActorFilmographyResponse, MovieCastResponse};
use crate::app::AppState;
use crate::model::MovieCast;
use axum::Json;
use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};

fn cast_response(cast: MovieCast) -> Json<MovieCastResponse> {
    Json(MovieCastResponse {
        success: true,
        movie: cast.movie,
        actors: cast.actors,
    })
}

#[utoipa::path(
    get,
    path = "/api/movies/{id}/actors",
    tag = "cast",
    security(("bearer" = ["get:movies"])),
    params(("id" = i64, Path, description = "Movie id")),
    responses(
        (status = 200, description = "Movie with its cast", body = MovieCastResponse),
        (status = 404, description = "Movie not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn movie_cast(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<MovieCastResponse>, ApiError> {
    let movie_id = path_ids(path)?;
    state
        .store
        .movie_cast(movie_id)
        .await
        .map(cast_response)
        .map_err(|err| store_error(err, "movie not found", "failed to load cast"))
}

#[utoipa::path(
    put,
    path = "/api/movies/{id}/actors/{actor_id}",
    tag = "cast",
    security(("bearer" = ["patch:movies"])),
    params(
        ("id" = i64, Path, description = "Movie id"),
        ("actor_id" = i64, Path, description = "Actor id")
    ),
    responses(
        (status = 200, description = "Actor cast in movie", body = MovieCastResponse),
        (status = 404, description = "Movie or actor not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn add_cast_member(
    State(state): State<AppState>,
    path: Result<Path<(i64, i64)>, PathRejection>,
) -> Result<Json<MovieCastResponse>, ApiError> {
    let (movie_id, actor_id) = path_ids(path)?;
    match state.store.add_cast_member(movie_id, actor_id).await {
        Ok(cast) => {
            tracing::info!(movie_id, actor_id, "cast member added");
            Ok(cast_response(cast))
        }
        Err(err) => Err(store_error(
            err,
            "movie or actor not found",
            "failed to add cast member",
        )),
    }
}

#[utoipa::path(
    delete,
    path = "/api/movies/{id}/actors/{actor_id}",
    tag = "cast",
    security(("bearer" = ["patch:movies"])),
    params(
        ("id" = i64, Path, description = "Movie id"),
        ("actor_id" = i64, Path, description = "Actor id")
    ),
    responses(
        (status = 200, description = "Actor removed from cast", body = MovieCastResponse),
        (status = 404, description = "Movie, actor or cast member not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn remove_cast_member(
    State(state): State<AppState>,
    path: Result<Path<(i64, i64)>, PathRejection>,
) -> Result<Json<MovieCastResponse>, ApiError> {
    let (movie_id, actor_id) = path_ids(path)?;
    match state.store.remove_cast_member(movie_id, actor_id).await {
        Ok(cast) => {
            tracing::info!(movie_id, actor_id, "cast member removed");
            Ok(cast_response(cast))
        }
        Err(err) => Err(store_error(
            err,
            "cast member not found",
            "failed to remove cast member",
        )),
    }
}

#[utoipa::path(
    get,
    path = "/api/actors/{id}/movies",
    tag = "cast",
    security(("bearer" = ["get:actors"])),
    params(("id" = i64, Path, description = "Actor id")),
    responses(
        (status = 200, description = "Actor with their movies", body = ActorFilmographyResponse),
        (status = 404, description = "Actor not found", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn actor_filmography(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<ActorFilmographyResponse>, ApiError> {
    let actor_id = path_ids(path)?;
    let filmography = state
        .store
        .actor_filmography(actor_id)
        .await
        .map_err(|err| store_error(err, "actor not found", "failed to load filmography"))?;
    Ok(Json(ActorFilmographyResponse {
        success: true,
        actor: filmography.actor,
        movies: filmography.movies,
    }))
}
