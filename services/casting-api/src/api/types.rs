//! HTTP API response envelopes.
//!
//! Success bodies carry `success: true` next to the payload; errors use
//! [`ErrorResponse`].
use crate::model::{Actor, Movie};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub code: String,
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct HealthStatus {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IndexResponse {
    pub success: bool,
    pub message: String,
    pub endpoints: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MovieListResponse {
    pub success: bool,
    pub movies: Vec<Movie>,
    pub total_movies: usize,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MovieResponse {
    pub success: bool,
    pub movie: Movie,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ActorListResponse {
    pub success: bool,
    pub actors: Vec<Actor>,
    pub total_actors: usize,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ActorResponse {
    pub success: bool,
    pub actor: Actor,
}

/// Returned by both delete endpoints; `deleted` is the removed id.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DeletedResponse {
    pub success: bool,
    pub deleted: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MovieCastResponse {
    pub success: bool,
    pub movie: Movie,
    pub actors: Vec<Actor>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ActorFilmographyResponse {
    pub success: bool,
    pub actor: Actor,
    pub movies: Vec<Movie>,
}
