use super::{Actor, Movie};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A movie with everyone cast in it, actors ordered by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MovieCast {
    pub movie: Movie,
    pub actors: Vec<Actor>,
}

/// An actor with every movie they are cast in, movies ordered by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ActorFilmography {
    pub actor: Actor,
    pub movies: Vec<Movie>,
}
