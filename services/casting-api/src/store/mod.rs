//! Persistence boundary for movies, actors and cast membership.
//!
//! Handlers only talk to [`CastingStore`]; the backend is picked at startup
//! from configuration. Authorization happens before any store call, so a
//! rejected request never reaches this layer.
use crate::model::{
    Actor, ActorFilmography, ActorPatch, Movie, MovieCast, MoviePatch, NewActor, NewMovie,
};
use async_trait::async_trait;
use thiserror::Error;

pub mod memory;
pub mod postgres;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Unexpected(err.into())
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::Unexpected(err.into())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait CastingStore: Send + Sync {
    /// All movies ordered by id.
    async fn list_movies(&self) -> StoreResult<Vec<Movie>>;
    async fn get_movie(&self, id: i64) -> StoreResult<Movie>;
    async fn create_movie(&self, movie: NewMovie) -> StoreResult<Movie>;
    async fn update_movie(&self, id: i64, patch: MoviePatch) -> StoreResult<Movie>;
    /// Removes the movie and its cast links.
    async fn delete_movie(&self, id: i64) -> StoreResult<()>;

    /// All actors ordered by id.
    async fn list_actors(&self) -> StoreResult<Vec<Actor>>;
    async fn get_actor(&self, id: i64) -> StoreResult<Actor>;
    async fn create_actor(&self, actor: NewActor) -> StoreResult<Actor>;
    async fn update_actor(&self, id: i64, patch: ActorPatch) -> StoreResult<Actor>;
    /// Removes the actor and its cast links.
    async fn delete_actor(&self, id: i64) -> StoreResult<()>;

    /// Link an actor to a movie. Linking twice is not an error.
    async fn add_cast_member(&self, movie_id: i64, actor_id: i64) -> StoreResult<MovieCast>;
    /// Unlink an actor from a movie; `NotFound` if they were not linked.
    async fn remove_cast_member(&self, movie_id: i64, actor_id: i64) -> StoreResult<MovieCast>;
    async fn movie_cast(&self, movie_id: i64) -> StoreResult<MovieCast>;
    async fn actor_filmography(&self, actor_id: i64) -> StoreResult<ActorFilmography>;

    async fn health_check(&self) -> StoreResult<()>;
    fn is_durable(&self) -> bool;
    fn backend_name(&self) -> &'static str;
}
