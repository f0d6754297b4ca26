//! In-memory implementation of the casting store.
//!
//! # Purpose
//! Implements [`CastingStore`] with ordered maps guarded by
//! `tokio::sync::RwLock`. Used for local development, tests and deployments
//! that do not need durability.
//!
//! # Durability and consistency
//! - **Not durable**: all state is lost on restart.
//! - Ids are assigned from per-entity counters and never reused.
//! - Deleting a movie or actor removes its cast links under the same locks.
//!
//! # Lock ordering
//! Methods that hold more than one lock take them in the order
//! `movies`, `actors`, `cast`.
use super::{CastingStore, StoreError, StoreResult};
use crate::model::{
    Actor, ActorFilmography, ActorPatch, Movie, MovieCast, MoviePatch, NewActor, NewMovie,
};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

pub struct InMemoryStore {
    /// Movies keyed by id.
    movies: Arc<RwLock<BTreeMap<i64, Movie>>>,
    /// Actors keyed by id.
    actors: Arc<RwLock<BTreeMap<i64, Actor>>>,
    /// Cast links as `(movie_id, actor_id)` pairs.
    cast: Arc<RwLock<BTreeSet<(i64, i64)>>>,
    next_movie_id: AtomicI64,
    next_actor_id: AtomicI64,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            movies: Arc::new(RwLock::new(BTreeMap::new())),
            actors: Arc::new(RwLock::new(BTreeMap::new())),
            cast: Arc::new(RwLock::new(BTreeSet::new())),
            next_movie_id: AtomicI64::new(1),
            next_actor_id: AtomicI64::new(1),
        }
    }

    fn record_mutation(entity: &'static str, op: &'static str) {
        metrics::counter!("casting_store_mutations_total", "entity" => entity, "op" => op)
            .increment(1);
    }
}

fn movie_not_found() -> StoreError {
    StoreError::NotFound("movie".into())
}

fn actor_not_found() -> StoreError {
    StoreError::NotFound("actor".into())
}

fn cast_of(
    movie: Movie,
    actors: &BTreeMap<i64, Actor>,
    cast: &BTreeSet<(i64, i64)>,
) -> MovieCast {
    let movie_id = movie.id;
    let actors = cast
        .range((movie_id, i64::MIN)..=(movie_id, i64::MAX))
        .filter_map(|(_, actor_id)| actors.get(actor_id).cloned())
        .collect();
    MovieCast { movie, actors }
}

#[async_trait]
impl CastingStore for InMemoryStore {
    async fn list_movies(&self) -> StoreResult<Vec<Movie>> {
        let movies = self.movies.read().await;
        Ok(movies.values().cloned().collect())
    }

    async fn get_movie(&self, id: i64) -> StoreResult<Movie> {
        let movies = self.movies.read().await;
        movies.get(&id).cloned().ok_or_else(movie_not_found)
    }

    async fn create_movie(&self, movie: NewMovie) -> StoreResult<Movie> {
        let mut movies = self.movies.write().await;
        let id = self.next_movie_id.fetch_add(1, Ordering::SeqCst);
        let movie = Movie {
            id,
            title: movie.title,
            release_date: movie.release_date,
            created_at: Utc::now().naive_utc(),
        };
        movies.insert(id, movie.clone());
        metrics::gauge!("casting_movies_total").set(movies.len() as f64);
        Self::record_mutation("movie", "created");
        Ok(movie)
    }

    async fn update_movie(&self, id: i64, patch: MoviePatch) -> StoreResult<Movie> {
        let mut movies = self.movies.write().await;
        let movie = movies.get_mut(&id).ok_or_else(movie_not_found)?;
        patch.apply(movie);
        Self::record_mutation("movie", "updated");
        Ok(movie.clone())
    }

    async fn delete_movie(&self, id: i64) -> StoreResult<()> {
        let mut movies = self.movies.write().await;
        let mut cast = self.cast.write().await;
        if movies.remove(&id).is_none() {
            return Err(movie_not_found());
        }
        cast.retain(|(movie_id, _)| *movie_id != id);
        metrics::gauge!("casting_movies_total").set(movies.len() as f64);
        Self::record_mutation("movie", "deleted");
        Ok(())
    }

    async fn list_actors(&self) -> StoreResult<Vec<Actor>> {
        let actors = self.actors.read().await;
        Ok(actors.values().cloned().collect())
    }

    async fn get_actor(&self, id: i64) -> StoreResult<Actor> {
        let actors = self.actors.read().await;
        actors.get(&id).cloned().ok_or_else(actor_not_found)
    }

    async fn create_actor(&self, actor: NewActor) -> StoreResult<Actor> {
        let mut actors = self.actors.write().await;
        let id = self.next_actor_id.fetch_add(1, Ordering::SeqCst);
        let actor = Actor {
            id,
            name: actor.name,
            age: actor.age,
            gender: actor.gender,
            created_at: Utc::now().naive_utc(),
        };
        actors.insert(id, actor.clone());
        metrics::gauge!("casting_actors_total").set(actors.len() as f64);
        Self::record_mutation("actor", "created");
        Ok(actor)
    }

    async fn update_actor(&self, id: i64, patch: ActorPatch) -> StoreResult<Actor> {
        let mut actors = self.actors.write().await;
        let actor = actors.get_mut(&id).ok_or_else(actor_not_found)?;
        patch.apply(actor);
        Self::record_mutation("actor", "updated");
        Ok(actor.clone())
    }

    async fn delete_actor(&self, id: i64) -> StoreResult<()> {
        let mut actors = self.actors.write().await;
        let mut cast = self.cast.write().await;
        if actors.remove(&id).is_none() {
            return Err(actor_not_found());
        }
        cast.retain(|(_, actor_id)| *actor_id != id);
        metrics::gauge!("casting_actors_total").set(actors.len() as f64);
        Self::record_mutation("actor", "deleted");
        Ok(())
    }

    async fn add_cast_member(&self, movie_id: i64, actor_id: i64) -> StoreResult<MovieCast> {
        let movies = self.movies.read().await;
        let actors = self.actors.read().await;
        let mut cast = self.cast.write().await;
        let movie = movies.get(&movie_id).cloned().ok_or_else(movie_not_found)?;
        if !actors.contains_key(&actor_id) {
            return Err(actor_not_found());
        }
        if cast.insert((movie_id, actor_id)) {
            Self::record_mutation("cast", "created");
        }
        Ok(cast_of(movie, &actors, &cast))
    }

    async fn remove_cast_member(&self, movie_id: i64, actor_id: i64) -> StoreResult<MovieCast> {
        let movies = self.movies.read().await;
        let actors = self.actors.read().await;
        let mut cast = self.cast.write().await;
        let movie = movies.get(&movie_id).cloned().ok_or_else(movie_not_found)?;
        if !actors.contains_key(&actor_id) {
            return Err(actor_not_found());
        }
        if !cast.remove(&(movie_id, actor_id)) {
            return Err(StoreError::NotFound("cast member".into()));
        }
        Self::record_mutation("cast", "deleted");
        Ok(cast_of(movie, &actors, &cast))
    }

    async fn movie_cast(&self, movie_id: i64) -> StoreResult<MovieCast> {
        let movies = self.movies.read().await;
        let actors = self.actors.read().await;
        let cast = self.cast.read().await;
        let movie = movies.get(&movie_id).cloned().ok_or_else(movie_not_found)?;
        Ok(cast_of(movie, &actors, &cast))
    }

    async fn actor_filmography(&self, actor_id: i64) -> StoreResult<ActorFilmography> {
        let movies = self.movies.read().await;
        let actors = self.actors.read().await;
        let cast = self.cast.read().await;
        let actor = actors.get(&actor_id).cloned().ok_or_else(actor_not_found)?;
        let movies = cast
            .iter()
            .filter(|(_, linked)| *linked == actor_id)
            .filter_map(|(movie_id, _)| movies.get(movie_id).cloned())
            .collect();
        Ok(ActorFilmography { actor, movies })
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    fn is_durable(&self) -> bool {
        false
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
