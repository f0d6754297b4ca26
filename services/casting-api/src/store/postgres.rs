//! Postgres-backed implementation of the casting store.
//!
//! # Key invariants
//! - Ids come from `BIGSERIAL` sequences and are never reused.
//! - `movie_actors` rows reference both parents with `ON DELETE CASCADE`, so
//!   deleting a movie or actor removes its links in the same statement.
//! - Cast mutations run in a transaction that first checks both parents exist,
//!   so a missing movie or actor reports `NotFound` rather than a constraint
//!   error.
//!
//! # Operational notes
//! - Migrations run at connect via `sqlx::migrate!("./migrations")`; startup
//!   fails if they cannot be applied.
//! - The pool bounds how long a request waits for a connection. The database
//!   URL may contain credentials and is never logged.
use super::{CastingStore, StoreError, StoreResult};
use crate::config::PostgresConfig;
use crate::model::{
    Actor, ActorFilmography, ActorPatch, Movie, MovieCast, MoviePatch, NewActor, NewMovie,
};
use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use std::str::FromStr;
use std::time::Duration;

pub struct PostgresStore {
    pool: PgPool,
}

#[derive(Debug, Clone, FromRow)]
struct DbMovie {
    id: i64,
    title: String,
    release_date: NaiveDateTime,
    created_at: NaiveDateTime,
}

#[derive(Debug, Clone, FromRow)]
struct DbActor {
    id: i64,
    name: String,
    age: i32,
    gender: String,
    created_at: NaiveDateTime,
}

impl From<DbMovie> for Movie {
    fn from(row: DbMovie) -> Self {
        Movie {
            id: row.id,
            title: row.title,
            release_date: row.release_date,
            created_at: row.created_at,
        }
    }
}

impl From<DbActor> for Actor {
    fn from(row: DbActor) -> Self {
        Actor {
            id: row.id,
            name: row.name,
            age: row.age,
            gender: row.gender,
            created_at: row.created_at,
        }
    }
}

const MOVIE_COLUMNS: &str = "id, title, release_date, created_at";
const ACTOR_COLUMNS: &str = "id, name, age, gender, created_at";

impl PostgresStore {
    /// Open a pool and apply pending migrations.
    pub async fn connect(pg: &PostgresConfig) -> StoreResult<Self> {
        let store = Self::connect_without_migrations(pg).await?;
        sqlx::migrate!("./migrations").run(&store.pool).await?;
        Ok(store)
    }

    /// Open a pool against a schema managed elsewhere.
    pub async fn connect_without_migrations(pg: &PostgresConfig) -> StoreResult<Self> {
        let connect_options = PgConnectOptions::from_str(&pg.url)?;
        let pool = PgPoolOptions::new()
            .max_connections(pg.max_connections)
            .acquire_timeout(Duration::from_millis(pg.acquire_timeout_ms))
            .connect_with(connect_options)
            .await?;
        Ok(Self { pool })
    }

    async fn ensure_movie(tx: &mut Transaction<'_, Postgres>, id: i64) -> StoreResult<Movie> {
        let row: Option<DbMovie> = sqlx::query_as(&format!(
            "SELECT {MOVIE_COLUMNS} FROM movies WHERE id = $1 FOR SHARE"
        ))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;
        row.map(Movie::from)
            .ok_or_else(|| StoreError::NotFound("movie".into()))
    }

    async fn ensure_actor(tx: &mut Transaction<'_, Postgres>, id: i64) -> StoreResult<()> {
        let found: Option<i64> = sqlx::query_scalar("SELECT id FROM actors WHERE id = $1 FOR SHARE")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;
        found
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound("actor".into()))
    }

    async fn cast_actors(
        executor: impl sqlx::PgExecutor<'_>,
        movie_id: i64,
    ) -> StoreResult<Vec<Actor>> {
        let rows: Vec<DbActor> = sqlx::query_as(
            r#"SELECT a.id, a.name, a.age, a.gender, a.created_at
               FROM actors a
               JOIN movie_actors ma ON ma.actor_id = a.id
               WHERE ma.movie_id = $1
               ORDER BY a.id"#,
        )
        .bind(movie_id)
        .fetch_all(executor)
        .await?;
        Ok(rows.into_iter().map(Actor::from).collect())
    }

    async fn count_rows(&self, table: &'static str) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Reset `gauge` to the row count of `table` after an insert or delete.
    async fn refresh_total(&self, table: &'static str, gauge: &'static str) {
        match self.count_rows(table).await {
            Ok(count) => metrics::gauge!(gauge).set(count as f64),
            Err(err) => tracing::warn!(error = ?err, table, "casting row count failed"),
        }
    }
}

fn record_mutation(entity: &'static str, op: &'static str) {
    metrics::counter!("casting_store_mutations_total", "entity" => entity, "op" => op).increment(1);
}

#[async_trait]
impl CastingStore for PostgresStore {
    async fn list_movies(&self) -> StoreResult<Vec<Movie>> {
        let rows: Vec<DbMovie> =
            sqlx::query_as(&format!("SELECT {MOVIE_COLUMNS} FROM movies ORDER BY id"))
                .fetch_all(&self.pool)
                .await?;
        metrics::gauge!("casting_movies_total").set(rows.len() as f64);
        Ok(rows.into_iter().map(Movie::from).collect())
    }

    async fn get_movie(&self, id: i64) -> StoreResult<Movie> {
        let row: Option<DbMovie> =
            sqlx::query_as(&format!("SELECT {MOVIE_COLUMNS} FROM movies WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(Movie::from)
            .ok_or_else(|| StoreError::NotFound("movie".into()))
    }

    async fn create_movie(&self, movie: NewMovie) -> StoreResult<Movie> {
        let row: DbMovie = sqlx::query_as(&format!(
            "INSERT INTO movies (title, release_date, created_at) VALUES ($1, $2, $3) RETURNING {MOVIE_COLUMNS}"
        ))
        .bind(&movie.title)
        .bind(movie.release_date)
        .bind(Utc::now().naive_utc())
        .fetch_one(&self.pool)
        .await?;
        record_mutation("movie", "created");
        self.refresh_total("movies", "casting_movies_total").await;
        Ok(row.into())
    }

    async fn update_movie(&self, id: i64, patch: MoviePatch) -> StoreResult<Movie> {
        let row: Option<DbMovie> = sqlx::query_as(&format!(
            r#"UPDATE movies
               SET title = COALESCE($2, title), release_date = COALESCE($3, release_date)
               WHERE id = $1
               RETURNING {MOVIE_COLUMNS}"#
        ))
        .bind(id)
        .bind(patch.title)
        .bind(patch.release_date)
        .fetch_optional(&self.pool)
        .await?;
        let movie = row
            .map(Movie::from)
            .ok_or_else(|| StoreError::NotFound("movie".into()))?;
        record_mutation("movie", "updated");
        Ok(movie)
    }

    async fn delete_movie(&self, id: i64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM movies WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("movie".into()));
        }
        record_mutation("movie", "deleted");
        self.refresh_total("movies", "casting_movies_total").await;
        Ok(())
    }

    async fn list_actors(&self) -> StoreResult<Vec<Actor>> {
        let rows: Vec<DbActor> =
            sqlx::query_as(&format!("SELECT {ACTOR_COLUMNS} FROM actors ORDER BY id"))
                .fetch_all(&self.pool)
                .await?;
        metrics::gauge!("casting_actors_total").set(rows.len() as f64);
        Ok(rows.into_iter().map(Actor::from).collect())
    }

    async fn get_actor(&self, id: i64) -> StoreResult<Actor> {
        let row: Option<DbActor> =
            sqlx::query_as(&format!("SELECT {ACTOR_COLUMNS} FROM actors WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(Actor::from)
            .ok_or_else(|| StoreError::NotFound("actor".into()))
    }

    async fn create_actor(&self, actor: NewActor) -> StoreResult<Actor> {
        let row: DbActor = sqlx::query_as(&format!(
            "INSERT INTO actors (name, age, gender, created_at) VALUES ($1, $2, $3, $4) RETURNING {ACTOR_COLUMNS}"
        ))
        .bind(&actor.name)
        .bind(actor.age)
        .bind(&actor.gender)
        .bind(Utc::now().naive_utc())
        .fetch_one(&self.pool)
        .await?;
        record_mutation("actor", "created");
        self.refresh_total("actors", "casting_actors_total").await;
        Ok(row.into())
    }

    async fn update_actor(&self, id: i64, patch: ActorPatch) -> StoreResult<Actor> {
        let row: Option<DbActor> = sqlx::query_as(&format!(
            r#"UPDATE actors
               SET name = COALESCE($2, name), age = COALESCE($3, age), gender = COALESCE($4, gender)
               WHERE id = $1
               RETURNING {ACTOR_COLUMNS}"#
        ))
        .bind(id)
        .bind(patch.name)
        .bind(patch.age)
        .bind(patch.gender)
        .fetch_optional(&self.pool)
        .await?;
        let actor = row
            .map(Actor::from)
            .ok_or_else(|| StoreError::NotFound("actor".into()))?;
        record_mutation("actor", "updated");
        Ok(actor)
    }

    async fn delete_actor(&self, id: i64) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM actors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("actor".into()));
        }
        record_mutation("actor", "deleted");
        self.refresh_total("actors", "casting_actors_total").await;
        Ok(())
    }

    async fn add_cast_member(&self, movie_id: i64, actor_id: i64) -> StoreResult<MovieCast> {
        let mut tx = self.pool.begin().await?;
        let movie = Self::ensure_movie(&mut tx, movie_id).await?;
        Self::ensure_actor(&mut tx, actor_id).await?;
        let inserted = sqlx::query(
            "INSERT INTO movie_actors (movie_id, actor_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(movie_id)
        .bind(actor_id)
        .execute(&mut *tx)
        .await?;
        let actors = Self::cast_actors(&mut *tx, movie_id).await?;
        tx.commit().await?;
        if inserted.rows_affected() > 0 {
            record_mutation("cast", "created");
        }
        Ok(MovieCast { movie, actors })
    }

    async fn remove_cast_member(&self, movie_id: i64, actor_id: i64) -> StoreResult<MovieCast> {
        let mut tx = self.pool.begin().await?;
        let movie = Self::ensure_movie(&mut tx, movie_id).await?;
        Self::ensure_actor(&mut tx, actor_id).await?;
        let removed = sqlx::query("DELETE FROM movie_actors WHERE movie_id = $1 AND actor_id = $2")
            .bind(movie_id)
            .bind(actor_id)
            .execute(&mut *tx)
            .await?;
        if removed.rows_affected() == 0 {
            return Err(StoreError::NotFound("cast member".into()));
        }
        let actors = Self::cast_actors(&mut *tx, movie_id).await?;
        tx.commit().await?;
        record_mutation("cast", "deleted");
        Ok(MovieCast { movie, actors })
    }

    async fn movie_cast(&self, movie_id: i64) -> StoreResult<MovieCast> {
        let movie = self.get_movie(movie_id).await?;
        let actors = Self::cast_actors(&self.pool, movie_id).await?;
        Ok(MovieCast { movie, actors })
    }

    async fn actor_filmography(&self, actor_id: i64) -> StoreResult<ActorFilmography> {
        let actor = self.get_actor(actor_id).await?;
        let rows: Vec<DbMovie> = sqlx::query_as(
            r#"SELECT m.id, m.title, m.release_date, m.created_at
               FROM movies m
               JOIN movie_actors ma ON ma.movie_id = m.id
               WHERE ma.actor_id = $1
               ORDER BY m.id"#,
        )
        .bind(actor_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ActorFilmography {
            actor,
            movies: rows.into_iter().map(Movie::from).collect(),
        })
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn is_durable(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
