//! OpenAPI document for the casting API.
use crate::api::{
    actors, cast, movies, system,
    types::{
        ActorFilmographyResponse, ActorListResponse, ActorResponse, DeletedResponse,
        ErrorResponse, HealthStatus, IndexResponse, MovieCastResponse, MovieListResponse,
        MovieResponse,
    },
};
use crate::model::{Actor, ActorCreateRequest, ActorPatchRequest, Movie, MovieCreateRequest, MoviePatchRequest};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "casting-api",
        version = "v1",
        description = "Casting agency API for movies, actors and cast membership"
    ),
    paths(
        system::index,
        system::health,
        movies::list_movies,
        movies::get_movie,
        movies::create_movie,
        movies::update_movie,
        movies::delete_movie,
        actors::list_actors,
        actors::get_actor,
        actors::create_actor,
        actors::update_actor,
        actors::delete_actor,
        cast::movie_cast,
        cast::add_cast_member,
        cast::remove_cast_member,
        cast::actor_filmography
    ),
    components(schemas(
        ErrorResponse,
        HealthStatus,
        IndexResponse,
        Movie,
        MovieCreateRequest,
        MoviePatchRequest,
        MovieListResponse,
        MovieResponse,
        Actor,
        ActorCreateRequest,
        ActorPatchRequest,
        ActorListResponse,
        ActorResponse,
        DeletedResponse,
        MovieCastResponse,
        ActorFilmographyResponse
    )),
    modifiers(&BearerSecurity),
    tags(
        (name = "system", description = "Index and health"),
        (name = "movies", description = "Movie records"),
        (name = "actors", description = "Actor records"),
        (name = "cast", description = "Cast membership")
    )
)]
pub struct ApiDoc;

struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
