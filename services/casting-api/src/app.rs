//! HTTP application wiring.
//!
//! # Purpose
//! Builds the Axum router, attaches the per-route authorization guard, and
//! defines the shared state injected into handlers.
//!
//! # Notes
//! Each method on a protected path carries its own guard layer, so a single
//! path can require different permissions for reads and writes.
use crate::api;
use crate::api::openapi::ApiDoc;
use crate::auth::{Permission, RouteGuard, require_permission};
use crate::observability;
use crate::store::CastingStore;
use axum::Router;
use axum::http::{Method, header};
use axum::middleware;
use axum::routing::{delete, get, patch, post, put};
use casting_authz::Authorizer;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_opentelemetry::OpenTelemetrySpanExt;
use utoipa::OpenApi;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CastingStore>,
    pub authorizer: Authorizer,
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            let parent = observability::trace_context_from_headers(request.headers());
            let span = tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version()
            );
            span.set_parent(parent);
            span
        });

    let authorizer = state.authorizer.clone();
    let guard = move |permission: Permission| {
        middleware::from_fn_with_state(
            RouteGuard::new(authorizer.clone(), permission),
            require_permission,
        )
    };

    let api_routes = Router::new()
        .route(
            "/api/movies",
            get(api::movies::list_movies)
                .route_layer(guard(Permission::GetMovies))
                .merge(
                    post(api::movies::create_movie).route_layer(guard(Permission::PostMovies)),
                ),
        )
        .route(
            "/api/movies/:id",
            get(api::movies::get_movie)
                .route_layer(guard(Permission::GetMovies))
                .merge(
                    patch(api::movies::update_movie).route_layer(guard(Permission::PatchMovies)),
                )
                .merge(
                    delete(api::movies::delete_movie)
                        .route_layer(guard(Permission::DeleteMovies)),
                ),
        )
        .route(
            "/api/movies/:id/actors",
            get(api::cast::movie_cast).route_layer(guard(Permission::GetMovies)),
        )
        .route(
            "/api/movies/:id/actors/:actor_id",
            put(api::cast::add_cast_member)
                .route_layer(guard(Permission::PatchMovies))
                .merge(
                    delete(api::cast::remove_cast_member)
                        .route_layer(guard(Permission::PatchMovies)),
                ),
        )
        .route(
            "/api/actors",
            get(api::actors::list_actors)
                .route_layer(guard(Permission::GetActors))
                .merge(
                    post(api::actors::create_actor).route_layer(guard(Permission::PostActors)),
                ),
        )
        .route(
            "/api/actors/:id",
            get(api::actors::get_actor)
                .route_layer(guard(Permission::GetActors))
                .merge(
                    patch(api::actors::update_actor).route_layer(guard(Permission::PatchActors)),
                )
                .merge(
                    delete(api::actors::delete_actor)
                        .route_layer(guard(Permission::DeleteActors)),
                ),
        )
        .route(
            "/api/actors/:id/movies",
            get(api::cast::actor_filmography).route_layer(guard(Permission::GetActors)),
        )
        .layer(cors_layer());

    Router::new()
        .route("/", get(api::system::index))
        .route("/health", get(api::system::health))
        .merge(api_routes)
        .merge(
            utoipa_swagger_ui::SwaggerUi::new("/docs").url("/api/openapi.json", ApiDoc::openapi()),
        )
        .layer(trace_layer)
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
}
