//! Public endpoints: API index and health probe.
//!
//! Neither route is guarded.
use crate::api::error::{ApiError, api_internal};
use crate::api::types::{HealthStatus, IndexResponse};
use crate::app::AppState;
use axum::Json;
use axum::extract::State;

const ENDPOINTS: [&str; 16] = [
    "GET /",
    "GET /health",
    "GET /api/movies",
    "GET /api/movies/:id",
    "POST /api/movies",
    "PATCH /api/movies/:id",
    "DELETE /api/movies/:id",
    "GET /api/movies/:id/actors",
    "PUT /api/movies/:id/actors/:actor_id",
    "DELETE /api/movies/:id/actors/:actor_id",
    "GET /api/actors",
    "GET /api/actors/:id",
    "POST /api/actors",
    "PATCH /api/actors/:id",
    "DELETE /api/actors/:id",
    "GET /api/actors/:id/movies",
];

#[utoipa::path(
    get,
    path = "/",
    tag = "system",
    responses(
        (status = 200, description = "API index", body = IndexResponse)
    )
)]
pub(crate) async fn index() -> Json<IndexResponse> {
    Json(IndexResponse {
        success: true,
        message: "Casting Agency API".to_string(),
        endpoints: ENDPOINTS.iter().map(|endpoint| endpoint.to_string()).collect(),
    })
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "system",
    responses(
        (status = 200, description = "Service health", body = HealthStatus),
        (status = 500, description = "Storage unavailable", body = crate::api::types::ErrorResponse)
    )
)]
/// Probe the backing store and report `ok`.
pub(crate) async fn health(State(state): State<AppState>) -> Result<Json<HealthStatus>, ApiError> {
    if let Err(err) = state.store.health_check().await {
        return Err(api_internal("storage unavailable", &err));
    }
    Ok(Json(HealthStatus {
        status: "ok".to_string(),
    }))
}
