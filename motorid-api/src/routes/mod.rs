//! REST API Routes Module
//!
//! Person operations, health checks, and the OpenAPI document, assembled
//! into one router with CORS and request tracing.

pub mod health;
pub mod person;

use axum::{
    http::HeaderValue,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::config::ApiConfig;
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Handler for /openapi.json endpoint.
async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

fn build_cors(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if config.cors_origins.is_empty() {
        // Dev mode: allow all
        cors.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

/// Build the full API router.
pub fn create_api_router(state: AppState, config: &ApiConfig) -> Router {
    let person_routes = Router::new()
        .route("/persons", post(person::create_person))
        .route("/persons/:id", get(person::get_person))
        .route("/persons/views", post(person::update_views))
        .route("/persons/verification", post(person::set_verified))
        .route("/persons/refresh", post(person::refresh));

    let health_routes = Router::new()
        .route("/ping", get(health::ping))
        .route("/live", get(health::live))
        .route("/ready", get(health::ready));

    Router::new()
        .nest("/api/v1", person_routes)
        .nest("/health", health_routes)
        .route("/openapi.json", get(openapi_json))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors(config))
        .with_state(state)
}
