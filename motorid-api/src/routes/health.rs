//! Health Check Endpoints
//!
//! Kubernetes-compatible health checks:
//! - /health/ping - Simple liveness check
//! - /health/live - Process alive check with uptime
//! - /health/ready - Cache reachability check

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use crate::state::{AppState, SharedCache};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HealthResponse {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_entries: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// GET /health/ping
pub async fn ping() -> impl IntoResponse {
    Json(HealthResponse {
        status: HealthStatus::Healthy,
        message: Some("pong".to_string()),
        uptime_seconds: None,
        cache_entries: None,
    })
}

/// GET /health/live
pub async fn live(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: HealthStatus::Healthy,
        message: None,
        uptime_seconds: Some(state.start_time.elapsed().as_secs()),
        cache_entries: None,
    })
}

/// GET /health/ready
pub async fn ready(State(cache): State<SharedCache>) -> impl IntoResponse {
    match cache.count().await {
        Ok(entries) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: HealthStatus::Healthy,
                message: None,
                uptime_seconds: None,
                cache_entries: Some(entries),
            }),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: HealthStatus::Unhealthy,
                message: Some(e.to_string()),
                uptime_seconds: None,
                cache_entries: None,
            }),
        ),
    }
}
