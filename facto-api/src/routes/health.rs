//! Health and metrics endpoints

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use tracing::warn;


use crate::dto::HealthResponse;
use crate::error::ApiResult;
use crate::state::AppState;

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
    }))
}

/// Ready check endpoint (verifies storage connectivity)
pub async fn ready_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.event_by_facto_id("ft-readiness-probe").await {
        Ok(_) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ready".to_string(),
                version: state.version.clone(),
            }),
        ),
        Err(e) => {
            warn!(error = %e, "Readiness probe failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "degraded".to_string(),
                    version: state.version.clone(),
                }),
            )
        }
    }
}

/// Prometheus text exposition
pub async fn metrics_export(State(state): State<AppState>) -> String {
    state
        .prometheus
        .as_ref()
        .map(|handle| handle.render())
        .unwrap_or_default()
}
