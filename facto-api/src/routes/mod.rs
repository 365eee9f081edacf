//! API route handlers

pub mod events;
pub mod evidence;
pub mod health;
pub mod verify;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;
use crate::telemetry;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health and metrics
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/metrics", get(health::metrics_export))
        // Event queries
        .route("/v1/events", get(events::list_events))
        .route("/v1/events/:facto_id", get(events::get_event))
        .route(
            "/v1/sessions/:session_id/events",
            get(events::session_events),
        )
        // Verification
        .route("/v1/verify", post(verify::verify_single))
        .route("/v1/verify/chain", get(verify::verify_chain))
        // Evidence export
        .route("/v1/evidence-package", get(evidence::evidence_package))
        // Telemetry
        .layer(middleware::from_fn(telemetry::track))
        .with_state(state)
}

/// Shared limit handling: out-of-range values fall back to the default
pub(crate) fn clamp_limit(limit: Option<usize>) -> usize {
    match limit {
        Some(value) if (1..=1000).contains(&value) => value,
        _ => 100,
    }
}

/// Internal cap when a verification endpoint walks a whole session
pub(crate) const SESSION_FETCH_LIMIT: usize = 10_000;
