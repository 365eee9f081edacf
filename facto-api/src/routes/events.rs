//! Event query endpoints

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::{DateTime, Utc};

use facto_core::types::FactoEvent;

use crate::dto::{EventsQuery, EventsResponse, SessionEventsQuery};
use crate::error::{ApiError, ApiResult};
use crate::routes::clamp_limit;
use crate::state::AppState;

/// GET /v1/events: list by agent and time window
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> ApiResult<Json<EventsResponse>> {
    let agent_id = query
        .agent_id
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("agent_id is required".to_string()))?;
    let start = parse_rfc3339(query.start.as_deref(), "start")?;
    let end = parse_rfc3339(query.end.as_deref(), "end")?;
    let limit = clamp_limit(query.limit);

    let page = state
        .store
        .events_by_agent(&agent_id, start, end, limit, query.cursor.as_deref())
        .await?;

    Ok(Json(EventsResponse {
        events: page.events,
        next_cursor: page.next_cursor,
    }))
}

/// GET /v1/events/:facto_id, point lookup
pub async fn get_event(
    State(state): State<AppState>,
    Path(facto_id): Path<String>,
) -> ApiResult<Json<FactoEvent>> {
    let event = state
        .store
        .event_by_facto_id(&facto_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("event not found".to_string()))?;

    Ok(Json(event))
}

/// GET /v1/sessions/:session_id/events, session walk
pub async fn session_events(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(query): Query<SessionEventsQuery>,
) -> ApiResult<Json<EventsResponse>> {
    let limit = clamp_limit(query.limit);

    let page = state
        .store
        .events_by_session(&session_id, limit, query.cursor.as_deref())
        .await?;

    Ok(Json(EventsResponse {
        events: page.events,
        next_cursor: page.next_cursor,
    }))
}

fn parse_rfc3339(value: Option<&str>, field: &str) -> ApiResult<DateTime<Utc>> {
    let value =
        value.ok_or_else(|| ApiError::BadRequest(format!("{} is required", field)))?;
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| ApiError::BadRequest(format!("invalid {} time format", field)))
}
