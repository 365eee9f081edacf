//! Verification endpoints
//!
//! Verification never throws: every failed check becomes a boolean flag,
//! with human-readable entries in `errors` naming the offending event.

use axum::extract::{Query, State};
use axum::Json;

use facto_core::types::{EventDigest, FactoEvent};
use facto_core::verify_event;

use crate::dto::{
    ChainVerifyChecks, ChainVerifyQuery, ChainVerifyResponse, VerifyChecks, VerifyRequest,
    VerifyResponse,
};
use crate::error::{ApiError, ApiResult};
use crate::routes::SESSION_FETCH_LIMIT;
use crate::state::AppState;

/// POST /v1/verify: re-derive hash and signature for one event
pub async fn verify_single(
    State(_state): State<AppState>,
    Json(request): Json<VerifyRequest>,
) -> ApiResult<Json<VerifyResponse>> {
    let outcome = verify_event(&request.event);

    Ok(Json(VerifyResponse {
        valid: outcome.is_valid(),
        checks: VerifyChecks {
            hash_valid: outcome.hash_valid,
            signature_valid: outcome.signature_valid,
            // The previous event is out of scope for a single-event check
            chain_valid: None,
        },
    }))
}

/// GET /v1/verify/chain: walk and verify a whole session
pub async fn verify_chain(
    State(state): State<AppState>,
    Query(query): Query<ChainVerifyQuery>,
) -> ApiResult<Json<ChainVerifyResponse>> {
    let session_id = query
        .session_id
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("session_id is required".to_string()))?;

    let page = state
        .store
        .events_by_session(&session_id, SESSION_FETCH_LIMIT, None)
        .await?;
    let mut events = page.events;

    if events.is_empty() {
        return Err(ApiError::NotFound(
            "no events found for session".to_string(),
        ));
    }

    // Oldest first; ties on completed_at break deterministically by facto_id
    events.sort_by(|a, b| {
        a.completed_at
            .cmp(&b.completed_at)
            .then_with(|| a.facto_id.cmp(&b.facto_id))
    });

    let mut checks = ChainVerifyChecks {
        all_hashes_valid: true,
        all_signatures_valid: true,
        chain_integrity_valid: true,
    };
    let mut errors = Vec::new();

    for event in &events {
        let outcome = verify_event(event);
        if !outcome.hash_valid {
            checks.all_hashes_valid = false;
            errors.push(format!("Hash invalid for event: {}", event.facto_id));
        }
        if !outcome.signature_valid {
            checks.all_signatures_valid = false;
            errors.push(format!("Signature invalid for event: {}", event.facto_id));
        }
    }

    let mut expected_prev_hash = EventDigest::zero().to_hex();
    for event in &events {
        if event.proof.prev_hash != expected_prev_hash {
            checks.chain_integrity_valid = false;
            errors.push(format!(
                "Chain broken at event: {} (expected prev_hash: {}..., got: {}...)",
                event.facto_id,
                prefix(&expected_prev_hash),
                prefix(&event.proof.prev_hash)
            ));
        }
        expected_prev_hash = event.proof.event_hash.clone();
    }

    let session_hash = session_digest(&events);

    Ok(Json(ChainVerifyResponse {
        valid: checks.all_hashes_valid
            && checks.all_signatures_valid
            && checks.chain_integrity_valid,
        event_count: events.len(),
        first_event: events[0].facto_id.clone(),
        last_event: events[events.len() - 1].facto_id.clone(),
        checks,
        session_hash,
        errors,
    }))
}

/// SHA-256 over the concatenated hex event-hash strings
fn session_digest(events: &[FactoEvent]) -> String {
    let mut concat = String::with_capacity(events.len() * 64);
    for event in events {
        concat.push_str(&event.proof.event_hash);
    }
    EventDigest::sha256(concat.as_bytes()).to_hex()
}

fn prefix(hash: &str) -> &str {
    hash.get(..16).unwrap_or(hash)
}
