//! Evidence package export
//!
//! Bundles a session's events with per-event Merkle inclusion proofs and a
//! textual verification recipe, for off-line audit without access to this
//! service.

use axum::extract::{Query, State};
use axum::Json;
use chrono::{SecondsFormat, Utc};

use facto_core::constants::EVIDENCE_ID_PREFIX;
use facto_core::types::EventDigest;
use facto_core::MerkleTree;

use crate::dto::{EventMerkleProof, EvidencePackageQuery, EvidencePackageResponse};
use crate::error::{ApiError, ApiResult};
use crate::routes::SESSION_FETCH_LIMIT;
use crate::state::AppState;

const VERIFICATION_INSTRUCTIONS: &str = r#"To verify this evidence package:

1. For each event:
   a. Reconstruct the canonical JSON form (sorted keys, no whitespace;
      execution_meta covers model_id, seed, sdk_version, temperature and
      tool_calls only - model_hash, max_tokens, tags and sdk_language are
      outside the signed form and are not tamper-evident)
   b. Compute SHA3-256 and compare with event_hash
   c. Verify the Ed25519 signature using the public_key
   d. Verify prev_hash links to the previous event's event_hash

2. Verify the Merkle proofs:
   a. For each event, fold the proof to compute the root:
      SHA-256(sibling || current) when the sibling position is "left",
      SHA-256(current || sibling) when it is "right"
   b. All computed roots should match the package Merkle root

3. The chain of events is tamper-evident:
   - Any modification would break the hash chain
   - Any modification would invalidate the signature
   - Any modification would invalidate the Merkle proof"#;

/// GET /v1/evidence-package: export a session with Merkle proofs
pub async fn evidence_package(
    State(state): State<AppState>,
    Query(query): Query<EvidencePackageQuery>,
) -> ApiResult<Json<EvidencePackageResponse>> {
    let session_id = query
        .session_id
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("session_id is required".to_string()))?;

    let page = state
        .store
        .events_by_session(&session_id, SESSION_FETCH_LIMIT, None)
        .await?;
    let events = page.events;

    if events.is_empty() {
        return Err(ApiError::NotFound(
            "no events found for session".to_string(),
        ));
    }

    let leaves: Vec<EventDigest> = events
        .iter()
        .map(|e| {
            EventDigest::from_hex(&e.proof.event_hash).map_err(|err| {
                ApiError::Internal(format!(
                    "stored event {} has malformed event_hash: {}",
                    e.facto_id, err
                ))
            })
        })
        .collect::<Result<_, _>>()?;

    let tree = MerkleTree::build(&leaves);
    let root = tree.root().to_hex();

    let merkle_proofs: Vec<EventMerkleProof> = events
        .iter()
        .enumerate()
        .map(|(i, event)| {
            let proof = tree
                .proof(i)
                .ok_or_else(|| ApiError::Internal(format!("no proof for leaf {}", i)))?;
            Ok(EventMerkleProof {
                facto_id: event.facto_id.clone(),
                event_hash: event.proof.event_hash.clone(),
                proof: proof.elements,
                root: root.clone(),
            })
        })
        .collect::<ApiResult<_>>()?;

    let exported_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    let package_id = package_id(&session_id, &exported_at);

    Ok(Json(EvidencePackageResponse {
        package_id,
        session_id,
        events,
        merkle_proofs,
        exported_at,
        verification_instructions: VERIFICATION_INSTRUCTIONS.to_string(),
    }))
}

/// `ev-` plus the first 16 hex characters of SHA-256(session_id || timestamp)
fn package_id(session_id: &str, exported_at: &str) -> String {
    let digest = EventDigest::sha256(format!("{}{}", session_id, exported_at).as_bytes());
    format!("{}{}", EVIDENCE_ID_PREFIX, &digest.to_hex()[..16])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_id_shape() {
        let id = package_id("session-aa", "2024-01-01T00:00:00Z");
        assert!(id.starts_with("ev-"));
        assert_eq!(id.len(), 3 + 16);
        // Deterministic for identical inputs
        assert_eq!(id, package_id("session-aa", "2024-01-01T00:00:00Z"));
        assert_ne!(id, package_id("session-bb", "2024-01-01T00:00:00Z"));
    }
}
