//! Data Transfer Objects for API requests and responses

use serde::{Deserialize, Serialize};

use facto_core::types::FactoEvent;
use facto_core::ProofElement;

// ============ Event listing DTOs ============

/// Query parameters for GET /v1/events
#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    pub agent_id: Option<String>,
    /// RFC3339 window start
    pub start: Option<String>,
    /// RFC3339 window end
    pub end: Option<String>,
    pub limit: Option<usize>,
    pub cursor: Option<String>,
}

/// Query parameters for GET /v1/sessions/:session_id/events
#[derive(Debug, Deserialize)]
pub struct SessionEventsQuery {
    pub limit: Option<usize>,
    pub cursor: Option<String>,
}

/// Paged event listing
#[derive(Debug, Serialize)]
pub struct EventsResponse {
    pub events: Vec<FactoEvent>,
    pub next_cursor: Option<String>,
}

// ============ Verification DTOs ============

/// Body of POST /v1/verify
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub event: FactoEvent,
}

/// Individual verification checks
#[derive(Debug, Serialize)]
pub struct VerifyChecks {
    pub hash_valid: bool,
    pub signature_valid: bool,
    /// Unknown for single events: the prior event is out of scope
    pub chain_valid: Option<bool>,
}

/// Response of POST /v1/verify
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub valid: bool,
    pub checks: VerifyChecks,
}

/// Query parameters for GET /v1/verify/chain
#[derive(Debug, Deserialize)]
pub struct ChainVerifyQuery {
    pub session_id: Option<String>,
}

/// Whole-chain verification checks
#[derive(Debug, Serialize)]
pub struct ChainVerifyChecks {
    pub all_hashes_valid: bool,
    pub all_signatures_valid: bool,
    pub chain_integrity_valid: bool,
}

/// Response of GET /v1/verify/chain
#[derive(Debug, Serialize)]
pub struct ChainVerifyResponse {
    pub valid: bool,
    pub event_count: usize,
    pub checks: ChainVerifyChecks,
    pub first_event: String,
    pub last_event: String,
    /// SHA-256 over the concatenated hex event hashes; a convenience
    /// digest, not part of the signing contract
    pub session_hash: String,
    pub errors: Vec<String>,
}

// ============ Evidence package DTOs ============

/// Query parameters for GET /v1/evidence-package
#[derive(Debug, Deserialize)]
pub struct EvidencePackageQuery {
    pub session_id: Option<String>,
}

/// Merkle inclusion proof for one event
#[derive(Debug, Serialize)]
pub struct EventMerkleProof {
    pub facto_id: String,
    pub event_hash: String,
    pub proof: Vec<ProofElement>,
    pub root: String,
}

/// Exported evidence bundle for one session
#[derive(Debug, Serialize)]
pub struct EvidencePackageResponse {
    pub package_id: String,
    pub session_id: String,
    pub events: Vec<FactoEvent>,
    pub merkle_proofs: Vec<EventMerkleProof>,
    pub exported_at: String,
    pub verification_instructions: String,
}

// ============ Health DTOs ============

/// Response of GET /health
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
