//! Integration tests for the Facto API endpoints
//!
//! Runs the full router against the in-memory storage backend with events
//! signed by a real session chain, covering the end-to-end audit scenarios.

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};
use std::sync::Arc;

use facto_api::{create_router, AppState};
use facto_core::{AgentSigner, EventDraft, SessionChain};
use facto_db::{EventStore, MemoryStore};

const BASE_NS: i64 = 1_700_000_000_000_000_000;

fn create_test_server(store: Arc<MemoryStore>) -> TestServer {
    let state = AppState::new(store, None);
    TestServer::new(create_router(state)).unwrap()
}

/// Sign `n` chained events into `session_id` and persist them
async fn seed_session(store: &MemoryStore, session_id: &str, n: usize) -> Vec<Value> {
    let mut chain =
        SessionChain::with_session_id(session_id, "agent-test", AgentSigner::generate());
    let events: Vec<_> = (0..n)
        .map(|i| {
            chain
                .sign(
                    EventDraft::new("llm_call", "success")
                        .with_facto_id(format!("ft-{}", i + 1))
                        .with_input(json!({"prompt": format!("q{}", i)}))
                        .with_output(json!({"response": format!("a{}", i)}))
                        .with_times(BASE_NS + i as i64 * 1_000, BASE_NS + i as i64 * 1_000 + 500),
                )
                .unwrap()
        })
        .collect();
    store.store_batch(&events).await.unwrap();
    events
        .iter()
        .map(|e| serde_json::to_value(e).unwrap())
        .collect()
}

// ============ Health Endpoint Tests ============

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server(Arc::new(MemoryStore::new()));

    let response = server.get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
}

// ============ Event Query Tests ============

#[tokio::test]
async fn test_get_event_not_found() {
    let server = create_test_server(Arc::new(MemoryStore::new()));

    let response = server.get("/v1/events/ft-nonexistent").await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn test_get_event_by_facto_id() {
    let store = Arc::new(MemoryStore::new());
    let events = seed_session(&store, "session-point", 2).await;
    let server = create_test_server(store);

    let response = server.get("/v1/events/ft-2").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body, events[1]);
}

#[tokio::test]
async fn test_list_events_requires_agent_id() {
    let server = create_test_server(Arc::new(MemoryStore::new()));

    let response = server
        .get("/v1/events?start=2023-11-14T00:00:00Z&end=2023-11-15T00:00:00Z")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_events_rejects_bad_timestamp() {
    let server = create_test_server(Arc::new(MemoryStore::new()));

    let response = server
        .get("/v1/events?agent_id=agent-test&start=yesterday&end=2023-11-15T00:00:00Z")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_list_events_window_and_pagination() {
    let store = Arc::new(MemoryStore::new());
    seed_session(&store, "session-page", 5).await;
    let server = create_test_server(store);

    let url = "/v1/events?agent_id=agent-test\
               &start=2023-11-14T00:00:00Z&end=2023-11-15T00:00:00Z&limit=3";
    let response = server.get(url).await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["events"].as_array().unwrap().len(), 3);
    let cursor = body["next_cursor"].as_str().unwrap().to_string();

    let response = server.get(&format!("{}&cursor={}", url, cursor)).await;
    response.assert_status_ok();
    let body: Value = response.json();
    let events = body["events"].as_array().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["facto_id"], "ft-4");
    assert!(body["next_cursor"].is_null());
}

#[tokio::test]
async fn test_session_events_sorted_by_completed_at() {
    let store = Arc::new(MemoryStore::new());
    seed_session(&store, "session-walk", 3).await;
    let server = create_test_server(store);

    let response = server.get("/v1/sessions/session-walk/events").await;

    response.assert_status_ok();
    let body: Value = response.json();
    let events = body["events"].as_array().unwrap();
    assert_eq!(events.len(), 3);
    let times: Vec<i64> = events
        .iter()
        .map(|e| e["completed_at"].as_i64().unwrap())
        .collect();
    let mut sorted = times.clone();
    sorted.sort_unstable();
    assert_eq!(times, sorted);
}

// ============ Single-Event Verification Tests ============

#[tokio::test]
async fn test_verify_first_event_in_session() {
    let store = MemoryStore::new();
    let events = seed_session(&store, "session-aa", 1).await;
    let server = create_test_server(Arc::new(MemoryStore::new()));

    assert_eq!(events[0]["proof"]["prev_hash"], "0".repeat(64));

    let response = server.post("/v1/verify").json(&json!({"event": events[0]})).await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["valid"], true);
    assert_eq!(body["checks"]["hash_valid"], true);
    assert_eq!(body["checks"]["signature_valid"], true);
    assert!(body["checks"]["chain_valid"].is_null());
}

#[tokio::test]
async fn test_verify_detects_tampered_status() {
    let store = MemoryStore::new();
    let events = seed_session(&store, "session-aa", 1).await;
    let server = create_test_server(Arc::new(MemoryStore::new()));

    let mut tampered = events[0].clone();
    tampered["status"] = json!("error");

    let response = server.post("/v1/verify").json(&json!({"event": tampered})).await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["valid"], false);
    assert_eq!(body["checks"]["hash_valid"], false);
    assert_eq!(body["checks"]["signature_valid"], false);
}

#[tokio::test]
async fn test_verify_tolerates_garbage_proof_material() {
    let store = MemoryStore::new();
    let events = seed_session(&store, "session-aa", 1).await;
    let server = create_test_server(Arc::new(MemoryStore::new()));

    let mut tampered = events[0].clone();
    tampered["proof"]["public_key"] = json!("@@@ not base64 @@@");

    let response = server.post("/v1/verify").json(&json!({"event": tampered})).await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["checks"]["signature_valid"], false);
}

// ============ Chain Verification Tests ============

#[tokio::test]
async fn test_verify_chain_two_events() {
    let store = Arc::new(MemoryStore::new());
    let events = seed_session(&store, "session-aa", 2).await;
    let server = create_test_server(store);

    assert_eq!(events[1]["proof"]["prev_hash"], events[0]["proof"]["event_hash"]);

    let response = server.get("/v1/verify/chain?session_id=session-aa").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["valid"], true);
    assert_eq!(body["event_count"], 2);
    assert_eq!(body["checks"]["all_hashes_valid"], true);
    assert_eq!(body["checks"]["all_signatures_valid"], true);
    assert_eq!(body["checks"]["chain_integrity_valid"], true);
    assert_eq!(body["first_event"], "ft-1");
    assert_eq!(body["last_event"], "ft-2");
    assert_eq!(body["session_hash"].as_str().unwrap().len(), 64);
    assert!(body["errors"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_verify_chain_broken_prev_hash() {
    let store = Arc::new(MemoryStore::new());
    let mut chain =
        SessionChain::with_session_id("session-bb", "agent-test", AgentSigner::generate());
    let e1 = chain
        .sign(
            EventDraft::new("llm_call", "success")
                .with_facto_id("ft-1")
                .with_times(BASE_NS, BASE_NS + 1),
        )
        .unwrap();
    let mut e2 = chain
        .sign(
            EventDraft::new("llm_call", "success")
                .with_facto_id("ft-2")
                .with_times(BASE_NS + 2, BASE_NS + 3),
        )
        .unwrap();
    e2.proof.prev_hash = "f".repeat(64);
    store.store_batch(&[e1, e2]).await.unwrap();
    let server = create_test_server(store);

    let response = server.get("/v1/verify/chain?session_id=session-bb").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["valid"], false);
    assert_eq!(body["checks"]["chain_integrity_valid"], false);
    let errors: Vec<String> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e.as_str().unwrap().to_string())
        .collect();
    assert!(errors
        .iter()
        .any(|e| e.contains("Chain broken at event: ft-2")));
}

#[tokio::test]
async fn test_verify_chain_detects_unlinked_but_valid_events() {
    // Two independently signed chains sharing a session id: every event is
    // individually valid but the second one restarts from zeros.
    let store = Arc::new(MemoryStore::new());
    let signer = AgentSigner::generate();

    let mut first = SessionChain::with_session_id("session-cc", "agent-test", signer.clone());
    let e1 = first
        .sign(
            EventDraft::new("llm_call", "success")
                .with_facto_id("ft-1")
                .with_times(BASE_NS, BASE_NS + 1),
        )
        .unwrap();

    let mut second = SessionChain::with_session_id("session-cc", "agent-test", signer);
    let e2 = second
        .sign(
            EventDraft::new("llm_call", "success")
                .with_facto_id("ft-2")
                .with_times(BASE_NS + 2, BASE_NS + 3),
        )
        .unwrap();

    store.store_batch(&[e1, e2]).await.unwrap();
    let server = create_test_server(store);

    let response = server.get("/v1/verify/chain?session_id=session-cc").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["checks"]["all_hashes_valid"], true);
    assert_eq!(body["checks"]["all_signatures_valid"], true);
    assert_eq!(body["checks"]["chain_integrity_valid"], false);
}

#[tokio::test]
async fn test_verify_chain_unknown_session_is_404() {
    let server = create_test_server(Arc::new(MemoryStore::new()));

    let response = server.get("/v1/verify/chain?session_id=session-none").await;

    response.assert_status_not_found();
}

// ============ Evidence Package Tests ============

#[tokio::test]
async fn test_evidence_package_proofs_fold_to_root() {
    let store = Arc::new(MemoryStore::new());
    seed_session(&store, "session-ev", 4).await;
    let server = create_test_server(store);

    let response = server.get("/v1/evidence-package?session_id=session-ev").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body["package_id"].as_str().unwrap().starts_with("ev-"));
    assert_eq!(body["package_id"].as_str().unwrap().len(), 3 + 16);
    assert_eq!(body["session_id"], "session-ev");
    assert_eq!(body["events"].as_array().unwrap().len(), 4);
    assert!(body["verification_instructions"]
        .as_str()
        .unwrap()
        .contains("SHA3-256"));

    let proofs = body["merkle_proofs"].as_array().unwrap();
    assert_eq!(proofs.len(), 4);
    for proof in proofs {
        let leaf = proof["event_hash"].as_str().unwrap();
        let root = proof["root"].as_str().unwrap();
        assert_eq!(fold_proof(leaf, proof["proof"].as_array().unwrap()), root);
    }
}

#[tokio::test]
async fn test_evidence_package_empty_session_is_404() {
    let server = create_test_server(Arc::new(MemoryStore::new()));

    let response = server.get("/v1/evidence-package?session_id=session-none").await;

    response.assert_status_not_found();
}

/// Independent proof fold, following the package's own recipe
fn fold_proof(leaf_hex: &str, elements: &[Value]) -> String {
    use sha2::{Digest, Sha256};

    let mut current = hex::decode(leaf_hex).unwrap();
    for element in elements {
        let sibling = hex::decode(element["hash"].as_str().unwrap()).unwrap();
        let mut hasher = Sha256::new();
        match element["position"].as_str().unwrap() {
            "left" => {
                hasher.update(&sibling);
                hasher.update(&current);
            }
            "right" => {
                hasher.update(&current);
                hasher.update(&sibling);
            }
            other => panic!("unexpected position {}", other),
        }
        current = hasher.finalize().to_vec();
    }
    hex::encode(current)
}
