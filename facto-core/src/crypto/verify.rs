//! Event verification
//!
//! Verification never throws: every failure mode (mismatched hash, malformed
//! Base64, wrong key or signature length, an invalid curve point) collapses
//! into a `false` flag in the outcome. Callers fold the booleans into their
//! own error surface.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use ed25519_dalek::{Signature, VerifyingKey};

use crate::canon::canonical_event_bytes;
use crate::types::{EventDigest, FactoEvent};

/// Outcome of a single-event verification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verification {
    /// Recomputed SHA3-256 of the canonical form matches `proof.event_hash`
    pub hash_valid: bool,
    /// Ed25519 signature over the canonical form checks out
    pub signature_valid: bool,
}

impl Verification {
    pub fn is_valid(&self) -> bool {
        self.hash_valid && self.signature_valid
    }
}

/// Re-derive the canonical form and check hash and signature
pub fn verify_event(event: &FactoEvent) -> Verification {
    let canonical = match canonical_event_bytes(event) {
        Ok(bytes) => bytes,
        Err(_) => {
            return Verification {
                hash_valid: false,
                signature_valid: false,
            }
        }
    };

    let hash_valid = EventDigest::sha3_256(&canonical).to_hex() == event.proof.event_hash;
    let signature_valid = verify_signature(&canonical, event);

    Verification {
        hash_valid,
        signature_valid,
    }
}

fn verify_signature(canonical: &[u8], event: &FactoEvent) -> bool {
    let public_key: [u8; 32] = match BASE64
        .decode(&event.proof.public_key)
        .ok()
        .and_then(|bytes| bytes.try_into().ok())
    {
        Some(bytes) => bytes,
        None => return false,
    };

    let verifying_key = match VerifyingKey::from_bytes(&public_key) {
        Ok(key) => key,
        Err(_) => return false,
    };

    let signature: [u8; 64] = match BASE64
        .decode(&event.proof.signature)
        .ok()
        .and_then(|bytes| bytes.try_into().ok())
    {
        Some(bytes) => bytes,
        None => return false,
    };

    verifying_key
        .verify_strict(canonical, &Signature::from_bytes(&signature))
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::signer::{AgentSigner, EventDraft, SessionChain};
    use proptest::prelude::*;
    use serde_json::json;

    fn signed_event() -> FactoEvent {
        let mut chain = SessionChain::new("agent-a", AgentSigner::generate());
        chain
            .sign(
                EventDraft::new("llm_call", "success")
                    .with_input(json!({"prompt": "test"}))
                    .with_output(json!({"response": "ok"}))
                    .with_times(1_000, 2_000),
            )
            .unwrap()
    }

    #[test]
    fn test_untampered_event_passes() {
        let outcome = verify_event(&signed_event());
        assert!(outcome.hash_valid);
        assert!(outcome.signature_valid);
        assert!(outcome.is_valid());
    }

    #[test]
    fn test_tampered_status_fails_both() {
        let mut event = signed_event();
        event.status = "error".to_string();
        let outcome = verify_event(&event);
        assert!(!outcome.hash_valid);
        assert!(!outcome.signature_valid);
    }

    #[test]
    fn test_tampered_hash_fails_hash_only() {
        let mut event = signed_event();
        event.proof.event_hash = "f".repeat(64);
        let outcome = verify_event(&event);
        assert!(!outcome.hash_valid);
        // Canonical bytes are unchanged, so the signature still verifies
        assert!(outcome.signature_valid);
    }

    #[test]
    fn test_malformed_base64_never_panics() {
        let mut event = signed_event();
        event.proof.signature = "%%%not-base64%%%".to_string();
        assert!(!verify_event(&event).signature_valid);

        let mut event = signed_event();
        event.proof.public_key = "%%%not-base64%%%".to_string();
        assert!(!verify_event(&event).signature_valid);
    }

    #[test]
    fn test_wrong_lengths_fail_closed() {
        use base64::engine::general_purpose::STANDARD as BASE64;
        use base64::Engine as _;

        let mut event = signed_event();
        event.proof.public_key = BASE64.encode([0u8; 16]);
        assert!(!verify_event(&event).signature_valid);

        let mut event = signed_event();
        event.proof.signature = BASE64.encode([0u8; 32]);
        assert!(!verify_event(&event).signature_valid);
    }

    #[test]
    fn test_foreign_key_fails_signature() {
        let mut event = signed_event();
        event.proof.public_key = AgentSigner::generate().public_key_b64();
        let outcome = verify_event(&event);
        assert!(outcome.hash_valid);
        assert!(!outcome.signature_valid);
    }

    proptest! {
        // Any mutation of a canonical field flips at least one flag
        #[test]
        fn prop_field_tamper_is_detected(which in 0usize..5, payload in "[a-z0-9]{1,16}") {
            let mut event = signed_event();
            match which {
                0 => event.status = format!("tampered-{}", payload),
                1 => event.agent_id = format!("agent-{}", payload),
                2 => event.input_data = json!({ "prompt": payload }),
                3 => event.completed_at += 1,
                _ => event.proof.prev_hash = "f".repeat(64),
            }
            let outcome = verify_event(&event);
            prop_assert!(!outcome.hash_valid || !outcome.signature_valid);
        }

        // Mutating a non-canonical field changes nothing
        #[test]
        fn prop_uncovered_fields_do_not_affect_verification(payload in "[a-z0-9]{1,16}") {
            let mut event = signed_event();
            event.execution_meta.model_hash = Some(payload.clone());
            event.execution_meta.max_tokens = Some(4096);
            event.execution_meta.sdk_language = payload.clone();
            event.execution_meta.tags.insert("k".into(), payload);
            let outcome = verify_event(&event);
            prop_assert!(outcome.hash_valid && outcome.signature_valid);
        }
    }
}
