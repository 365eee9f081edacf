//! Event signing and per-session chain state
//!
//! A producer holds one [`AgentSigner`] (an Ed25519 keypair) and one
//! [`SessionChain`] per session. The chain owns the `prev_hash` pointer:
//! it starts at 64 zeros, and after every successful local sign it advances
//! to the freshly computed `event_hash`, regardless of whether the event is
//! ever transmitted. That advance-on-sign behavior is a producer design
//! choice, not a protocol requirement.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use ed25519_dalek::{Signer as _, SigningKey, VerifyingKey};
use rand_core::OsRng;
use serde_json::Value;
use uuid::Uuid;

use crate::canon::canonical_event_bytes;
use crate::constants::{FACTO_ID_PREFIX, SESSION_ID_PREFIX};
use crate::error::{FactoError, FactoResult};
use crate::types::{EventDigest, ExecutionMeta, FactoEvent, Proof};

/// Ed25519 keypair for an agent
#[derive(Clone)]
pub struct AgentSigner {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl AgentSigner {
    /// Generate a new random keypair
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Create from existing secret key bytes (32 bytes)
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(bytes);
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Base64 of the 32-byte public key, as carried in `proof.public_key`
    pub fn public_key_b64(&self) -> String {
        BASE64.encode(self.verifying_key.to_bytes())
    }

    /// Sign raw bytes, returning the Base64 signature
    pub fn sign_b64(&self, message: &[u8]) -> String {
        BASE64.encode(self.signing_key.sign(message).to_bytes())
    }
}

/// Everything an event carries except its proof
#[derive(Debug, Clone)]
pub struct EventDraft {
    pub facto_id: String,
    pub parent_facto_id: Option<String>,
    pub action_type: String,
    pub status: String,
    pub input_data: Value,
    pub output_data: Value,
    pub execution_meta: ExecutionMeta,
    pub started_at: i64,
    pub completed_at: i64,
}

impl EventDraft {
    /// Create a draft with a fresh `ft-` id and empty payloads
    pub fn new(action_type: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            facto_id: new_facto_id(),
            parent_facto_id: None,
            action_type: action_type.into(),
            status: status.into(),
            input_data: Value::Object(Default::default()),
            output_data: Value::Object(Default::default()),
            execution_meta: ExecutionMeta::default(),
            started_at: 0,
            completed_at: 0,
        }
    }

    pub fn with_facto_id(mut self, facto_id: impl Into<String>) -> Self {
        self.facto_id = facto_id.into();
        self
    }

    pub fn with_parent(mut self, parent_facto_id: impl Into<String>) -> Self {
        self.parent_facto_id = Some(parent_facto_id.into());
        self
    }

    pub fn with_input(mut self, input_data: Value) -> Self {
        self.input_data = input_data;
        self
    }

    pub fn with_output(mut self, output_data: Value) -> Self {
        self.output_data = output_data;
        self
    }

    pub fn with_times(mut self, started_at: i64, completed_at: i64) -> Self {
        self.started_at = started_at;
        self.completed_at = completed_at;
        self
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.execution_meta.tags.insert(key.into(), value.into());
        self
    }
}

/// Generate a fresh event identifier
pub fn new_facto_id() -> String {
    format!("{}{}", FACTO_ID_PREFIX, Uuid::new_v4())
}

/// Generate a fresh session identifier
pub fn new_session_id() -> String {
    format!("{}{}", SESSION_ID_PREFIX, Uuid::new_v4())
}

/// Per-session signing state: a single-writer hash chain
pub struct SessionChain {
    session_id: String,
    agent_id: String,
    signer: AgentSigner,
    prev_hash: EventDigest,
}

impl SessionChain {
    /// Start a new session chain; `prev_hash` resets to zeros
    pub fn new(agent_id: impl Into<String>, signer: AgentSigner) -> Self {
        Self {
            session_id: new_session_id(),
            agent_id: agent_id.into(),
            signer,
            prev_hash: EventDigest::zero(),
        }
    }

    /// Start a chain with a caller-chosen session id
    pub fn with_session_id(
        session_id: impl Into<String>,
        agent_id: impl Into<String>,
        signer: AgentSigner,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            agent_id: agent_id.into(),
            signer,
            prev_hash: EventDigest::zero(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Current chain pointer (hex of the last signed event's hash)
    pub fn prev_hash(&self) -> String {
        self.prev_hash.to_hex()
    }

    /// Sign a draft into a complete event and advance the chain
    pub fn sign(&mut self, draft: EventDraft) -> FactoResult<FactoEvent> {
        let mut event = FactoEvent {
            facto_id: draft.facto_id,
            agent_id: self.agent_id.clone(),
            session_id: self.session_id.clone(),
            parent_facto_id: draft.parent_facto_id,
            action_type: draft.action_type,
            status: draft.status,
            input_data: draft.input_data,
            output_data: draft.output_data,
            execution_meta: draft.execution_meta,
            proof: Proof::unsigned(self.prev_hash.to_hex()),
            started_at: draft.started_at,
            completed_at: draft.completed_at,
        };

        let canonical = canonical_event_bytes(&event)?;
        let event_hash = EventDigest::sha3_256(&canonical);

        event.proof.event_hash = event_hash.to_hex();
        event.proof.signature = self.signer.sign_b64(&canonical);
        event.proof.public_key = self.signer.public_key_b64();

        // The chain advances on every sign, even if the event is never sent
        self.prev_hash = event_hash;

        Ok(event)
    }
}

impl std::fmt::Debug for AgentSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentSigner")
            .field("public_key", &self.public_key_b64())
            .finish_non_exhaustive()
    }
}

impl AgentSigner {
    /// Create from a Base64-encoded 32-byte secret key
    pub fn from_b64(secret: &str) -> FactoResult<Self> {
        let bytes = BASE64
            .decode(secret)
            .map_err(|e| FactoError::InvalidKey(format!("invalid base64: {}", e)))?;
        let arr: [u8; 32] = bytes.try_into().map_err(|bytes: Vec<u8>| {
            FactoError::InvalidKey(format!("expected 32 bytes, got {}", bytes.len()))
        })?;
        Ok(Self::from_bytes(&arr))
    }
}
