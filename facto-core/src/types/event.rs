//! The event model
//!
//! A facto is one recorded agent action. Events are born signed in a
//! producer, travel over the message bus as JSON, and are immutable once
//! persisted. The wire shape is snake_case with integer-nanosecond
//! timestamps; `proof` carries the Base64 Ed25519 material and the hex
//! hash-chain pointers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One recorded agent action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactoEvent {
    /// Globally unique identifier, prefixed `ft-`
    pub facto_id: String,
    /// Producer identity
    pub agent_id: String,
    /// Chain-linking group, prefixed `session-`
    pub session_id: String,
    /// Optional parent, forming a tree within the session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_facto_id: Option<String>,

    /// Free-form action label ("llm_call", "tool_use", ...)
    pub action_type: String,
    /// "success", "error" or another producer-defined status
    pub status: String,

    pub input_data: serde_json::Value,
    pub output_data: serde_json::Value,

    pub execution_meta: ExecutionMeta,
    pub proof: Proof,

    /// Nanoseconds since UNIX epoch
    pub started_at: i64,
    /// Nanoseconds since UNIX epoch
    pub completed_at: i64,
}

/// Execution metadata attached to an event
///
/// Only `model_id`, `seed`, `sdk_version`, `temperature` and `tool_calls`
/// participate in the canonical form (see `canon`); the remaining fields are
/// stored and returned but are not tamper-evident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<i32>,
    #[serde(default)]
    pub tool_calls: Vec<serde_json::Value>,
    pub sdk_version: String,
    pub sdk_language: String,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl Default for ExecutionMeta {
    fn default() -> Self {
        Self {
            model_id: None,
            model_hash: None,
            temperature: None,
            seed: None,
            max_tokens: None,
            tool_calls: Vec::new(),
            sdk_version: env!("CARGO_PKG_VERSION").to_string(),
            sdk_language: "rust".to_string(),
            tags: BTreeMap::new(),
        }
    }
}

/// Cryptographic proof material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proof {
    /// Base64 Ed25519 signature (64 raw bytes)
    pub signature: String,
    /// Base64 Ed25519 public key (32 raw bytes)
    pub public_key: String,
    /// Hex SHA3-256 of the previous event in the session chain,
    /// or 64 zeros for the first event
    pub prev_hash: String,
    /// Hex SHA3-256 of this event's canonical form
    pub event_hash: String,
}

impl Proof {
    /// An unsigned proof carrying only the chain pointer
    pub fn unsigned(prev_hash: String) -> Self {
        Self {
            signature: String::new(),
            public_key: String::new(),
            prev_hash,
            event_hash: String::new(),
        }
    }
}
