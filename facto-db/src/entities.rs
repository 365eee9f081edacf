//! Row-level entities mapping events onto the CQL column layout

use chrono::{DateTime, Utc};
use scylla::{FromRow, SerializeRow, ValueList};
use std::collections::HashMap;

use facto_core::types::{ExecutionMeta, FactoEvent, Proof};

use crate::error::{StoreError, StoreResult};
use crate::store::event_date;

/// One event row; field order matches [`crate::schema::EVENT_COLUMNS`]
#[derive(Debug, Clone, FromRow, ValueList, SerializeRow)]
pub struct EventRow {
    pub agent_id: String,
    pub date: chrono::NaiveDate,
    pub facto_id: String,
    pub session_id: String,
    pub parent_facto_id: Option<String>,
    pub action_type: String,
    pub status: String,
    pub input_data: Vec<u8>,
    pub output_data: Vec<u8>,
    pub model_id: Option<String>,
    pub model_hash: Option<String>,
    pub temperature: Option<f64>,
    pub seed: Option<i64>,
    pub max_tokens: Option<i32>,
    pub tool_calls: Vec<u8>,
    pub sdk_version: String,
    pub sdk_language: String,
    pub tags: Option<HashMap<String, String>>,
    pub signature: Vec<u8>,
    pub public_key: Vec<u8>,
    pub prev_hash: String,
    pub event_hash: String,
    pub started_at: i64,
    pub completed_at: i64,
    pub received_at: DateTime<Utc>,
}

impl EventRow {
    /// Flatten an event into a row; `received_at` is stamped by the caller
    pub fn from_event(event: &FactoEvent, received_at: DateTime<Utc>) -> StoreResult<Self> {
        Ok(Self {
            agent_id: event.agent_id.clone(),
            date: event_date(event.completed_at),
            facto_id: event.facto_id.clone(),
            session_id: event.session_id.clone(),
            parent_facto_id: event.parent_facto_id.clone(),
            action_type: event.action_type.clone(),
            status: event.status.clone(),
            input_data: serde_json::to_vec(&event.input_data)?,
            output_data: serde_json::to_vec(&event.output_data)?,
            model_id: event.execution_meta.model_id.clone(),
            model_hash: event.execution_meta.model_hash.clone(),
            temperature: event.execution_meta.temperature,
            seed: event.execution_meta.seed,
            max_tokens: event.execution_meta.max_tokens,
            tool_calls: serde_json::to_vec(&event.execution_meta.tool_calls)?,
            sdk_version: event.execution_meta.sdk_version.clone(),
            sdk_language: event.execution_meta.sdk_language.clone(),
            tags: if event.execution_meta.tags.is_empty() {
                None
            } else {
                Some(event.execution_meta.tags.clone().into_iter().collect())
            },
            // Signature and key are stored as their Base64 ASCII bytes
            signature: event.proof.signature.clone().into_bytes(),
            public_key: event.proof.public_key.clone().into_bytes(),
            prev_hash: event.proof.prev_hash.clone(),
            event_hash: event.proof.event_hash.clone(),
            started_at: event.started_at,
            completed_at: event.completed_at,
            received_at,
        })
    }

    /// Rebuild the wire-shape event from a row
    pub fn into_event(self) -> StoreResult<FactoEvent> {
        let input_data = decode_json(&self.input_data)?;
        let output_data = decode_json(&self.output_data)?;
        let tool_calls: Vec<serde_json::Value> = if self.tool_calls.is_empty() {
            Vec::new()
        } else {
            serde_json::from_slice(&self.tool_calls)?
        };

        Ok(FactoEvent {
            facto_id: self.facto_id,
            agent_id: self.agent_id,
            session_id: self.session_id,
            parent_facto_id: self.parent_facto_id,
            action_type: self.action_type,
            status: self.status,
            input_data,
            output_data,
            execution_meta: ExecutionMeta {
                model_id: self.model_id,
                model_hash: self.model_hash,
                temperature: self.temperature,
                seed: self.seed,
                max_tokens: self.max_tokens,
                tool_calls,
                sdk_version: self.sdk_version,
                sdk_language: self.sdk_language,
                tags: self.tags.unwrap_or_default().into_iter().collect(),
            },
            proof: Proof {
                signature: String::from_utf8(self.signature)
                    .map_err(|e| StoreError::Decode(format!("signature column: {}", e)))?,
                public_key: String::from_utf8(self.public_key)
                    .map_err(|e| StoreError::Decode(format!("public_key column: {}", e)))?,
                prev_hash: self.prev_hash,
                event_hash: self.event_hash,
            },
            started_at: self.started_at,
            completed_at: self.completed_at,
        })
    }
}

fn decode_json(bytes: &[u8]) -> StoreResult<serde_json::Value> {
    if bytes.is_empty() {
        return Ok(serde_json::Value::Object(Default::default()));
    }
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use facto_core::{AgentSigner, EventDraft, SessionChain};
    use serde_json::json;

    #[test]
    fn test_row_roundtrip_preserves_event() {
        let mut chain = SessionChain::new("agent-a", AgentSigner::generate());
        let event = chain
            .sign(
                EventDraft::new("llm_call", "success")
                    .with_input(json!({"prompt": "hi"}))
                    .with_output(json!({"response": "ok", "tokens": 3}))
                    .with_times(1_700_000_000_000_000_000, 1_700_000_001_000_000_000)
                    .with_tag("env", "test"),
            )
            .unwrap();

        let row = EventRow::from_event(&event, Utc::now()).unwrap();
        let back = row.into_event().unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_empty_blobs_decode_to_defaults() {
        let mut chain = SessionChain::new("agent-a", AgentSigner::generate());
        let event = chain.sign(EventDraft::new("tool_use", "success")).unwrap();
        let mut row = EventRow::from_event(&event, Utc::now()).unwrap();
        row.input_data = Vec::new();
        row.tool_calls = Vec::new();
        row.tags = None;

        let back = row.into_event().unwrap();
        assert_eq!(back.input_data, json!({}));
        assert!(back.execution_meta.tool_calls.is_empty());
        assert!(back.execution_meta.tags.is_empty());
    }
}
