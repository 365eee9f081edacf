//! Canonical serialization
//!
//! The canonical form is the single byte-exact serialization every producer
//! and verifier must agree on: JSON with keys sorted lexicographically at
//! every nesting level, no insignificant whitespace, shortest round-trip
//! numbers, UTF-8. Sorting is performed here explicitly rather than
//! delegated to a serializer whose map ordering depends on feature flags.
//!
//! The canonical form of an event covers exactly twelve top-level keys and a
//! restricted `execution_meta`:
//! - `model_id` and `temperature` are omitted when unset, `seed` is always
//!   present (null when unset)
//! - `model_hash`, `max_tokens`, `tags` and `sdk_language` never participate
//! - `parent_facto_id` is serialized as `null` when absent
//! - `prev_hash` carries the chain pointer; the event's own `event_hash` and
//!   `signature` are outputs and are excluded
//!
//! These asymmetries are preserved exactly for wire compatibility with
//! producers already in the field; the excluded fields are therefore not
//! tamper-evident.

use serde_json::{json, Map, Value};

use crate::error::FactoResult;
use crate::types::FactoEvent;

/// Build the canonical byte form of an event for hashing and signing.
///
/// Reads the chain pointer from `event.proof.prev_hash`; `signature` and
/// `event_hash` may be empty or stale, they do not participate.
pub fn canonical_event_bytes(event: &FactoEvent) -> FactoResult<Vec<u8>> {
    let mut root = Map::new();

    root.insert("action_type".to_string(), json!(event.action_type));
    root.insert("agent_id".to_string(), json!(event.agent_id));
    root.insert("completed_at".to_string(), json!(event.completed_at));

    let mut exec_meta = Map::new();
    if let Some(ref model_id) = event.execution_meta.model_id {
        exec_meta.insert("model_id".to_string(), json!(model_id));
    }
    exec_meta.insert("seed".to_string(), json!(event.execution_meta.seed));
    exec_meta.insert(
        "sdk_version".to_string(),
        json!(event.execution_meta.sdk_version),
    );
    if let Some(temperature) = event.execution_meta.temperature {
        exec_meta.insert("temperature".to_string(), json!(temperature));
    }
    exec_meta.insert(
        "tool_calls".to_string(),
        json!(event.execution_meta.tool_calls),
    );
    root.insert("execution_meta".to_string(), Value::Object(exec_meta));

    root.insert("facto_id".to_string(), json!(event.facto_id));
    root.insert("input_data".to_string(), event.input_data.clone());
    root.insert("output_data".to_string(), event.output_data.clone());
    root.insert("parent_facto_id".to_string(), json!(event.parent_facto_id));
    root.insert("prev_hash".to_string(), json!(event.proof.prev_hash));
    root.insert("session_id".to_string(), json!(event.session_id));
    root.insert("started_at".to_string(), json!(event.started_at));
    root.insert("status".to_string(), json!(event.status));

    Ok(canonical_json(&Value::Object(root)))
}

/// Serialize a JSON value canonically: sorted keys at every level, no
/// insignificant whitespace.
pub fn canonical_json(value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort_unstable();
            out.push(b'{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_scalar(&Value::String((*key).clone()), out);
                out.push(b':');
                write_canonical(&map[*key], out);
            }
            out.push(b'}');
        }
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_canonical(item, out);
            }
            out.push(b']');
        }
        scalar => write_scalar(scalar, out),
    }
}

fn write_scalar(value: &Value, out: &mut Vec<u8>) {
    // serde_json emits shortest round-trip numbers and standard escapes;
    // scalars have no map ordering to worry about.
    serde_json::to_writer(&mut *out, value).expect("scalar serialization is infallible");
}
