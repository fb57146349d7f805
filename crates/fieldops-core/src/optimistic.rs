//! # Optimistic Response Synthesis
//!
//! Builds the locally synthesized results handed back to callers when a
//! mutation is queued instead of delivered, so UI state can update without
//! waiting for the eventual replay.
//!
//! ## Synthesis Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create   payload ⊔ { "id": <temp id>, "_isOptimistic": true }         │
//! │  update   current ⊔ patch ⊔ { "_isOptimistic": true }                  │
//! │  delete   { "success": true, "id": <id> }                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Later fields win on key collision, so a patch always overrides the known
//! current state it is merged onto.

use serde_json::{json, Map, Value};

use crate::error::{CoreError, CoreResult};

/// Marker key flagging a synthesized result as not-yet-confirmed.
pub const OPTIMISTIC_MARKER: &str = "_isOptimistic";

/// Describes a JSON value's type for error messages.
fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Borrows a value's object map, or fails with a typed error.
fn as_object<'a>(value: &'a Value, context: &'static str) -> CoreResult<&'a Map<String, Value>> {
    value.as_object().ok_or_else(|| CoreError::PayloadNotAnObject {
        context,
        found: type_name(value),
    })
}

/// Synthesizes the optimistic result for a queued create.
///
/// The payload is echoed back with the caller-supplied temporary id and the
/// optimistic marker merged in, so list views can show the new record before
/// the server has assigned a real id.
pub fn optimistic_create(payload: &Value, temp_id: &str) -> CoreResult<Value> {
    let mut merged = as_object(payload, "create payload")?.clone();
    merged.insert("id".to_string(), Value::String(temp_id.to_string()));
    merged.insert(OPTIMISTIC_MARKER.to_string(), Value::Bool(true));
    Ok(Value::Object(merged))
}

/// Synthesizes the optimistic result for a queued update.
///
/// Merges the known current entity state with the patch (patch fields win)
/// and the optimistic marker, so UI showing the entity reflects the pending
/// change without refetching. With no known current state, the patch alone
/// is marked and returned.
pub fn optimistic_update(current: Option<&Value>, patch: &Value) -> CoreResult<Value> {
    let mut merged = match current {
        Some(state) => as_object(state, "current entity state")?.clone(),
        None => Map::new(),
    };

    for (key, value) in as_object(patch, "update patch")? {
        merged.insert(key.clone(), value.clone());
    }
    merged.insert(OPTIMISTIC_MARKER.to_string(), Value::Bool(true));

    Ok(Value::Object(merged))
}

/// Synthesizes the optimistic result for a queued delete.
pub fn optimistic_delete(id: &str) -> Value {
    json!({ "success": true, "id": id })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_merges_temp_id_and_marker() {
        let payload = json!({ "name": "Acme Plumbing", "tier": "gold" });
        let result = optimistic_create(&payload, "tmp-7").unwrap();

        assert_eq!(result["name"], "Acme Plumbing");
        assert_eq!(result["tier"], "gold");
        assert_eq!(result["id"], "tmp-7");
        assert_eq!(result[OPTIMISTIC_MARKER], true);
    }

    #[test]
    fn test_update_patch_wins_over_current() {
        let current = json!({ "id": 42, "name": "Y", "age": 5 });
        let patch = json!({ "name": "X" });

        let result = optimistic_update(Some(&current), &patch).unwrap();

        assert_eq!(result["id"], 42);
        assert_eq!(result["name"], "X");
        assert_eq!(result["age"], 5);
        assert_eq!(result[OPTIMISTIC_MARKER], true);
    }

    #[test]
    fn test_update_without_current_state() {
        let patch = json!({ "status": "done" });
        let result = optimistic_update(None, &patch).unwrap();

        assert_eq!(result["status"], "done");
        assert_eq!(result[OPTIMISTIC_MARKER], true);
    }

    #[test]
    fn test_delete_ack_shape() {
        let result = optimistic_delete("inv-9");
        assert_eq!(result, json!({ "success": true, "id": "inv-9" }));
    }

    #[test]
    fn test_non_object_payload_is_rejected() {
        let err = optimistic_create(&json!([1, 2, 3]), "tmp-1").unwrap_err();
        assert!(err.to_string().contains("array"));

        let err = optimistic_update(Some(&json!("text")), &json!({})).unwrap_err();
        assert!(err.to_string().contains("string"));
    }
}
