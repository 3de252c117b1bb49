//! Wire types for the inspector boundary.
//! - TaggedResult: the sole result shape crossing the boundary
//! - SerializationResult/ComponentTreeNode: snapshot payloads
//! - BreakpointSpec/BreakpointView/UpdateOp/FunctionCall: request shapes

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Call-level outcome tag. `Ignore` tells the caller to retry later, e.g.
/// when no component is currently selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
    Ignore,
}

/// Every entry point returns this shape; no error crosses the boundary any
/// other way.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaggedResult {
    pub status: Status,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub detail: serde_json::Value,
}

impl TaggedResult {
    /// Success carrying `detail` serialized to JSON.
    #[must_use]
    pub fn success(detail: impl Serialize) -> Self {
        Self {
            status: Status::Success,
            detail: serde_json::to_value(detail).unwrap_or(serde_json::Value::Null),
        }
    }

    /// Error carrying a message text.
    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            detail: serde_json::Value::String(text.into()),
        }
    }

    /// Retry-later outcome with no payload.
    #[must_use]
    pub fn ignore() -> Self {
        Self {
            status: Status::Ignore,
            detail: serde_json::Value::Null,
        }
    }
}

/// Diagnostic severity inside [`SerializationResult::messages`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Info,
    Error,
}

/// Per-path diagnostic recorded during serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticMessage {
    pub kind: MessageKind,
    pub text: String,
}

impl DiagnosticMessage {
    pub(crate) fn info(text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Info,
            text: text.into(),
        }
    }

    pub(crate) fn error(text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Error,
            text: text.into(),
        }
    }
}

/// Bounded snapshot of a model graph. Produced fresh per request and never
/// mutated after return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializationResult {
    /// JSON tree mirroring the serialized paths.
    pub view_model_data: serde_json::Value,
    /// Dotted path to type label.
    pub type_names: BTreeMap<String, String>,
    /// Dotted path to diagnostic.
    pub messages: BTreeMap<String, DiagnosticMessage>,
    /// Dotted paths holding the missing sentinel, in discovery order.
    pub undefineds: Vec<String>,
}

/// Options accepted by `getSerializedViewModelData`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializeOptions {
    #[serde(default)]
    pub expanded_keys: Vec<String>,
}

/// One node of the component tree. Ids are call-local: a later walk
/// reassigns them from zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentTreeNode {
    pub id: u32,
    pub path: String,
    pub tag_name: String,
    pub selected: bool,
    pub children: Vec<ComponentTreeNode>,
}

/// Request shape for `addBreakpoint`. `error` propagates a selection
/// failure detected on the caller's side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakpointSpec {
    pub expression: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn default_enabled() -> bool {
    true
}

/// Registry entry as reported by `getBreakpoints`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakpointView {
    pub id: u32,
    pub expression: String,
    pub display_expression: String,
    pub enabled: bool,
}

/// One mutation applied by `updateViewModel`. Ops apply in sequence to the
/// live model; `splice` targets the model itself or, with `key`, an ordered
/// member.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum UpdateOp {
    Set {
        key: String,
        value: serde_json::Value,
    },
    Delete {
        key: String,
    },
    #[serde(rename_all = "camelCase")]
    Splice {
        #[serde(default)]
        key: Option<String>,
        index: usize,
        #[serde(default)]
        delete_count: usize,
        #[serde(default)]
        insert: Vec<serde_json::Value>,
    },
}

/// Function-call request delivered by the transport collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub function: String,
    #[serde(default)]
    pub arguments: Vec<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tagged_result_round_trips() {
        let result = TaggedResult::success(json!({"ok": true}));
        let text = serde_json::to_string(&result).unwrap();
        assert_eq!(text, r#"{"status":"success","detail":{"ok":true}}"#);
        let back: TaggedResult = serde_json::from_str(&text).unwrap();
        assert_eq!(back, result);

        let ignored = serde_json::to_string(&TaggedResult::ignore()).unwrap();
        assert_eq!(ignored, r#"{"status":"ignore"}"#);
    }

    #[test]
    fn update_ops_deserialize_from_tagged_json() {
        let ops: Vec<UpdateOp> = serde_json::from_value(json!([
            {"type": "set", "key": "name", "value": "Beata"},
            {"type": "delete", "key": "age"},
            {"type": "splice", "key": "hobbies", "index": 1, "deleteCount": 0, "insert": ["chess"]}
        ]))
        .unwrap();
        assert_eq!(ops.len(), 3);
        match &ops[2] {
            UpdateOp::Splice {
                key,
                index,
                delete_count,
                insert,
            } => {
                assert_eq!(key.as_deref(), Some("hobbies"));
                assert_eq!((*index, *delete_count), (1, 0));
                assert_eq!(insert, &vec![json!("chess")]);
            }
            other => panic!("expected splice, got {other:?}"),
        }
    }

    #[test]
    fn breakpoint_spec_defaults_to_enabled() {
        let spec: BreakpointSpec =
            serde_json::from_value(json!({"expression": "hobbies.length > 1"})).unwrap();
        assert!(spec.enabled);
        assert!(spec.error.is_none());
    }
}
