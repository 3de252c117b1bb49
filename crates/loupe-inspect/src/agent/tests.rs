//! Agent dispatch tests.
//! - tagged-result status mapping per entry point
//! - snapshot/update/selection flows against the sample page

use serde_json::json;

use loupe_model::harness::sample_page;
use loupe_model::Page;

use super::InspectorAgent;
use crate::protocol::{BreakpointView, ComponentTreeNode, FunctionCall, SerializationResult, Status};

fn call(function: &str, arguments: Vec<serde_json::Value>) -> FunctionCall {
    FunctionCall {
        function: function.to_string(),
        arguments,
    }
}

fn sample_agent() -> InspectorAgent {
    InspectorAgent::new(sample_page().page)
}

#[test]
fn unknown_function_is_an_error() {
    let mut agent = sample_agent();
    let result = agent.dispatch(&call("inspectEverything", Vec::new()));
    assert_eq!(result.status, Status::Error);
    assert_eq!(result.detail, json!("unknown function 'inspectEverything'"));
}

#[test]
fn data_pulls_without_selection_are_ignored() {
    let mut agent = InspectorAgent::new(Page::new());
    for function in ["getSerializedViewModelData", "getViewModelKeys", "updateViewModel"] {
        let result = agent.dispatch(&call(function, vec![json!([])]));
        assert_eq!(result.status, Status::Ignore, "{function}");
    }
}

#[test]
fn serialized_data_honors_expanded_keys() {
    let mut agent = sample_agent();
    let result = agent.dispatch(&call(
        "getSerializedViewModelData",
        vec![json!({"expandedKeys": ["hobbies"]})],
    ));
    assert_eq!(result.status, Status::Success);
    let snapshot: SerializationResult = serde_json::from_value(result.detail).unwrap();
    assert_eq!(
        snapshot.view_model_data["hobbies"],
        json!({"0": "reading", "1": "sailing"})
    );
    assert_eq!(snapshot.type_names["hobbies"], "Array[]");
}

#[test]
fn view_model_keys_lists_public_keys_in_order() {
    let mut agent = sample_agent();
    let result = agent.dispatch(&call("getViewModelKeys", Vec::new()));
    assert_eq!(result.status, Status::Success);
    assert_eq!(result.detail, json!(["name", "age", "hobbies", "greet"]));
}

#[test]
fn component_tree_then_select_then_reinspect() {
    let mut agent = sample_agent();
    let result = agent.dispatch(&call("getComponentTreeData", Vec::new()));
    assert_eq!(result.status, Status::Success);
    let nodes: Vec<ComponentTreeNode> = serde_json::from_value(result.detail).unwrap();
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].id, 0);
    assert!(nodes[0].children[0].selected);

    // select the app component, then inspect its model
    let result = agent.dispatch(&call("selectComponentById", vec![json!(0)]));
    assert_eq!(result.status, Status::Success);
    let result = agent.dispatch(&call("getViewModelKeys", Vec::new()));
    assert_eq!(result.detail, json!(["title"]));
}

#[test]
fn select_with_stale_or_missing_walk_is_an_error() {
    let mut agent = sample_agent();
    let result = agent.dispatch(&call("selectComponentById", vec![json!(0)]));
    assert_eq!(result.status, Status::Error);

    agent.dispatch(&call("getComponentTreeData", Vec::new()));
    let result = agent.dispatch(&call("selectComponentById", vec![json!(42)]));
    assert_eq!(result.status, Status::Error);
    assert_eq!(result.detail, json!("unknown component id 42"));
}

#[test]
fn update_view_model_splice_reflects_in_next_snapshot() {
    let mut agent = sample_agent();
    let result = agent.dispatch(&call(
        "updateViewModel",
        vec![json!([
            {"type": "set", "key": "name", "value": "Beata"},
            {"type": "splice", "key": "hobbies", "index": 1, "deleteCount": 1, "insert": ["chess", "running"]}
        ])],
    ));
    assert_eq!(result.status, Status::Success);

    let result = agent.dispatch(&call(
        "getSerializedViewModelData",
        vec![json!({"expandedKeys": ["hobbies"]})],
    ));
    let snapshot: SerializationResult = serde_json::from_value(result.detail).unwrap();
    assert_eq!(snapshot.view_model_data["name"], json!("Beata"));
    assert_eq!(
        snapshot.view_model_data["hobbies"],
        json!({"0": "reading", "1": "chess", "2": "running"})
    );
}

#[test]
fn update_view_model_rejects_bad_ops() {
    let mut agent = sample_agent();
    let result = agent.dispatch(&call("updateViewModel", vec![json!("not-ops")]));
    assert_eq!(result.status, Status::Error);
    assert_eq!(result.detail, json!("invalid updateViewModel arguments"));

    // splicing a keyed member is a model error surfaced through the tag
    let result = agent.dispatch(&call(
        "updateViewModel",
        vec![json!([{"type": "splice", "key": "name", "index": 0}])],
    ));
    assert_eq!(result.status, Status::Error);
    assert_eq!(result.detail, json!("cannot splice a string"));
}

#[test]
fn breakpoint_lifecycle_through_dispatch() {
    let mut agent = sample_agent();
    let result = agent.dispatch(&call(
        "addBreakpoint",
        vec![json!({"expression": "hobbies.length > 1"})],
    ));
    assert_eq!(result.status, Status::Success);
    let view: BreakpointView = serde_json::from_value(result.detail).unwrap();
    assert_eq!(view.id, 1);
    assert_eq!(view.display_expression, "Person.hobbies.length > 1");
    assert!(view.enabled);

    let result = agent.dispatch(&call("toggleBreakpoint", vec![json!(view.id)]));
    let toggled: BreakpointView = serde_json::from_value(result.detail).unwrap();
    assert!(!toggled.enabled);

    let result = agent.dispatch(&call("getBreakpoints", Vec::new()));
    let views: Vec<BreakpointView> = serde_json::from_value(result.detail).unwrap();
    assert_eq!(views.len(), 1);
    assert!(!views[0].enabled);

    let result = agent.dispatch(&call("deleteBreakpoint", vec![json!(view.id)]));
    assert_eq!(result.status, Status::Success);
    let result = agent.dispatch(&call("getBreakpoints", Vec::new()));
    assert_eq!(result.detail, json!([]));
}

#[test]
fn add_breakpoints_reports_per_entry_outcomes() {
    let mut agent = sample_agent();
    let result = agent.dispatch(&call(
        "addBreakpoints",
        vec![json!([
            {"expression": "age"},
            {"expression": "name", "error": "no component selected in panel"}
        ])],
    ));
    assert_eq!(result.status, Status::Success);
    let entries = result.detail.as_array().unwrap().clone();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["status"], json!("success"));
    assert_eq!(entries[1]["status"], json!("error"));
    assert_eq!(entries[1]["detail"], json!("no component selected in panel"));
}

#[test]
fn add_breakpoint_without_selection_is_an_error() {
    let mut agent = InspectorAgent::new(Page::new());
    let result = agent.dispatch(&call("addBreakpoint", vec![json!({"expression": "age"})]));
    assert_eq!(result.status, Status::Error);
    assert_eq!(result.detail, json!("no component is currently selected"));
}
