//! Bounded graph serialization.
//! - serialize: depth-first, expansion-gated walk producing a flat snapshot
//! - view_model_keys: public top-level keys of a model
//!
//! Expansion is opt-in and path-scoped: a container whose dotted path is not
//! in the expansion set serializes as an empty placeholder, so the snapshot
//! is always finite and JSON-transmissible no matter how cyclic the
//! inspected graph is.

use rustc_hash::FxHashSet;
use smol_str::SmolStr;

use loupe_model::observe::ContainerId;
use loupe_model::{ModelStore, Page, RecordId, SeqId, Value};

use crate::namer::{constructor_name, name_of};
use crate::protocol::{DiagnosticMessage, SerializationResult};

/// Backstop for degenerate expansion sets; the expansion set itself is what
/// normally bounds the walk.
pub const MAX_DEPTH: usize = 64;

/// Shape classification evaluated once per path.
enum Shape {
    Missing,
    Primitive,
    ElementNode(SmolStr),
    Function(SmolStr),
    Keyed(RecordId),
    Ordered(SeqId),
}

fn classify(page: &Page, value: &Value) -> Shape {
    match value {
        Value::Undefined => Shape::Missing,
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::Str(_) => Shape::Primitive,
        Value::Function(function) => Shape::Function(function.source.clone()),
        Value::Element(id) => {
            Shape::ElementNode(page.kind_of(*id).unwrap_or_else(|| SmolStr::new("HTMLElement")))
        }
        Value::Record(id) => Shape::Keyed(*id),
        Value::Seq(id) => Shape::Ordered(*id),
        Value::Computed(_) => Shape::Missing, // resolved before classification
    }
}

struct Walker<'a> {
    page: &'a Page,
    store: ModelStore,
    expanded: &'a FxHashSet<String>,
    visited: FxHashSet<ContainerId>,
    type_names: std::collections::BTreeMap<String, String>,
    messages: std::collections::BTreeMap<String, DiagnosticMessage>,
    undefineds: Vec<String>,
}

/// Serialize `root` over its own top-level keys, recursing only into
/// containers whose dotted path is in `expanded`.
#[must_use]
pub fn serialize(page: &Page, root: &Value, expanded: &FxHashSet<String>) -> SerializationResult {
    let mut walker = Walker {
        page,
        store: page.store(),
        expanded,
        visited: FxHashSet::default(),
        type_names: std::collections::BTreeMap::new(),
        messages: std::collections::BTreeMap::new(),
        undefineds: Vec::new(),
    };
    let view_model_data = walker.serialize_root(root);
    SerializationResult {
        view_model_data,
        type_names: walker.type_names,
        messages: walker.messages,
        undefineds: walker.undefineds,
    }
}

/// Public top-level keys of a model or collection: implementation-prefixed
/// (`_`) keys excluded, container order preserved.
#[must_use]
pub fn view_model_keys(page: &Page, root: &Value) -> Vec<String> {
    let store = page.store();
    match root {
        Value::Record(id) => store
            .record_fields(*id)
            .into_iter()
            .filter(|(key, _)| !key.starts_with('_'))
            .map(|(key, _)| key.to_string())
            .collect(),
        Value::Seq(id) => (0..store.seq_len(*id)).map(|index| index.to_string()).collect(),
        _ => Vec::new(),
    }
}

impl Walker<'_> {
    fn serialize_root(&mut self, root: &Value) -> serde_json::Value {
        match classify(self.page, root) {
            Shape::Keyed(id) => {
                self.visited.insert(ContainerId::Record(id));
                self.members_object(members_of_record(&self.store, id), None, 0)
            }
            Shape::Ordered(id) => {
                self.visited.insert(ContainerId::Seq(id));
                self.members_object(members_of_seq(&self.store, id), None, 0)
            }
            _ => root.to_json().unwrap_or(serde_json::Value::Null),
        }
    }

    fn members_object(
        &mut self,
        members: Vec<(SmolStr, Value)>,
        parent_path: Option<&str>,
        depth: usize,
    ) -> serde_json::Value {
        let mut object = serde_json::Map::new();
        for (key, raw) in members {
            let path = match parent_path {
                Some(parent) => format!("{parent}.{key}"),
                None => key.to_string(),
            };
            let value = self.serialize_member(&path, &key, raw, depth);
            object.insert(key.to_string(), value);
        }
        serde_json::Value::Object(object)
    }

    fn serialize_member(
        &mut self,
        path: &str,
        key: &str,
        raw: Value,
        depth: usize,
    ) -> serde_json::Value {
        // lazily-computed members can fail on read; one failing property
        // must never abort the rest of the snapshot
        let value = match self.resolve(raw) {
            Ok(value) => value,
            Err(cause) => {
                self.read_error(path, key, &cause);
                return serde_json::Value::Null;
            }
        };
        if let Some(name) = name_of(self.page, &value) {
            self.type_names.insert(path.to_string(), name);
        }
        match classify(self.page, &value) {
            Shape::Missing => {
                self.undefineds.push(path.to_string());
                serde_json::Value::Null
            }
            Shape::Primitive => value.to_json().unwrap_or(serde_json::Value::Null),
            Shape::ElementNode(kind) => {
                self.messages.insert(
                    path.to_string(),
                    DiagnosticMessage::info(format!("Loupe does not expand {kind}s")),
                );
                empty_placeholder()
            }
            Shape::Function(source) => {
                self.messages
                    .insert(path.to_string(), DiagnosticMessage::info(source.to_string()));
                empty_placeholder()
            }
            Shape::Keyed(id) => self.serialize_container(
                path,
                key,
                ContainerId::Record(id),
                members_of_record(&self.store, id),
                &value,
                depth,
            ),
            Shape::Ordered(id) => self.serialize_container(
                path,
                key,
                ContainerId::Seq(id),
                members_of_seq(&self.store, id),
                &value,
                depth,
            ),
        }
    }

    fn serialize_container(
        &mut self,
        path: &str,
        key: &str,
        identity: ContainerId,
        members: Vec<(SmolStr, Value)>,
        value: &Value,
        depth: usize,
    ) -> serde_json::Value {
        if !self.expanded.contains(path) {
            return empty_placeholder();
        }
        if self.visited.contains(&identity) {
            self.read_error(path, key, "cyclic reference");
            return empty_placeholder();
        }
        if depth >= MAX_DEPTH {
            self.read_error(path, key, "maximum serialization depth exceeded");
            return empty_placeholder();
        }
        if members.is_empty() {
            let name = constructor_name(self.page, value).unwrap_or_else(|| "Object".to_string());
            self.messages.insert(
                path.to_string(),
                DiagnosticMessage::info(format!("{name} is empty")),
            );
            return empty_placeholder();
        }
        // siblings sharing one object are each evaluated independently;
        // only an ancestor-to-descendant cycle is an error
        self.visited.insert(identity);
        let object = self.members_object(members, Some(path), depth + 1);
        self.visited.remove(&identity);
        object
    }

    fn resolve(&self, raw: Value) -> Result<Value, String> {
        let mut value = raw;
        loop {
            match value {
                Value::Computed(id) => {
                    value = self
                        .store
                        .resolve_computed(id, &mut Vec::new())
                        .map_err(|err| err.to_string())?;
                }
                other => return Ok(other),
            }
        }
    }

    fn read_error(&mut self, path: &str, key: &str, cause: &str) {
        self.messages.insert(
            path.to_string(),
            DiagnosticMessage::error(format!("Error getting value of \"{key}\": {cause}")),
        );
    }
}

fn empty_placeholder() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

fn members_of_record(store: &ModelStore, id: RecordId) -> Vec<(SmolStr, Value)> {
    store
        .record_fields(id)
        .into_iter()
        .filter(|(key, _)| !key.starts_with('_'))
        .collect()
}

fn members_of_seq(store: &ModelStore, id: SeqId) -> Vec<(SmolStr, Value)> {
    store
        .seq_elements(id)
        .into_iter()
        .enumerate()
        .map(|(index, value)| (SmolStr::new(index.to_string()), value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::MessageKind;
    use expect_test::expect;
    use loupe_model::harness::sample_page;
    use serde_json::json;

    fn expand(keys: &[&str]) -> FxHashSet<String> {
        keys.iter().map(|key| (*key).to_string()).collect()
    }

    #[test]
    fn unexpanded_containers_are_empty_placeholders() {
        let fixture = sample_page();
        let result = serialize(&fixture.page, &fixture.person, &expand(&[]));
        assert_eq!(result.view_model_data["hobbies"], json!({}));
        assert_eq!(result.type_names["hobbies"], "Array[]");
        assert_eq!(result.view_model_data["name"], json!("Astrid"));
        assert_eq!(result.view_model_data["age"], json!(34));
        // implementation-prefixed keys are filtered out entirely
        assert!(result.view_model_data.get("_cid").is_none());
    }

    #[test]
    fn expanded_sequence_serializes_with_decimal_keys() {
        let fixture = sample_page();
        let result = serialize(&fixture.page, &fixture.person, &expand(&["hobbies"]));
        assert_eq!(
            result.view_model_data["hobbies"],
            json!({"0": "reading", "1": "sailing"})
        );
        assert_eq!(result.type_names["hobbies.0"], "string");
    }

    #[test]
    fn repeated_serialization_is_idempotent() {
        let fixture = sample_page();
        let expanded = expand(&["hobbies"]);
        let first = serialize(&fixture.page, &fixture.person, &expanded);
        let second = serialize(&fixture.page, &fixture.person, &expanded);
        assert_eq!(first, second);
    }

    #[test]
    fn self_reference_is_a_per_path_error() {
        let fixture = sample_page();
        let store = fixture.page.store();
        if let Value::Record(id) = fixture.person {
            store.init_field(id, "self", fixture.person.clone());
        }
        let result = serialize(&fixture.page, &fixture.person, &expand(&["self"]));
        assert_eq!(result.view_model_data["self"], json!({}));
        let message = &result.messages["self"];
        assert_eq!(message.kind, MessageKind::Error);
        assert!(
            message.text.starts_with("Error getting value of \"self\":"),
            "unexpected message: {}",
            message.text
        );
        // siblings are unaffected
        assert_eq!(result.view_model_data["name"], json!("Astrid"));
    }

    #[test]
    fn shared_siblings_are_not_cycles() {
        let fixture = sample_page();
        let store = fixture.page.store();
        if let Value::Record(id) = fixture.person {
            store.init_field(id, "also", fixture.hobbies.clone());
        }
        let result = serialize(
            &fixture.page,
            &fixture.person,
            &expand(&["hobbies", "also"]),
        );
        assert_eq!(result.view_model_data["hobbies"], result.view_model_data["also"]);
        assert!(result.messages.get("also").is_none());
    }

    #[test]
    fn missing_values_are_tracked_in_undefineds() {
        let fixture = sample_page();
        let store = fixture.page.store();
        if let Value::Record(id) = fixture.person {
            store.init_field(id, "nickname", Value::Undefined);
        }
        let result = serialize(&fixture.page, &fixture.person, &expand(&[]));
        assert_eq!(result.undefineds, vec!["nickname".to_string()]);
        assert_eq!(result.view_model_data["nickname"], json!(null));
        assert!(result.type_names.get("nickname").is_none());
    }

    #[test]
    fn elements_and_functions_are_summarized_not_expanded() {
        let fixture = sample_page();
        let store = fixture.page.store();
        let paragraph = fixture.page.children_of(fixture.profile)[0];
        if let Value::Record(id) = fixture.person {
            store.init_field(id, "node", Value::Element(paragraph));
        }
        let result = serialize(&fixture.page, &fixture.person, &expand(&["node", "greet"]));
        assert_eq!(result.view_model_data["node"], json!({}));
        assert_eq!(
            result.messages["node"].text,
            "Loupe does not expand HTMLParagraphElements"
        );
        assert_eq!(result.view_model_data["greet"], json!({}));
        assert_eq!(
            result.messages["greet"].text,
            "function greet() { return \"hi \" + this.name; }"
        );
        assert_eq!(result.type_names["node"], "HTMLParagraphElement{}");
    }

    #[test]
    fn empty_expanded_container_gets_an_info_message() {
        let fixture = sample_page();
        let store = fixture.page.store();
        let todos = store.new_seq("TodoList");
        if let Value::Record(id) = fixture.person {
            store.init_field(id, "todos", Value::Seq(todos));
        }
        let result = serialize(&fixture.page, &fixture.person, &expand(&["todos"]));
        assert_eq!(result.view_model_data["todos"], json!({}));
        assert_eq!(result.messages["todos"].kind, MessageKind::Info);
        assert_eq!(result.messages["todos"].text, "TodoList is empty");
    }

    #[test]
    fn throwing_computed_member_is_recovered_per_path() {
        let fixture = sample_page();
        let store = fixture.page.store();
        let broken = store
            .new_computed(fixture.person.clone(), "vm.age / 0")
            .unwrap();
        if let Value::Record(id) = fixture.person {
            store.init_field(id, "ratio", Value::Computed(broken));
        }
        let result = serialize(&fixture.page, &fixture.person, &expand(&[]));
        assert_eq!(result.view_model_data["ratio"], json!(null));
        assert_eq!(
            result.messages["ratio"].text,
            "Error getting value of \"ratio\": division by zero"
        );
        // siblings still serialized
        assert_eq!(result.view_model_data["name"], json!("Astrid"));
    }

    #[test]
    fn healthy_computed_members_resolve_transparently() {
        let fixture = sample_page();
        let store = fixture.page.store();
        let shout = store
            .new_computed(fixture.person.clone(), "vm.name + '!'")
            .unwrap();
        if let Value::Record(id) = fixture.person {
            store.init_field(id, "shout", Value::Computed(shout));
        }
        let result = serialize(&fixture.page, &fixture.person, &expand(&[]));
        assert_eq!(result.view_model_data["shout"], json!("Astrid!"));
        assert_eq!(result.type_names["shout"], "string");
    }

    #[test]
    fn snapshot_of_a_simple_record() {
        let page = Page::new();
        let store = page.store();
        let record = store.new_record("Person");
        store.init_field(record, "name", Value::from("Astrid"));
        store.init_field(record, "age", Value::from(34));
        let root = Value::Record(record);

        let result = serialize(&page, &root, &FxHashSet::default());
        let text = serde_json::to_string(&result).unwrap();
        expect![[r#"{"viewModelData":{"age":34,"name":"Astrid"},"typeNames":{"age":"number","name":"string"},"messages":{},"undefineds":[]}"#]]
            .assert_eq(&text);
    }

    #[test]
    fn view_model_keys_follow_container_order() {
        let fixture = sample_page();
        assert_eq!(
            view_model_keys(&fixture.page, &fixture.person),
            vec!["name", "age", "hobbies", "greet"]
        );
        assert_eq!(
            view_model_keys(&fixture.page, &fixture.hobbies),
            vec!["0", "1"]
        );
        assert!(view_model_keys(&fixture.page, &Value::from(1)).is_empty());
    }
}
