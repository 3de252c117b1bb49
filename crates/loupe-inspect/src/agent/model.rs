//! Snapshot, key-listing, and mutation handlers.

use rustc_hash::FxHashSet;
use smol_str::SmolStr;

use loupe_model::{value_from_json, Value};

use crate::error::InspectError;
use crate::protocol::{FunctionCall, SerializeOptions, TaggedResult, UpdateOp};
use crate::serializer::{serialize, view_model_keys};

use super::{first_arg, InspectorAgent};

impl InspectorAgent {
    pub(super) fn handle_serialized_view_model_data(&mut self, call: &FunctionCall) -> TaggedResult {
        let Some(root) = self.page.selected_model() else {
            return TaggedResult::ignore();
        };
        let options: SerializeOptions = match call.arguments.first() {
            Some(value) => match serde_json::from_value(value.clone()) {
                Ok(options) => options,
                Err(_) => {
                    return TaggedResult::error(
                        InspectError::InvalidArguments(SmolStr::new("getSerializedViewModelData"))
                            .to_string(),
                    );
                }
            },
            None => SerializeOptions::default(),
        };
        let expanded: FxHashSet<String> = options.expanded_keys.into_iter().collect();
        TaggedResult::success(serialize(&self.page, &root, &expanded))
    }

    pub(super) fn handle_view_model_keys(&mut self) -> TaggedResult {
        let Some(root) = self.page.selected_model() else {
            return TaggedResult::ignore();
        };
        TaggedResult::success(view_model_keys(&self.page, &root))
    }

    pub(super) fn handle_update_view_model(&mut self, call: &FunctionCall) -> TaggedResult {
        let Some(root) = self.page.selected_model() else {
            return TaggedResult::ignore();
        };
        let Some(ops) = first_arg::<Vec<UpdateOp>>(call) else {
            return TaggedResult::error(
                InspectError::InvalidArguments(SmolStr::new("updateViewModel")).to_string(),
            );
        };
        for op in &ops {
            if let Err(err) = self.apply_update_op(&root, op) {
                return TaggedResult::error(err.to_string());
            }
        }
        // run scheduled recomputations now so watches observe the
        // mutations within the same request
        self.page.store().drain_invalidations();
        TaggedResult::success(serde_json::Value::Null)
    }

    fn apply_update_op(&self, root: &Value, op: &UpdateOp) -> Result<(), InspectError> {
        let store = self.page.store();
        match op {
            UpdateOp::Set { key, value } => {
                let value = value_from_json(&store, value);
                store.set_member(root, key, value)?;
            }
            UpdateOp::Delete { key } => {
                store.remove_member(root, key)?;
            }
            UpdateOp::Splice {
                key,
                index,
                delete_count,
                insert,
            } => {
                let target = match key {
                    Some(key) => store.read_member(root, key)?,
                    None => root.clone(),
                };
                let insert = insert
                    .iter()
                    .map(|value| value_from_json(&store, value))
                    .collect();
                store.splice(&target, *index, *delete_count, insert)?;
            }
        }
        Ok(())
    }
}
