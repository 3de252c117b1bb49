//! Component tree and selection handlers.

use smol_str::SmolStr;

use crate::error::InspectError;
use crate::protocol::{FunctionCall, TaggedResult};
use crate::tree::TreeWalk;

use super::{first_arg, InspectorAgent};

impl InspectorAgent {
    pub(super) fn handle_component_tree_data(&mut self) -> TaggedResult {
        let walk = TreeWalk::capture(&self.page);
        let result = TaggedResult::success(walk.nodes());
        self.last_walk = Some(walk);
        result
    }

    pub(super) fn handle_select_component_by_id(&mut self, call: &FunctionCall) -> TaggedResult {
        let Some(id) = first_arg::<u32>(call) else {
            return TaggedResult::error(
                InspectError::InvalidArguments(SmolStr::new("selectComponentById")).to_string(),
            );
        };
        // ids are call-local to the most recent walk; a miss means the tree
        // changed under the caller
        let Some(walk) = self.last_walk.as_ref() else {
            return TaggedResult::error("no component tree has been captured");
        };
        match walk.element_for_id(id) {
            Some(element) => {
                self.page.set_selected(Some(element));
                TaggedResult::success(serde_json::Value::Null)
            }
            None => TaggedResult::error(InspectError::UnknownComponent(id).to_string()),
        }
    }
}
