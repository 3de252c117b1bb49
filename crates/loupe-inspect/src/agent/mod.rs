//! Inspector agent.
//! - mod.rs: agent struct + dispatch by function name
//! - model: snapshot/keys/update handlers
//! - components: tree walk + selection handlers
//! - watches: breakpoint registry handlers
//! - tests: dispatch integration tests

mod components;
mod model;
mod watches;

#[cfg(test)]
mod tests;

use loupe_model::Page;

use crate::protocol::{FunctionCall, TaggedResult};
use crate::registry::{BreakpointRegistry, SharedBreakHook};
use crate::tree::TreeWalk;

/// Serves the inspector entry points against one page. Persists across
/// requests for the lifetime of the inspected page; nothing survives a
/// page reload.
pub struct InspectorAgent {
    page: Page,
    registry: BreakpointRegistry,
    last_walk: Option<TreeWalk>,
}

impl InspectorAgent {
    /// Agent with the no-op debugger action.
    #[must_use]
    pub fn new(page: Page) -> Self {
        Self {
            page,
            registry: BreakpointRegistry::new(),
            last_walk: None,
        }
    }

    /// Agent firing breakpoints into `hook`.
    #[must_use]
    pub fn with_hook(page: Page, hook: SharedBreakHook) -> Self {
        Self {
            page,
            registry: BreakpointRegistry::with_hook(hook),
            last_walk: None,
        }
    }

    /// The inspected page.
    #[must_use]
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Route a function call to its handler. Never panics and never lets an
    /// error escape: every outcome is a tagged result.
    pub fn dispatch(&mut self, call: &FunctionCall) -> TaggedResult {
        tracing::debug!(function = %call.function, "dispatching inspector call");
        match call.function.as_str() {
            "getSerializedViewModelData" => self.handle_serialized_view_model_data(call),
            "getViewModelKeys" => self.handle_view_model_keys(),
            "updateViewModel" => self.handle_update_view_model(call),
            "getComponentTreeData" => self.handle_component_tree_data(),
            "selectComponentById" => self.handle_select_component_by_id(call),
            "addBreakpoint" => self.handle_add_breakpoint(call),
            "addBreakpoints" => self.handle_add_breakpoints(call),
            "getBreakpoints" => self.handle_get_breakpoints(),
            "toggleBreakpoint" => self.handle_toggle_breakpoint(call),
            "deleteBreakpoint" => self.handle_delete_breakpoint(call),
            other => TaggedResult::error(format!("unknown function '{other}'")),
        }
    }
}

/// First argument of a call deserialized as `T`, or `None` when absent or
/// malformed.
fn first_arg<T: serde::de::DeserializeOwned>(call: &FunctionCall) -> Option<T> {
    call.arguments
        .first()
        .cloned()
        .and_then(|value| serde_json::from_value(value).ok())
}
