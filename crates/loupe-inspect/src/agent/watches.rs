//! Breakpoint registry handlers.

use smol_str::SmolStr;

use crate::error::InspectError;
use crate::protocol::{BreakpointSpec, FunctionCall, TaggedResult};

use super::{first_arg, InspectorAgent};

impl InspectorAgent {
    pub(super) fn handle_add_breakpoint(&mut self, call: &FunctionCall) -> TaggedResult {
        let Some(spec) = first_arg::<BreakpointSpec>(call) else {
            return TaggedResult::error(
                InspectError::InvalidArguments(SmolStr::new("addBreakpoint")).to_string(),
            );
        };
        self.add_one(spec)
    }

    pub(super) fn handle_add_breakpoints(&mut self, call: &FunctionCall) -> TaggedResult {
        let Some(specs) = first_arg::<Vec<BreakpointSpec>>(call) else {
            return TaggedResult::error(
                InspectError::InvalidArguments(SmolStr::new("addBreakpoints")).to_string(),
            );
        };
        // equivalent to sequential addBreakpoint calls: one tagged result
        // per entry, in order
        let results: Vec<TaggedResult> = specs
            .into_iter()
            .map(|spec| self.add_one(spec))
            .collect();
        TaggedResult::success(results)
    }

    fn add_one(&mut self, spec: BreakpointSpec) -> TaggedResult {
        match self.registry.add(&self.page, spec) {
            Ok(view) => TaggedResult::success(view),
            Err(err) => TaggedResult::error(err.to_string()),
        }
    }

    pub(super) fn handle_get_breakpoints(&mut self) -> TaggedResult {
        TaggedResult::success(self.registry.views())
    }

    pub(super) fn handle_toggle_breakpoint(&mut self, call: &FunctionCall) -> TaggedResult {
        let Some(id) = first_arg::<u32>(call) else {
            return TaggedResult::error(
                InspectError::InvalidArguments(SmolStr::new("toggleBreakpoint")).to_string(),
            );
        };
        match self.registry.toggle(id) {
            Ok(view) => TaggedResult::success(view),
            Err(err) => TaggedResult::error(err.to_string()),
        }
    }

    pub(super) fn handle_delete_breakpoint(&mut self, call: &FunctionCall) -> TaggedResult {
        let Some(id) = first_arg::<u32>(call) else {
            return TaggedResult::error(
                InspectError::InvalidArguments(SmolStr::new("deleteBreakpoint")).to_string(),
            );
        };
        match self.registry.delete(id) {
            Ok(()) => TaggedResult::success(serde_json::Value::Null),
            Err(err) => TaggedResult::error(err.to_string()),
        }
    }
}
