//! Breakpoint registry.
//! - BreakpointRegistry: owns compiled watches and their observations
//! - BreakHook: pluggable debugger action invoked when a watch fires

use std::sync::{Arc, Mutex};

use smol_str::SmolStr;

use loupe_model::{loose_eq, parse, InvalidationEvent, Observation, Page, Value};

use crate::compile::{compile, DISPLAY_PLACEHOLDER};
use crate::error::InspectError;
use crate::namer::constructor_name;
use crate::protocol::{BreakpointSpec, BreakpointView};

/// Debugger action invoked when a watch's trigger policy fires. Pluggable
/// so tests can observe firings without pausing anything.
pub trait BreakHook: Send {
    /// Called once per firing with the watch's id, display expression, and
    /// freshly computed value.
    fn on_breakpoint(&mut self, id: u32, expression: &str, value: &Value);
}

/// No-op debugger action.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopBreakHook;

impl BreakHook for NoopBreakHook {
    fn on_breakpoint(&mut self, _id: u32, _expression: &str, _value: &Value) {}
}

/// Shared handle to the configured debugger action.
pub type SharedBreakHook = Arc<Mutex<dyn BreakHook>>;

/// One registered watch. The registry exclusively owns the observation.
pub struct ExpressionBreakpoint {
    id: u32,
    expression: String,
    display_expression: String,
    enabled: bool,
    observation: Observation,
}

impl ExpressionBreakpoint {
    fn view(&self) -> BreakpointView {
        BreakpointView {
            id: self.id,
            expression: self.expression.clone(),
            display_expression: self.display_expression.clone(),
            enabled: self.enabled,
        }
    }

    /// The owned observation, exposed for tests.
    #[must_use]
    pub fn observation(&self) -> &Observation {
        &self.observation
    }
}

/// Owns the set of compiled watches for the lifetime of the inspected page.
/// Ids are monotonic and never reused; insertion order is preserved.
pub struct BreakpointRegistry {
    breakpoints: Vec<ExpressionBreakpoint>,
    next_id: u32,
    hook: SharedBreakHook,
}

impl Default for BreakpointRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BreakpointRegistry {
    /// Registry with the no-op debugger action.
    #[must_use]
    pub fn new() -> Self {
        Self::with_hook(Arc::new(Mutex::new(NoopBreakHook)))
    }

    /// Registry firing into `hook`.
    #[must_use]
    pub fn with_hook(hook: SharedBreakHook) -> Self {
        Self {
            breakpoints: Vec::new(),
            next_id: 1,
            hook,
        }
    }

    /// Compile `spec.expression`, wire the trigger policy to a fresh
    /// observation over the currently selected model, and bind it when
    /// enabled. Fails when the spec carries a propagated error or when no
    /// model is selected.
    pub fn add(&mut self, page: &Page, spec: BreakpointSpec) -> Result<BreakpointView, InspectError> {
        if let Some(error) = spec.error {
            return Err(InspectError::Input(SmolStr::new(error)));
        }
        let Some(model) = page.selected_model() else {
            return Err(InspectError::NoSelection);
        };
        let compiled = compile(&spec.expression);
        let expr = parse(&compiled.guarded)?;
        let model_name =
            constructor_name(page, &model).unwrap_or_else(|| "Object".to_string());
        let display_expression = compiled.display.replace(DISPLAY_PLACEHOLDER, &model_name);

        let id = self.next_id;
        self.next_id += 1;

        let observation = Observation::new(&page.store(), model, expr);
        let boolean_test = compiled.boolean_test;
        let hook = Arc::clone(&self.hook);
        // named `display_expr` rather than `display` to avoid colliding with
        // `tracing::field::display` inside the tracing macro expansion
        let display_expr = display_expression.clone();
        observation.on_invalidate(Box::new(move |event: &InvalidationEvent| {
            // boolean tests fire on the loose rising edge: the comparison
            // becoming `== true` for the first time, with the host's loose
            // equality rule preserved deliberately
            let fired = if boolean_test {
                loose_eq(&event.new, &Value::Bool(true))
                    && !loose_eq(&event.old, &Value::Bool(true))
            } else {
                true
            };
            if !fired {
                return;
            }
            tracing::info!(
                breakpoint = id,
                expression = %display_expr,
                trail = ?event.trail,
                "breakpoint hit"
            );
            hook.lock()
                .expect("break hook poisoned")
                .on_breakpoint(id, &display_expr, &event.new);
        }));
        if spec.enabled {
            observation.bind();
        }

        let breakpoint = ExpressionBreakpoint {
            id,
            expression: spec.expression,
            display_expression,
            enabled: spec.enabled,
            observation,
        };
        let view = breakpoint.view();
        self.breakpoints.push(breakpoint);
        Ok(view)
    }

    /// Flip `enabled`, binding or unbinding the observation accordingly.
    pub fn toggle(&mut self, id: u32) -> Result<BreakpointView, InspectError> {
        let breakpoint = self
            .breakpoints
            .iter_mut()
            .find(|breakpoint| breakpoint.id == id)
            .ok_or(InspectError::UnknownBreakpoint(id))?;
        breakpoint.enabled = !breakpoint.enabled;
        if breakpoint.enabled {
            breakpoint.observation.bind();
        } else {
            breakpoint.observation.unbind();
        }
        Ok(breakpoint.view())
    }

    /// Unbind and remove.
    pub fn delete(&mut self, id: u32) -> Result<(), InspectError> {
        let index = self
            .breakpoints
            .iter()
            .position(|breakpoint| breakpoint.id == id)
            .ok_or(InspectError::UnknownBreakpoint(id))?;
        let breakpoint = self.breakpoints.remove(index);
        breakpoint.observation.unbind();
        Ok(())
    }

    /// Current watches in insertion order.
    #[must_use]
    pub fn views(&self) -> Vec<BreakpointView> {
        self.breakpoints
            .iter()
            .map(ExpressionBreakpoint::view)
            .collect()
    }

    /// Registered watch by id, exposed for tests.
    #[must_use]
    pub fn get(&self, id: u32) -> Option<&ExpressionBreakpoint> {
        self.breakpoints
            .iter()
            .find(|breakpoint| breakpoint.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loupe_model::harness::sample_page;

    #[derive(Default)]
    struct CollectingHook {
        hits: Vec<(u32, Value)>,
    }

    impl BreakHook for CollectingHook {
        fn on_breakpoint(&mut self, id: u32, _expression: &str, value: &Value) {
            self.hits.push((id, value.clone()));
        }
    }

    fn registry_with_hook() -> (BreakpointRegistry, Arc<Mutex<CollectingHook>>) {
        let hook = Arc::new(Mutex::new(CollectingHook::default()));
        let shared: SharedBreakHook = hook.clone();
        (BreakpointRegistry::with_hook(shared), hook)
    }

    fn spec(expression: &str) -> BreakpointSpec {
        BreakpointSpec {
            expression: expression.to_string(),
            enabled: true,
            error: None,
        }
    }

    #[test]
    fn boolean_test_fires_only_on_the_rising_edge() {
        let fixture = sample_page();
        let store = fixture.page.store();
        let (mut registry, hook) = registry_with_hook();
        let view = registry.add(&fixture.page, spec("hobbies.length > 1")).unwrap();
        assert_eq!(view.display_expression, "Person.hobbies.length > 1");

        // already 2 hobbies: comparison is true at bind time, so growing
        // further is not a rising edge
        store
            .splice(&fixture.hobbies, 2, 0, vec![Value::from("chess")])
            .unwrap();
        store.drain_invalidations();
        assert!(hook.lock().unwrap().hits.is_empty());

        // drop to one, then grow back: exactly one rising edge
        store.splice(&fixture.hobbies, 0, 2, Vec::new()).unwrap();
        store.drain_invalidations();
        store
            .splice(&fixture.hobbies, 1, 0, vec![Value::from("sailing")])
            .unwrap();
        store.drain_invalidations();
        store
            .splice(&fixture.hobbies, 2, 0, vec![Value::from("running")])
            .unwrap();
        store.drain_invalidations();

        let hits = hook.lock().unwrap().hits.clone();
        assert_eq!(hits, vec![(view.id, Value::Bool(true))]);
    }

    #[test]
    fn plain_watch_fires_on_every_change() {
        let fixture = sample_page();
        let store = fixture.page.store();
        let (mut registry, hook) = registry_with_hook();
        let view = registry.add(&fixture.page, spec("name")).unwrap();

        store
            .set_member(&fixture.person, "name", Value::from("Beata"))
            .unwrap();
        store.drain_invalidations();
        store
            .set_member(&fixture.person, "name", Value::from("Cleo"))
            .unwrap();
        store.drain_invalidations();

        let hits = hook.lock().unwrap().hits.clone();
        assert_eq!(
            hits,
            vec![
                (view.id, Value::from("Beata")),
                (view.id, Value::from("Cleo"))
            ]
        );
    }

    #[test]
    fn toggle_twice_restores_the_original_state() {
        let fixture = sample_page();
        let mut registry = BreakpointRegistry::new();
        let view = registry.add(&fixture.page, spec("age")).unwrap();
        assert!(registry.get(view.id).unwrap().observation().is_bound());

        let toggled = registry.toggle(view.id).unwrap();
        assert!(!toggled.enabled);
        assert!(!registry.get(view.id).unwrap().observation().is_bound());

        let toggled = registry.toggle(view.id).unwrap();
        assert!(toggled.enabled);
        assert!(registry.get(view.id).unwrap().observation().is_bound());
    }

    #[test]
    fn disabled_spec_starts_unbound() {
        let fixture = sample_page();
        let mut registry = BreakpointRegistry::new();
        let view = registry
            .add(
                &fixture.page,
                BreakpointSpec {
                    expression: "age".to_string(),
                    enabled: false,
                    error: None,
                },
            )
            .unwrap();
        assert!(!view.enabled);
        assert!(!registry.get(view.id).unwrap().observation().is_bound());
    }

    #[test]
    fn delete_unbinds_and_removes() {
        let fixture = sample_page();
        let store = fixture.page.store();
        let (mut registry, hook) = registry_with_hook();
        let view = registry.add(&fixture.page, spec("name")).unwrap();
        registry.delete(view.id).unwrap();
        assert!(registry.views().is_empty());

        store
            .set_member(&fixture.person, "name", Value::from("Beata"))
            .unwrap();
        store.drain_invalidations();
        assert!(hook.lock().unwrap().hits.is_empty());
        assert_eq!(
            registry.delete(view.id),
            Err(InspectError::UnknownBreakpoint(view.id))
        );
    }

    #[test]
    fn ids_are_monotonic_and_never_reused() {
        let fixture = sample_page();
        let mut registry = BreakpointRegistry::new();
        let first = registry.add(&fixture.page, spec("age")).unwrap();
        registry.delete(first.id).unwrap();
        let second = registry.add(&fixture.page, spec("name")).unwrap();
        assert!(second.id > first.id);
    }

    #[test]
    fn propagated_errors_and_missing_selection_fail() {
        let fixture = sample_page();
        let mut registry = BreakpointRegistry::new();
        let failed = registry.add(
            &fixture.page,
            BreakpointSpec {
                expression: "age".to_string(),
                enabled: true,
                error: Some("no component selected in panel".to_string()),
            },
        );
        assert_eq!(
            failed,
            Err(InspectError::Input("no component selected in panel".into()))
        );

        let mut unselected = sample_page();
        unselected.page.set_selected(None);
        assert_eq!(
            registry.add(&unselected.page, spec("age")),
            Err(InspectError::NoSelection)
        );
    }
}
