//! The inspected page: model store, element tree, selection.

use smol_str::SmolStr;

use crate::element::ElementData;
use crate::store::ModelStore;
use crate::value::{ElementId, Value};

/// Aggregate the inspector holds a handle to: the observable-model store,
/// the element arena with its root list, and the externally-selected
/// element.
#[derive(Debug, Default)]
pub struct Page {
    store: ModelStore,
    elements: Vec<ElementData>,
    roots: Vec<ElementId>,
    selected: Option<ElementId>,
}

impl Page {
    /// Create an empty page.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the page's model store.
    #[must_use]
    pub fn store(&self) -> ModelStore {
        self.store.clone()
    }

    /// Create a plain element that owns no model.
    pub fn create_element(&mut self, tag: &str) -> ElementId {
        self.push_element(ElementData::new(tag, None))
    }

    /// Create a component element owning `model`.
    pub fn create_component(&mut self, tag: &str, model: Value) -> ElementId {
        self.push_element(ElementData::new(tag, Some(model)))
    }

    fn push_element(&mut self, data: ElementData) -> ElementId {
        let id = ElementId(u32::try_from(self.elements.len()).unwrap_or(u32::MAX));
        self.elements.push(data);
        id
    }

    /// Append `child` to `parent`'s child list. Dangling ids are ignored.
    pub fn append_child(&mut self, parent: ElementId, child: ElementId) {
        if (child.0 as usize) < self.elements.len() {
            if let Some(data) = self.elements.get_mut(parent.0 as usize) {
                data.children.push(child);
            }
        }
    }

    /// Register a top-level root element.
    pub fn add_root(&mut self, element: ElementId) {
        self.roots.push(element);
    }

    /// Top-level root elements in registration order.
    #[must_use]
    pub fn roots(&self) -> &[ElementId] {
        &self.roots
    }

    /// Update the externally-selected element.
    pub fn set_selected(&mut self, element: Option<ElementId>) {
        self.selected = element;
    }

    /// Currently selected element, if any.
    #[must_use]
    pub fn selected(&self) -> Option<ElementId> {
        self.selected
    }

    /// Model owned by the currently selected element, if any.
    #[must_use]
    pub fn selected_model(&self) -> Option<Value> {
        self.selected
            .and_then(|element| self.model_of(element))
    }

    /// Tag name of an element.
    #[must_use]
    pub fn tag_of(&self, element: ElementId) -> Option<SmolStr> {
        self.elements
            .get(element.0 as usize)
            .map(|data| data.tag.clone())
    }

    /// DOM interface name of an element.
    #[must_use]
    pub fn kind_of(&self, element: ElementId) -> Option<SmolStr> {
        self.elements
            .get(element.0 as usize)
            .map(|data| data.kind.clone())
    }

    /// Model owned by an element, if it is a component.
    #[must_use]
    pub fn model_of(&self, element: ElementId) -> Option<Value> {
        self.elements
            .get(element.0 as usize)
            .and_then(|data| data.model.clone())
    }

    /// Child elements in document order.
    #[must_use]
    pub fn children_of(&self, element: ElementId) -> Vec<ElementId> {
        self.elements
            .get(element.0 as usize)
            .map(|data| data.children.clone())
            .unwrap_or_default()
    }
}
