//! Component tree walking.
//! - TreeWalk::capture: pre-order walk emitting component nodes
//! - element_for_id: resolve a call-local id back to its element

use rustc_hash::FxHashMap;

use loupe_model::{ElementId, Page};

use crate::protocol::ComponentTreeNode;

/// One walk generation: the emitted tree plus the id table consumed by
/// `selectComponentById` within the same call/response pair.
#[derive(Debug, Default)]
pub struct TreeWalk {
    nodes: Vec<ComponentTreeNode>,
    ids: FxHashMap<u32, ElementId>,
}

impl TreeWalk {
    /// Walk the page's root elements depth-first in document order. A node
    /// is emitted per element owning a model; plain elements are traversed
    /// through. Ids are sequential from zero in traversal order.
    #[must_use]
    pub fn capture(page: &Page) -> Self {
        let mut walk = TreeWalk::default();
        let mut next_id = 0;
        let mut nodes = Vec::new();
        for root in page.roots() {
            visit(page, *root, &mut nodes, None, &mut next_id, &mut walk.ids);
        }
        walk.nodes = nodes;
        walk
    }

    /// The emitted component nodes.
    #[must_use]
    pub fn nodes(&self) -> &[ComponentTreeNode] {
        &self.nodes
    }

    /// Element that produced `id` in this walk generation.
    #[must_use]
    pub fn element_for_id(&self, id: u32) -> Option<ElementId> {
        self.ids.get(&id).copied()
    }
}

fn visit(
    page: &Page,
    element: ElementId,
    out: &mut Vec<ComponentTreeNode>,
    parent_path: Option<&str>,
    next_id: &mut u32,
    ids: &mut FxHashMap<u32, ElementId>,
) {
    if page.model_of(element).is_some() {
        let id = *next_id;
        *next_id += 1;
        ids.insert(id, element);
        let index = out.len();
        let path = match parent_path {
            Some(parent) => format!("{parent}.children.{index}"),
            None => index.to_string(),
        };
        let mut children = Vec::new();
        for child in page.children_of(element) {
            visit(page, child, &mut children, Some(&path), next_id, ids);
        }
        out.push(ComponentTreeNode {
            id,
            path,
            tag_name: page.tag_of(element).map(Into::into).unwrap_or_default(),
            selected: page.selected() == Some(element),
            children,
        });
    } else {
        for child in page.children_of(element) {
            visit(page, child, out, parent_path, next_id, ids);
        }
    }
}
