//! Page elements.

use smol_str::SmolStr;

use crate::value::{ElementId, Value};

/// One element in the inspected page's tree.
#[derive(Debug, Clone)]
pub struct ElementData {
    pub(crate) tag: SmolStr,
    pub(crate) kind: SmolStr,
    pub(crate) model: Option<Value>,
    pub(crate) children: Vec<ElementId>,
}

impl ElementData {
    pub(crate) fn new(tag: &str, model: Option<Value>) -> Self {
        Self {
            tag: SmolStr::new(tag),
            kind: SmolStr::new(dom_kind(tag)),
            model,
            children: Vec::new(),
        }
    }
}

/// Concrete DOM interface name for a tag, used when naming element values.
#[must_use]
pub fn dom_kind(tag: &str) -> &'static str {
    match tag {
        "a" => "HTMLAnchorElement",
        "body" => "HTMLBodyElement",
        "button" => "HTMLButtonElement",
        "div" => "HTMLDivElement",
        "footer" | "header" | "main" | "nav" | "section" | "article" => "HTMLElement",
        "form" => "HTMLFormElement",
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => "HTMLHeadingElement",
        "img" => "HTMLImageElement",
        "input" => "HTMLInputElement",
        "label" => "HTMLLabelElement",
        "li" => "HTMLLIElement",
        "ol" => "HTMLOListElement",
        "p" => "HTMLParagraphElement",
        "span" => "HTMLSpanElement",
        "table" => "HTMLTableElement",
        "textarea" => "HTMLTextAreaElement",
        "ul" => "HTMLUListElement",
        _ => "HTMLElement",
    }
}
