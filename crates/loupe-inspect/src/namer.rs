//! Type naming.
//! - name_of: short human-readable type label for any value
//! - constructor_name: the bare label without the `[]`/`{}` suffix

use loupe_model::{Page, Value};

/// Label a value: `"Person{}"` for a keyed model, `"Array[]"` for an
/// ordered collection, primitive type words otherwise. The missing sentinel
/// has no label; it is tracked in `undefineds` instead. Never panics,
/// including on dangling handles.
#[must_use]
pub fn name_of(page: &Page, value: &Value) -> Option<String> {
    match value {
        Value::Undefined => None,
        Value::Null => Some("null".to_string()),
        Value::Bool(_) => Some("boolean".to_string()),
        Value::Number(_) => Some("number".to_string()),
        Value::Str(_) => Some("string".to_string()),
        Value::Function(_) => Some("function".to_string()),
        Value::Seq(_) | Value::Record(_) | Value::Element(_) => {
            constructor_name(page, value).map(|name| match value {
                Value::Seq(_) => format!("{name}[]"),
                _ => format!("{name}{{}}"),
            })
        }
        Value::Computed(id) => {
            let store = page.store();
            match store.resolve_computed(*id, &mut Vec::new()) {
                Ok(resolved) => name_of(page, &resolved),
                Err(_) => None,
            }
        }
    }
}

/// Constructor name without collection markers: `"Person"`, `"Array"`,
/// `"Object"`, or the element's DOM interface name. Dangling handles fall
/// back to the default constructor.
#[must_use]
pub fn constructor_name(page: &Page, value: &Value) -> Option<String> {
    match value {
        Value::Seq(id) => Some(
            page.store()
                .seq_type_name(*id)
                .map_or_else(|| "Array".to_string(), |name| name.to_string()),
        ),
        Value::Record(id) => Some(
            page.store()
                .record_type_name(*id)
                .map_or_else(|| "Object".to_string(), |name| name.to_string()),
        ),
        Value::Element(id) => Some(
            page.kind_of(*id)
                .map_or_else(|| "HTMLElement".to_string(), |kind| kind.to_string()),
        ),
        _ => None,
    }
}
