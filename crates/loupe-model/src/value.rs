//! Dynamic model values.
//! - Value: the value space of observable models
//! - loose_eq: host-language equality used by watch triggers
//! - to_json/value_from_json: JSON bridging for the wire boundary

#![allow(missing_docs)]

use smol_str::SmolStr;

use crate::store::ModelStore;

/// Handle to a keyed model instance in a [`ModelStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordId(pub u32);

/// Handle to an ordered observable collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SeqId(pub u32);

/// Handle to a derived member backed by a host expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComputedId(pub u32);

/// Handle to a page element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementId(pub u32);

/// A callback registered on a model, with the source text captured at
/// registration time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionValue {
    /// Function name as registered.
    pub name: SmolStr,
    /// Captured source text.
    pub source: SmolStr,
}

/// Dynamic value of the host's observable models.
///
/// `Undefined` is the missing sentinel and is distinct from `Null`: a record
/// can store either, and reads of absent keys yield `Undefined`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(SmolStr),
    Function(FunctionValue),
    Element(ElementId),
    Seq(SeqId),
    Record(RecordId),
    Computed(ComputedId),
}

impl Value {
    /// Host-language truthiness.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(value) => *value,
            Value::Number(value) => *value != 0.0 && !value.is_nan(),
            Value::Str(value) => !value.is_empty(),
            Value::Function(_)
            | Value::Element(_)
            | Value::Seq(_)
            | Value::Record(_)
            | Value::Computed(_) => true,
        }
    }

    /// Lowercase word describing the value's shape, for diagnostics.
    #[must_use]
    pub fn kind_word(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Function(_) => "function",
            Value::Element(_) => "element",
            Value::Seq(_) => "sequence",
            Value::Record(_) => "record",
            Value::Computed(_) => "computed",
        }
    }

    /// Numeric coercion used by arithmetic and relational operators.
    #[must_use]
    pub fn to_number(&self) -> f64 {
        match self {
            Value::Null => 0.0,
            Value::Bool(value) => {
                if *value {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Number(value) => *value,
            Value::Str(value) => str_to_number(value),
            Value::Undefined
            | Value::Function(_)
            | Value::Element(_)
            | Value::Seq(_)
            | Value::Record(_)
            | Value::Computed(_) => f64::NAN,
        }
    }

    /// JSON form for primitives; `None` for the missing sentinel and for
    /// values that have no JSON equivalent (functions, elements, handles).
    #[must_use]
    pub fn to_json(&self) -> Option<serde_json::Value> {
        match self {
            Value::Null => Some(serde_json::Value::Null),
            Value::Bool(value) => Some(serde_json::Value::Bool(*value)),
            Value::Number(value) => Some(number_to_json(*value)),
            Value::Str(value) => Some(serde_json::Value::String(value.to_string())),
            _ => None,
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(f64::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(SmolStr::new(value))
    }
}

impl From<SmolStr> for Value {
    fn from(value: SmolStr) -> Self {
        Value::Str(value)
    }
}

fn str_to_number(value: &str) -> f64 {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

fn number_to_json(value: f64) -> serde_json::Value {
    if value.fract() == 0.0 && value.is_finite() && value.abs() < 9_007_199_254_740_992.0 {
        #[allow(clippy::cast_possible_truncation)]
        return serde_json::Value::from(value as i64);
    }
    serde_json::Number::from_f64(value).map_or(serde_json::Value::Null, serde_json::Value::Number)
}

/// Loose equality in the host binding language.
///
/// `Null` and `Undefined` are mutually equal, booleans coerce to 0/1 against
/// numbers, numeric strings coerce against numbers, and container handles
/// compare by identity. Watch triggers compare against `true` with this rule
/// deliberately, so `1 == true` holds and `2 == true` does not.
#[must_use]
pub fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::Number(a), Value::Str(b)) | (Value::Str(b), Value::Number(a)) => {
            *a == str_to_number(b)
        }
        (Value::Bool(a), Value::Number(b)) | (Value::Number(b), Value::Bool(a)) => {
            f64::from(*a) == *b
        }
        (Value::Bool(a), Value::Str(b)) | (Value::Str(b), Value::Bool(a)) => {
            f64::from(*a) == str_to_number(b)
        }
        (Value::Record(a), Value::Record(b)) => a == b,
        (Value::Seq(a), Value::Seq(b)) => a == b,
        (Value::Element(a), Value::Element(b)) => a == b,
        (Value::Computed(a), Value::Computed(b)) => a == b,
        _ => false,
    }
}

/// Build a model value from JSON, allocating containers in `store` for
/// objects and arrays.
#[must_use]
pub fn value_from_json(store: &ModelStore, json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(value) => Value::Bool(*value),
        serde_json::Value::Number(value) => Value::Number(value.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(value) => Value::Str(SmolStr::new(value)),
        serde_json::Value::Array(items) => {
            let seq = store.new_seq("Array");
            let values = items.iter().map(|item| value_from_json(store, item)).collect();
            store.fill_seq(seq, values);
            Value::Seq(seq)
        }
        serde_json::Value::Object(fields) => {
            let record = store.new_record("Object");
            for (key, value) in fields {
                let value = value_from_json(store, value);
                store.init_field(record, key, value);
            }
            Value::Record(record)
        }
    }
}
