//! `loupe-model` - observable model primitives for the loupe inspector.
//!
//! The live value graph, the element tree, the host binding-expression
//! language, and the push-based observation machinery the inspector core
//! consumes through [`observe::Observation`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

/// Page elements and DOM kind mapping.
pub mod element;
/// Model and expression errors.
pub mod error;
/// Binding-language expressions.
pub mod expr;
/// Test fixtures.
pub mod harness;
/// Dependency-tracked observations.
pub mod observe;
/// The inspected page aggregate.
pub mod page;
/// The observable model store.
pub mod store;
/// Dynamic model values.
pub mod value;

pub use element::dom_kind;
pub use error::ModelError;
pub use expr::{eval, eval_tracked, parse, Expr, ROOT_TOKEN};
pub use observe::{DepKey, InvalidationEvent, InvalidationHandler, Observation};
pub use page::Page;
pub use store::ModelStore;
pub use value::{
    loose_eq, value_from_json, ComputedId, ElementId, FunctionValue, RecordId, SeqId, Value,
};
