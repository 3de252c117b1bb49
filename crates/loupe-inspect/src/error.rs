//! Inspector errors surfaced at the call boundary.
//!
//! Per-path read and recursion failures never appear here: the serializer
//! downgrades them into `messages` entries and keeps going.

use smol_str::SmolStr;
use thiserror::Error;

use loupe_model::ModelError;

/// Errors reported through the `error` status tag.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InspectError {
    /// No component/model is currently selected.
    #[error("no component is currently selected")]
    NoSelection,

    /// Caller-supplied breakpoint spec carried an explicit error.
    #[error("{0}")]
    Input(SmolStr),

    /// Component id not present in the most recent tree walk.
    #[error("unknown component id {0}")]
    UnknownComponent(u32),

    /// Breakpoint id not present in the registry.
    #[error("unknown breakpoint id {0}")]
    UnknownBreakpoint(u32),

    /// Malformed arguments for a named entry point.
    #[error("invalid {0} arguments")]
    InvalidArguments(SmolStr),

    /// Model-layer failure while applying a request.
    #[error(transparent)]
    Model(#[from] ModelError),
}
