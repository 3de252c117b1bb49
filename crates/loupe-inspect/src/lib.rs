//! Inspector backend for loupe observable-model pages.
//!
//! Turns a live, possibly cyclic model graph into bounded, lazily-expandable
//! snapshots, walks the component tree, and compiles user property-path
//! expressions into dependency-tracked watches with a pluggable breakpoint
//! action.

mod agent;
pub mod bridge;
pub mod compile;
mod error;
pub mod namer;
mod protocol;
pub mod registry;
pub mod serializer;
pub mod tree;

pub use agent::InspectorAgent;
pub use compile::{compile, CompiledExpression, DISPLAY_PLACEHOLDER};
pub use error::InspectError;
pub use protocol::{
    BreakpointSpec, BreakpointView, ComponentTreeNode, DiagnosticMessage, FunctionCall,
    MessageKind, SerializationResult, SerializeOptions, Status, TaggedResult, UpdateOp,
};
pub use registry::{BreakHook, BreakpointRegistry, NoopBreakHook, SharedBreakHook};
pub use serializer::{serialize, view_model_keys};
pub use tree::TreeWalk;
