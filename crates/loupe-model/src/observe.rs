//! Dependency-tracked observations.
//! - DepKey: what an observation subscribes to
//! - Observation: bind/unbind/on_invalidate/current_value handle
//! - InvalidationEvent: what change handlers receive

#![allow(missing_docs)]

use smol_str::SmolStr;

use crate::expr::Expr;
use crate::store::ModelStore;
use crate::value::{RecordId, SeqId, Value};

/// Identity of a container for subscriptions and cycle detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerId {
    Record(RecordId),
    Seq(SeqId),
}

/// Subscription key produced by tracked reads.
///
/// Member reads subscribe at `(container, key)` granularity; `length` reads
/// and key enumeration subscribe to the container's shape. A splice
/// invalidates the shape plus every shifted index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DepKey {
    Member(ContainerId, SmolStr),
    Shape(ContainerId),
}

/// Delivered to change handlers once per scheduled recomputation.
#[derive(Debug, Clone)]
pub struct InvalidationEvent {
    /// Value recorded before this recomputation.
    pub old: Value,
    /// Freshly recomputed value.
    pub new: Value,
    /// Reason trail of the scheduler: the mutation reasons processed so far
    /// in the current drain, most recent last.
    pub trail: Vec<SmolStr>,
}

/// Change handler attached to an observation. Handlers compose: attaching a
/// second handler never replaces the first.
pub type InvalidationHandler = Box<dyn FnMut(&InvalidationEvent) + Send>;

/// A reactive handle that re-evaluates an expression against a root value
/// and notifies handlers when any read value changes.
///
/// Bind and unbind are idempotent; after `unbind` returns, no handler runs
/// again until the observation is rebound. Dropping the handle releases the
/// observation entirely.
#[derive(Debug)]
pub struct Observation {
    store: ModelStore,
    id: u32,
}

impl Observation {
    /// Register a new, unbound observation for `expr` evaluated against
    /// `root`.
    #[must_use]
    pub fn new(store: &ModelStore, root: Value, expr: Expr) -> Self {
        let id = store.create_observation(root, expr);
        Self { store: store.clone(), id }
    }

    /// Evaluate under dependency capture and subscribe. No-op when already
    /// bound.
    pub fn bind(&self) {
        self.store.bind_observation(self.id);
    }

    /// Drop every subscription. No-op when already unbound; guarantees no
    /// handler invocation after this returns.
    pub fn unbind(&self) {
        self.store.unbind_observation(self.id);
    }

    /// Whether the observation currently holds subscriptions.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.store.observation_bound(self.id)
    }

    /// Append a change handler.
    pub fn on_invalidate(&self, handler: InvalidationHandler) {
        self.store.push_observation_handler(self.id, handler);
    }

    /// Last recorded value.
    #[must_use]
    pub fn current_value(&self) -> Value {
        self.store.observation_value(self.id)
    }
}

impl Drop for Observation {
    fn drop(&mut self) {
        self.store.release_observation(self.id);
    }
}
