//! Observable model store.
//! - ModelStore: clonable handle over records, seqs, computed members
//! - tracked reads feeding observation dependency capture
//! - mutations that schedule observation recomputations
//! - drain_invalidations: FIFO recomputation queue

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;

use crate::error::ModelError;
use crate::expr::{eval_tracked, parse, Expr};
use crate::observe::{ContainerId, DepKey, InvalidationEvent, InvalidationHandler};
use crate::value::{ComputedId, RecordId, SeqId, Value};

struct RecordData {
    type_name: SmolStr,
    fields: IndexMap<SmolStr, Value>,
}

struct SeqData {
    type_name: SmolStr,
    elements: Vec<Value>,
}

struct ComputedData {
    expr: Expr,
    root: Value,
}

struct ObservationEntry {
    expr: Expr,
    root: Value,
    bound: bool,
    last: Value,
    deps: Vec<DepKey>,
    handlers: Arc<Mutex<Vec<InvalidationHandler>>>,
}

struct Scheduled {
    observation: u32,
    reason: SmolStr,
}

#[derive(Default)]
struct StoreState {
    records: Vec<RecordData>,
    seqs: Vec<SeqData>,
    computeds: Vec<ComputedData>,
    resolving: FxHashSet<ComputedId>,
    subscriptions: FxHashMap<DepKey, FxHashSet<u32>>,
    observations: FxHashMap<u32, ObservationEntry>,
    next_observation: u32,
    queue: VecDeque<Scheduled>,
}

/// Clonable handle to the live observable-model state of a page.
///
/// All reads and mutations go through this handle. Mutations schedule
/// recomputations for subscribed observations; [`ModelStore::drain_invalidations`]
/// is the host task-queue tick that runs them.
#[derive(Clone, Default)]
pub struct ModelStore {
    state: Arc<Mutex<StoreState>>,
}

impl fmt::Debug for ModelStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ModelStore { .. }")
    }
}

impl ModelStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().expect("model store lock poisoned")
    }

    /// Allocate a keyed model instance.
    pub fn new_record(&self, type_name: &str) -> RecordId {
        let mut state = self.state();
        let id = RecordId(u32::try_from(state.records.len()).unwrap_or(u32::MAX));
        state.records.push(RecordData {
            type_name: SmolStr::new(type_name),
            fields: IndexMap::new(),
        });
        id
    }

    /// Allocate an ordered observable collection.
    pub fn new_seq(&self, type_name: &str) -> SeqId {
        let mut state = self.state();
        let id = SeqId(u32::try_from(state.seqs.len()).unwrap_or(u32::MAX));
        state.seqs.push(SeqData {
            type_name: SmolStr::new(type_name),
            elements: Vec::new(),
        });
        id
    }

    /// Register a computed member: `source` is parsed now and evaluated
    /// against `root` on every read.
    pub fn new_computed(&self, root: Value, source: &str) -> Result<ComputedId, ModelError> {
        let expr = parse(source)?;
        let mut state = self.state();
        let id = ComputedId(u32::try_from(state.computeds.len()).unwrap_or(u32::MAX));
        state.computeds.push(ComputedData { expr, root });
        Ok(id)
    }

    /// Construction-time field initialization; does not notify observers.
    pub fn init_field(&self, record: RecordId, key: &str, value: Value) {
        let mut state = self.state();
        if let Some(data) = state.records.get_mut(record.0 as usize) {
            data.fields.insert(SmolStr::new(key), value);
        }
    }

    /// Construction-time element initialization; does not notify observers.
    pub fn fill_seq(&self, seq: SeqId, elements: Vec<Value>) {
        let mut state = self.state();
        if let Some(data) = state.seqs.get_mut(seq.0 as usize) {
            data.elements = elements;
        }
    }

    /// Declared type name of a record, if the id is live.
    #[must_use]
    pub fn record_type_name(&self, record: RecordId) -> Option<SmolStr> {
        self.state()
            .records
            .get(record.0 as usize)
            .map(|data| data.type_name.clone())
    }

    /// Declared type name of a seq, if the id is live.
    #[must_use]
    pub fn seq_type_name(&self, seq: SeqId) -> Option<SmolStr> {
        self.state()
            .seqs
            .get(seq.0 as usize)
            .map(|data| data.type_name.clone())
    }

    /// Snapshot of a record's fields in insertion order.
    #[must_use]
    pub fn record_fields(&self, record: RecordId) -> Vec<(SmolStr, Value)> {
        self.state()
            .records
            .get(record.0 as usize)
            .map(|data| {
                data.fields
                    .iter()
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Snapshot of a seq's elements in index order.
    #[must_use]
    pub fn seq_elements(&self, seq: SeqId) -> Vec<Value> {
        self.state()
            .seqs
            .get(seq.0 as usize)
            .map(|data| data.elements.clone())
            .unwrap_or_default()
    }

    /// Element count of a seq.
    #[must_use]
    pub fn seq_len(&self, seq: SeqId) -> usize {
        self.state()
            .seqs
            .get(seq.0 as usize)
            .map_or(0, |data| data.elements.len())
    }

    /// Member read without dependency capture.
    pub fn read_member(&self, container: &Value, key: &str) -> Result<Value, ModelError> {
        self.read_member_tracked(container, key, &mut Vec::new())
    }

    /// Member read with transparent computed resolution. Missing keys yield
    /// `Undefined`; reading a member of `Undefined`/`Null` is an error.
    /// Every container read appends its subscription key to `deps`.
    pub fn read_member_tracked(
        &self,
        container: &Value,
        key: &str,
        deps: &mut Vec<DepKey>,
    ) -> Result<Value, ModelError> {
        let raw = match container {
            Value::Undefined => return Err(ModelError::MemberOfUndefined(SmolStr::new(key))),
            Value::Null => return Err(ModelError::MemberOfNull(SmolStr::new(key))),
            Value::Record(id) => {
                deps.push(DepKey::Member(ContainerId::Record(*id), SmolStr::new(key)));
                self.state()
                    .records
                    .get(id.0 as usize)
                    .and_then(|data| data.fields.get(key).cloned())
                    .unwrap_or(Value::Undefined)
            }
            Value::Seq(id) => {
                if key == "length" {
                    deps.push(DepKey::Shape(ContainerId::Seq(*id)));
                    #[allow(clippy::cast_precision_loss)]
                    return Ok(Value::Number(self.seq_len(*id) as f64));
                }
                deps.push(DepKey::Member(ContainerId::Seq(*id), SmolStr::new(key)));
                match key.parse::<usize>() {
                    Ok(index) => self
                        .state()
                        .seqs
                        .get(id.0 as usize)
                        .and_then(|data| data.elements.get(index).cloned())
                        .unwrap_or(Value::Undefined),
                    Err(_) => Value::Undefined,
                }
            }
            Value::Str(text) if key == "length" => {
                #[allow(clippy::cast_precision_loss)]
                return Ok(Value::Number(text.chars().count() as f64));
            }
            Value::Computed(id) => {
                let resolved = self.resolve_computed(*id, deps)?;
                return self.read_member_tracked(&resolved, key, deps);
            }
            _ => Value::Undefined,
        };
        if let Value::Computed(id) = raw {
            return self.resolve_computed(id, deps);
        }
        Ok(raw)
    }

    /// Evaluate a computed member. Fails when the member's expression fails
    /// or when resolution reaches itself.
    pub fn resolve_computed(
        &self,
        id: ComputedId,
        deps: &mut Vec<DepKey>,
    ) -> Result<Value, ModelError> {
        let data = {
            let mut state = self.state();
            if !state.resolving.insert(id) {
                return Err(ModelError::CircularComputed);
            }
            state
                .computeds
                .get(id.0 as usize)
                .map(|computed| (computed.expr.clone(), computed.root.clone()))
        };
        let result = match data {
            Some((expr, root)) => eval_tracked(self, &root, &expr, deps),
            None => Ok(Value::Undefined),
        };
        self.state().resolving.remove(&id);
        result
    }

    /// Set a member on a keyed or ordered container. Ordered containers
    /// accept decimal index keys and grow with `Undefined` padding.
    pub fn set_member(&self, container: &Value, key: &str, value: Value) -> Result<(), ModelError> {
        match container {
            Value::Record(id) => {
                let mut state = self.state();
                let Some(data) = state.records.get_mut(id.0 as usize) else {
                    return Ok(());
                };
                let fresh = !data.fields.contains_key(key);
                data.fields.insert(SmolStr::new(key), value);
                let reason = format!("set {}.{key}", data.type_name);
                let mut invalidated =
                    vec![DepKey::Member(ContainerId::Record(*id), SmolStr::new(key))];
                if fresh {
                    invalidated.push(DepKey::Shape(ContainerId::Record(*id)));
                }
                schedule(&mut state, &invalidated, &reason);
                Ok(())
            }
            Value::Seq(id) => {
                let index: usize = key
                    .parse()
                    .map_err(|_| ModelError::InvalidIndex(SmolStr::new(key)))?;
                let mut state = self.state();
                let Some(data) = state.seqs.get_mut(id.0 as usize) else {
                    return Ok(());
                };
                let grew = index >= data.elements.len();
                if grew {
                    data.elements.resize(index + 1, Value::Undefined);
                }
                data.elements[index] = value;
                let reason = format!("set {}[{index}]", data.type_name);
                let mut invalidated =
                    vec![DepKey::Member(ContainerId::Seq(*id), SmolStr::new(key))];
                if grew {
                    invalidated.push(DepKey::Shape(ContainerId::Seq(*id)));
                }
                schedule(&mut state, &invalidated, &reason);
                Ok(())
            }
            other => Err(ModelError::NotAContainer(SmolStr::new(other.kind_word()))),
        }
    }

    /// Remove a member from a keyed or ordered container. Removing an
    /// ordered element shifts its successors.
    pub fn remove_member(&self, container: &Value, key: &str) -> Result<(), ModelError> {
        match container {
            Value::Record(id) => {
                let mut state = self.state();
                let Some(data) = state.records.get_mut(id.0 as usize) else {
                    return Ok(());
                };
                if data.fields.shift_remove(key).is_none() {
                    return Ok(());
                }
                let reason = format!("delete {}.{key}", data.type_name);
                let invalidated = vec![
                    DepKey::Member(ContainerId::Record(*id), SmolStr::new(key)),
                    DepKey::Shape(ContainerId::Record(*id)),
                ];
                schedule(&mut state, &invalidated, &reason);
                Ok(())
            }
            Value::Seq(id) => {
                let index: usize = key
                    .parse()
                    .map_err(|_| ModelError::InvalidIndex(SmolStr::new(key)))?;
                let mut state = self.state();
                let Some(data) = state.seqs.get_mut(id.0 as usize) else {
                    return Ok(());
                };
                if index >= data.elements.len() {
                    return Ok(());
                }
                let old_len = data.elements.len();
                data.elements.remove(index);
                let reason = format!("delete {}[{index}]", data.type_name);
                let invalidated = shifted_keys(*id, index, old_len);
                schedule(&mut state, &invalidated, &reason);
                Ok(())
            }
            other => Err(ModelError::NotAContainer(SmolStr::new(other.kind_word()))),
        }
    }

    /// Splice an ordered collection: delete `delete_count` elements at
    /// `index`, then insert `insert` there. Out-of-range values clamp.
    pub fn splice(
        &self,
        container: &Value,
        index: usize,
        delete_count: usize,
        insert: Vec<Value>,
    ) -> Result<(), ModelError> {
        let Value::Seq(id) = container else {
            return Err(ModelError::NotOrdered(SmolStr::new(container.kind_word())));
        };
        let mut state = self.state();
        let Some(data) = state.seqs.get_mut(id.0 as usize) else {
            return Ok(());
        };
        let old_len = data.elements.len();
        let start = index.min(old_len);
        let end = (start + delete_count).min(old_len);
        data.elements.splice(start..end, insert);
        let new_len = data.elements.len();
        let reason = format!("splice {}[{start}]", data.type_name);
        let invalidated = shifted_keys(*id, start, old_len.max(new_len));
        schedule(&mut state, &invalidated, &reason);
        Ok(())
    }

    /// Process the scheduled recomputation queue strictly FIFO, invoking
    /// each affected observation's handlers once per scheduled entry.
    /// Handlers run outside the store lock and may mutate the store; new
    /// invalidations produced that way are processed in the same drain.
    pub fn drain_invalidations(&self) {
        let mut trail: Vec<SmolStr> = Vec::new();
        loop {
            let Some(job) = self.state().queue.pop_front() else {
                break;
            };
            trail.push(job.reason.clone());
            let snapshot = {
                let state = self.state();
                state
                    .observations
                    .get(&job.observation)
                    .filter(|entry| entry.bound)
                    .map(|entry| {
                        (
                            entry.expr.clone(),
                            entry.root.clone(),
                            entry.last.clone(),
                            Arc::clone(&entry.handlers),
                        )
                    })
            };
            let Some((expr, root, old, handlers)) = snapshot else {
                continue;
            };
            let mut deps = Vec::new();
            let new = match eval_tracked(self, &root, &expr, &mut deps) {
                Ok(value) => value,
                Err(err) => {
                    tracing::warn!(
                        observation = job.observation,
                        error = %err,
                        "watch recomputation failed"
                    );
                    Value::Undefined
                }
            };
            {
                let mut state = self.state();
                let Some(entry) = state.observations.get_mut(&job.observation) else {
                    continue;
                };
                if !entry.bound {
                    continue;
                }
                entry.last = new.clone();
                let old_deps = std::mem::replace(&mut entry.deps, deps.clone());
                resubscribe(&mut state, job.observation, &old_deps, &deps);
            }
            let event = InvalidationEvent {
                old,
                new,
                trail: trail.clone(),
            };
            let mut handlers = handlers.lock().expect("observation handlers poisoned");
            for handler in handlers.iter_mut() {
                handler(&event);
            }
        }
    }

    /// Number of scheduled recomputations not yet drained.
    #[must_use]
    pub fn pending_invalidations(&self) -> usize {
        self.state().queue.len()
    }

    pub(crate) fn create_observation(&self, root: Value, expr: Expr) -> u32 {
        let mut state = self.state();
        let id = state.next_observation;
        state.next_observation += 1;
        state.observations.insert(
            id,
            ObservationEntry {
                expr,
                root,
                bound: false,
                last: Value::Undefined,
                deps: Vec::new(),
                handlers: Arc::new(Mutex::new(Vec::new())),
            },
        );
        id
    }

    pub(crate) fn bind_observation(&self, id: u32) {
        let data = {
            let state = self.state();
            let Some(entry) = state.observations.get(&id) else {
                return;
            };
            if entry.bound {
                return;
            }
            (entry.expr.clone(), entry.root.clone())
        };
        let mut deps = Vec::new();
        let value = match eval_tracked(self, &data.1, &data.0, &mut deps) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(observation = id, error = %err, "watch bind evaluation failed");
                Value::Undefined
            }
        };
        let mut state = self.state();
        let Some(entry) = state.observations.get_mut(&id) else {
            return;
        };
        if entry.bound {
            return;
        }
        entry.bound = true;
        entry.last = value;
        entry.deps = deps.clone();
        for key in deps {
            state.subscriptions.entry(key).or_default().insert(id);
        }
    }

    pub(crate) fn unbind_observation(&self, id: u32) {
        let mut state = self.state();
        let Some(entry) = state.observations.get_mut(&id) else {
            return;
        };
        if !entry.bound {
            return;
        }
        entry.bound = false;
        let deps = std::mem::take(&mut entry.deps);
        for key in &deps {
            let emptied = state
                .subscriptions
                .get_mut(key)
                .is_some_and(|subscribers| {
                    subscribers.remove(&id);
                    subscribers.is_empty()
                });
            if emptied {
                state.subscriptions.remove(key);
            }
        }
        state.queue.retain(|job| job.observation != id);
    }

    pub(crate) fn observation_bound(&self, id: u32) -> bool {
        self.state()
            .observations
            .get(&id)
            .is_some_and(|entry| entry.bound)
    }

    pub(crate) fn observation_value(&self, id: u32) -> Value {
        self.state()
            .observations
            .get(&id)
            .map_or(Value::Undefined, |entry| entry.last.clone())
    }

    pub(crate) fn push_observation_handler(&self, id: u32, handler: InvalidationHandler) {
        let handlers = {
            let state = self.state();
            let Some(entry) = state.observations.get(&id) else {
                return;
            };
            Arc::clone(&entry.handlers)
        };
        handlers
            .lock()
            .expect("observation handlers poisoned")
            .push(handler);
    }

    pub(crate) fn release_observation(&self, id: u32) {
        self.unbind_observation(id);
        self.state().observations.remove(&id);
    }
}

fn shifted_keys(id: SeqId, start: usize, upper: usize) -> Vec<DepKey> {
    let mut keys = vec![DepKey::Shape(ContainerId::Seq(id))];
    for index in start..upper {
        keys.push(DepKey::Member(
            ContainerId::Seq(id),
            SmolStr::new(index.to_string()),
        ));
    }
    keys
}

fn resubscribe(state: &mut StoreState, id: u32, old: &[DepKey], new: &[DepKey]) {
    for key in old {
        let emptied = state.subscriptions.get_mut(key).is_some_and(|subscribers| {
            subscribers.remove(&id);
            subscribers.is_empty()
        });
        if emptied {
            state.subscriptions.remove(key);
        }
    }
    for key in new {
        state
            .subscriptions
            .entry(key.clone())
            .or_default()
            .insert(id);
    }
}

fn schedule(state: &mut StoreState, keys: &[DepKey], reason: &str) {
    let mut affected: Vec<u32> = Vec::new();
    for key in keys {
        if let Some(subscribers) = state.subscriptions.get(key) {
            affected.extend(subscribers.iter().copied());
        }
    }
    affected.sort_unstable();
    affected.dedup();
    for observation in affected {
        tracing::trace!(observation, reason, "scheduling recomputation");
        state.queue.push_back(Scheduled {
            observation,
            reason: SmolStr::new(reason),
        });
    }
}
