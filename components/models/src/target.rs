//! Target store.
//!
//! Every instance owns a [`Target`]: the out-of-band record of its stored
//! fields, its lifecycle flags and its identity. Public fields live in the
//! normal table; `_`/`$` names and symbols live in the special table so
//! they never show up in enumeration.

use crate::access;
use crate::class::ClassRef;
use crate::instance::Instance;
use crate::observers;
use crate::proxy::PropertyDescriptor;
use crate::value::Value;
use core_types::{generate_key, PropertyKey, Result};
use indexmap::IndexMap;
use regex::Regex;
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::rc::Weak;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::LazyLock;
use tracing::trace;

static TARGET_COUNTER: AtomicU64 = AtomicU64::new(1);

/// All-caps names are constants: readonly and locked on first write.
static CONSTANT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9_$]+$").expect("valid regex"));

/// The identity field.
pub(crate) const ID: &str = "$id";

#[derive(Default)]
struct TargetState {
    constructed: bool,
    disposed: bool,
    identity: String,
    normal: IndexMap<String, Value>,
    special: HashMap<PropertyKey, Value>,
    readonly: HashSet<PropertyKey>,
    locked: HashSet<PropertyKey>,
    elements: Vec<Value>,
}

/// Stored state of one instance.
pub(crate) struct Target {
    key: u64,
    class: ClassRef,
    wrapper: Weak<Target>,
    state: RefCell<TargetState>,
    universal: Cell<bool>,
}

impl Target {
    /// Create the state for a fresh instance and assign its identity.
    pub(crate) fn new(class: ClassRef, wrapper: Weak<Target>) -> Target {
        let identity = generate_key(&class.display_name());
        let id_key = PropertyKey::from(ID);
        let mut state = TargetState {
            identity: identity.clone(),
            ..TargetState::default()
        };
        state.special.insert(id_key.clone(), Value::String(identity));
        state.readonly.insert(id_key.clone());
        state.locked.insert(id_key);
        Target {
            key: TARGET_COUNTER.fetch_add(1, Ordering::Relaxed),
            class,
            wrapper,
            state: RefCell::new(state),
            universal: Cell::new(false),
        }
    }

    /// Process-unique numeric key, used by the observer ledgers.
    pub(crate) fn key(&self) -> u64 {
        self.key
    }

    pub(crate) fn class(&self) -> &ClassRef {
        &self.class
    }

    /// The instance wrapping this target, while it is alive.
    pub(crate) fn wrapper(&self) -> Option<Instance> {
        self.wrapper.upgrade().map(Instance::from_target)
    }

    pub(crate) fn identity(&self) -> String {
        self.state.borrow().identity.clone()
    }

    /// Mark construction finished. Observation starts here.
    pub(crate) fn done(&self) {
        self.state.borrow_mut().constructed = true;
    }

    pub(crate) fn is_constructed(&self) -> bool {
        self.state.borrow().constructed
    }

    pub(crate) fn is_disposed(&self) -> bool {
        self.state.borrow().disposed
    }

    /// Stored value, `Undefined` when absent.
    pub(crate) fn get(&self, key: &PropertyKey) -> Value {
        let state = self.state.borrow();
        let found = match key {
            PropertyKey::Name(name) if access::is_public_name(name) => state.normal.get(name),
            _ => state.special.get(key),
        };
        found.cloned().unwrap_or_default()
    }

    pub(crate) fn has(&self, key: &PropertyKey) -> bool {
        let state = self.state.borrow();
        match key {
            PropertyKey::Name(name) if access::is_public_name(name) => {
                state.normal.contains_key(name)
            }
            _ => state.special.contains_key(key),
        }
    }

    /// Store a value, applying the preservation rules of `desc` or of
    /// constant names.
    pub(crate) fn set(&self, key: &PropertyKey, value: Value, desc: Option<&PropertyDescriptor>) {
        let mut state = self.state.borrow_mut();
        match key {
            PropertyKey::Name(name) if access::is_public_name(name) => {
                state.normal.insert(name.clone(), value);
            }
            _ => {
                state.special.insert(key.clone(), value);
            }
        }
        let constant = key.as_name().is_some_and(|name| CONSTANT.is_match(name));
        if constant {
            state.readonly.insert(key.clone());
            state.locked.insert(key.clone());
        }
        if let Some(desc) = desc {
            if desc.configurable != Some(true) {
                state.locked.insert(key.clone());
            }
            if desc.writable != Some(true) {
                state.readonly.insert(key.clone());
            }
        }
    }

    /// Remove a stored value, returning it.
    pub(crate) fn remove(&self, key: &PropertyKey) -> Option<Value> {
        let mut state = self.state.borrow_mut();
        match key {
            PropertyKey::Name(name) if access::is_public_name(name) => {
                state.normal.shift_remove(name)
            }
            _ => state.special.remove(key),
        }
    }

    /// Locked keys reject redefinition.
    pub(crate) fn is_preserved(&self, key: &PropertyKey) -> bool {
        self.state.borrow().locked.contains(key)
    }

    /// Readonly keys reject assignment.
    pub(crate) fn is_readonly(&self, key: &PropertyKey) -> bool {
        self.state.borrow().readonly.contains(key)
    }

    /// Public stored field names in enumeration order.
    pub(crate) fn public_keys(&self) -> Vec<String> {
        self.state.borrow().normal.keys().cloned().collect()
    }

    /// Snapshot of the public fields.
    pub(crate) fn public_entries(&self) -> IndexMap<String, Value> {
        self.state.borrow().normal.clone()
    }

    /// Snapshot of the elements.
    pub(crate) fn elements(&self) -> Vec<Value> {
        self.state.borrow().elements.clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.state.borrow().elements.len()
    }

    pub(crate) fn element(&self, index: usize) -> Value {
        self.state
            .borrow()
            .elements
            .get(index)
            .cloned()
            .unwrap_or_default()
    }

    /// Mutate the elements. `f` must not call back into the instance.
    pub(crate) fn with_elements<R>(&self, f: impl FnOnce(&mut Vec<Value>) -> R) -> R {
        f(&mut self.state.borrow_mut().elements)
    }

    /// Run `f` with the universal escape hatch suspended. Returns `None`
    /// when already suspended.
    pub(crate) fn universally<R>(&self, f: impl FnOnce() -> R) -> Option<R> {
        if self.universal.get() {
            return None;
        }
        self.universal.set(true);
        let _reset = Reset(&self.universal);
        Some(f())
    }

    /// Flip the disposed flag and run the destruct hook once. Later calls
    /// are no-ops.
    pub(crate) fn dispose(&self) -> Result<()> {
        {
            let mut state = self.state.borrow_mut();
            if state.disposed {
                return Ok(());
            }
            state.disposed = true;
        }
        trace!(identity = %self.identity(), "disposed");
        match (self.class.destruct_hook(), self.wrapper()) {
            (Some(hook), Some(instance)) => hook(&instance),
            _ => Ok(()),
        }
    }
}

impl Drop for Target {
    fn drop(&mut self) {
        observers::forget(self.key);
    }
}

struct Reset<'a>(&'a Cell<bool>);

impl Drop for Reset<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}
