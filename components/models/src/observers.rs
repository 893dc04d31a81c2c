//! Observer dispatcher.
//!
//! Reads (peeks), writes (pokes) and element changes (splices) are recorded
//! in a per-thread ledger while application code runs. The first event of
//! an epoch requests a tick from the scheduler; every later event cancels
//! and re-requests it, so exactly one flush is pending at a time. The flush
//! drains the ledger before delivering anything, so events raised by
//! observers start the next epoch.
//!
//! Global observers see every observable instance. Their peeks are
//! delivered on the spot; everything else waits for the flush.
//!
//! # Examples
//!
//! ```
//! use models::{Class, Model, Observer, TypeRef, Value};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let person = Class::model("Person")
//!     .shape(|s| Some(s.field("age", TypeRef::Number)))
//!     .build();
//! let jim = Model::new(&person, [("age", 23)]).unwrap();
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let log = seen.clone();
//! jim.add_observer(Observer::callback(move |name, new, old, _| {
//!     log.borrow_mut().push((name.to_string(), new.clone(), old.clone()));
//!     Ok(())
//! }))
//! .unwrap();
//!
//! jim.set("age", 24).unwrap();
//! jim.set("age", 25).unwrap();
//! assert!(seen.borrow().is_empty());
//!
//! models::tick().unwrap();
//! assert_eq!(
//!     *seen.borrow(),
//!     vec![("age".to_string(), Value::from(25), Value::from(23))]
//! );
//! ```

use crate::access;
use crate::instance::{Instance, WeakInstance};
use crate::value::{same_value, Function, Record, Value};
use async_runtime::{EventLoop, Scheduler, Task, TickId};
use core_types::{PropertyKey, Result, TypeError};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, trace, warn};

/// Capability object notified of reads, writes and element changes.
///
/// Every method defaults to doing nothing.
pub trait ObserverHandler {
    /// A public field of `instance` was read.
    fn on_peek(&self, _instance: &Instance, _name: &str) -> Result<()> {
        Ok(())
    }

    /// A field of `instance` changed from `old` to `new`.
    fn on_poke(&self, _instance: &Instance, _name: &str, _new: &Value, _old: &Value) -> Result<()> {
        Ok(())
    }

    /// Elements of `collection` changed since the start of the epoch.
    fn on_splice(&self, _collection: &Instance, _added: &[Value], _removed: &[Value]) -> Result<()> {
        Ok(())
    }
}

/// Something that can be registered to receive notifications.
#[derive(Clone)]
pub enum Observer {
    /// A capability object
    Handler(Rc<dyn ObserverHandler>),
    /// A plain record with function-valued `onpeek`, `onpoke` and
    /// `onsplice` fields
    Record(Record),
    /// A callback invoked with `(name, new, old, instance)` for writes only
    Callback(Function),
    /// An instance notified through its class hooks
    Instance(WeakInstance),
}

impl Observer {
    /// Wrap a capability object.
    pub fn handler(handler: impl ObserverHandler + 'static) -> Self {
        Observer::Handler(Rc::new(handler))
    }

    /// Wrap a write callback.
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&str, &Value, &Value, &Instance) -> Result<()> + 'static,
    {
        Observer::Callback(Function::new(move |args| {
            let undefined = Value::Undefined;
            let name = args.first().and_then(Value::as_str).unwrap_or_default();
            let new = args.get(1).unwrap_or(&undefined);
            let old = args.get(2).unwrap_or(&undefined);
            if let Some(Value::Instance(instance)) = args.get(3) {
                f(name, new, old, instance)?;
            }
            Ok(Value::Undefined)
        }))
    }

    /// An instance observing through its class hooks.
    pub fn instance(instance: &Instance) -> Self {
        Observer::Instance(instance.downgrade())
    }

    /// Read an observer out of a value passed to `addObserver`. Undefined
    /// means the owner observes itself.
    pub fn from_value(value: &Value, owner: &Instance) -> Result<Self> {
        match value {
            Value::Undefined => Ok(Observer::instance(owner)),
            Value::Function(f) => Ok(Observer::Callback(f.clone())),
            Value::Object(record) => Ok(Observer::Record(record.clone())),
            Value::Instance(instance) => Ok(Observer::instance(instance)),
            other => Err(TypeError::argument(
                owner.class().name(),
                "addObserver",
                vec!["Observer".to_string(), "Function".to_string()],
                other.type_of(),
            )
            .into()),
        }
    }

    /// Identity comparison, used to deduplicate registrations.
    pub fn same(&self, other: &Observer) -> bool {
        match (self, other) {
            (Observer::Handler(a), Observer::Handler(b)) => {
                std::ptr::eq(Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ())
            }
            (Observer::Record(a), Observer::Record(b)) => Rc::ptr_eq(a, b),
            (Observer::Callback(a), Observer::Callback(b)) => a.ptr_eq(b),
            (Observer::Instance(a), Observer::Instance(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    fn is_self(&self, instance: &Instance) -> bool {
        matches!(self, Observer::Instance(weak) if weak.points_to(instance))
    }

    fn peek(&self, instance: &Instance, name: &str) -> Result<()> {
        match self {
            Observer::Handler(handler) => handler.on_peek(instance, name),
            Observer::Record(record) => {
                record_call(record, "onpeek", &[instance.into(), name.into()])
            }
            Observer::Callback(_) => Ok(()),
            Observer::Instance(weak) => match weak.upgrade() {
                Some(observer) => match observer.class().peek_hook() {
                    Some(hook) => hook(&observer, instance, name),
                    None => Ok(()),
                },
                None => Ok(()),
            },
        }
    }

    fn poke(&self, instance: &Instance, name: &str, new: &Value, old: &Value) -> Result<()> {
        match self {
            Observer::Handler(handler) => handler.on_poke(instance, name, new, old),
            Observer::Record(record) => record_call(
                record,
                "onpoke",
                &[instance.into(), name.into(), new.clone(), old.clone()],
            ),
            Observer::Callback(f) => f
                .call(&[name.into(), new.clone(), old.clone(), instance.into()])
                .map(|_| ()),
            Observer::Instance(weak) => match weak.upgrade() {
                Some(observer) => match observer.class().poke_hook() {
                    Some(hook) => hook(&observer, instance, name, new, old),
                    None => Ok(()),
                },
                None => Ok(()),
            },
        }
    }

    fn splice(&self, instance: &Instance, added: &[Value], removed: &[Value]) -> Result<()> {
        match self {
            Observer::Handler(handler) => handler.on_splice(instance, added, removed),
            Observer::Record(record) => record_call(
                record,
                "onsplice",
                &[
                    instance.into(),
                    Value::array(added.to_vec()),
                    Value::array(removed.to_vec()),
                ],
            ),
            Observer::Callback(_) => Ok(()),
            Observer::Instance(weak) => match weak.upgrade() {
                Some(observer) => match observer.class().splice_hook() {
                    Some(hook) => hook(&observer, instance, added, removed),
                    None => Ok(()),
                },
                None => Ok(()),
            },
        }
    }
}

impl std::fmt::Debug for Observer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Observer::Handler(_) => write!(f, "Observer::Handler"),
            Observer::Record(_) => write!(f, "Observer::Record"),
            Observer::Callback(_) => write!(f, "Observer::Callback"),
            Observer::Instance(_) => write!(f, "Observer::Instance"),
        }
    }
}

fn record_call(record: &Record, name: &str, args: &[Value]) -> Result<()> {
    let method = record.borrow().get(name).cloned();
    match method {
        Some(Value::Function(f)) => f.call(args).map(|_| ()),
        _ => Ok(()),
    }
}

struct Poke {
    name: String,
    newest: Value,
    original: Value,
}

/// Per-instance entries in first-touched order.
struct Ledger<T> {
    order: Vec<(u64, WeakInstance)>,
    entries: HashMap<u64, T>,
}

impl<T> Default for Ledger<T> {
    fn default() -> Self {
        Ledger {
            order: Vec::new(),
            entries: HashMap::new(),
        }
    }
}

impl<T: Default> Ledger<T> {
    fn contains(&self, key: u64) -> bool {
        self.entries.contains_key(&key)
    }

    fn entry(&mut self, instance: &Instance) -> &mut T {
        let key = instance.target().key();
        if !self.entries.contains_key(&key) {
            self.order.push((key, instance.downgrade()));
        }
        self.entries.entry(key).or_default()
    }

    fn drain(&mut self) -> Vec<(WeakInstance, T)> {
        let mut entries = std::mem::take(&mut self.entries);
        std::mem::take(&mut self.order)
            .into_iter()
            .filter_map(|(key, weak)| entries.remove(&key).map(|entry| (weak, entry)))
            .collect()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[derive(Default)]
struct Dispatcher {
    locals: HashMap<u64, Vec<Observer>>,
    globals: Vec<Observer>,
    peeks: Ledger<Vec<String>>,
    pokes: Ledger<Vec<Poke>>,
    mutes: Ledger<Vec<Value>>,
    pending: Option<TickId>,
    scheduler: Option<Rc<dyn Scheduler>>,
}

impl Dispatcher {
    fn is_watched(&self, key: u64) -> bool {
        !self.globals.is_empty() || self.locals.contains_key(&key)
    }
}

thread_local! {
    static DISPATCHER: RefCell<Dispatcher> = RefCell::new(Dispatcher::default());
    static PEEKING: Cell<bool> = const { Cell::new(true) };
}

/// Restores the previous peeking state when dropped.
struct PeekSuspension(bool);

fn suspend_peeking() -> PeekSuspension {
    PeekSuspension(PEEKING.with(|peeking| peeking.replace(false)))
}

impl Drop for PeekSuspension {
    fn drop(&mut self) {
        let previous = self.0;
        let _ = PEEKING.try_with(|peeking| peeking.set(previous));
    }
}

fn is_observable(instance: &Instance) -> bool {
    instance.target().is_constructed() && instance.class().is_observable()
}

fn locals_of(instance: &Instance) -> Vec<Observer> {
    let key = instance.target().key();
    DISPATCHER.with(|d| d.borrow().locals.get(&key).cloned().unwrap_or_default())
}

fn globals() -> Vec<Observer> {
    DISPATCHER.with(|d| d.borrow().globals.clone())
}

/// Record a read. Global observers hear about it immediately; local
/// observers at the next flush, public names only.
pub(crate) fn peek(instance: &Instance, key: &PropertyKey) -> Result<()> {
    let Some(name) = key.as_name() else {
        return Ok(());
    };
    if !PEEKING.with(Cell::get) || !is_observable(instance) {
        return Ok(());
    }
    let globals = globals();
    if !globals.is_empty() {
        let _suspended = suspend_peeking();
        for observer in &globals {
            observer.peek(instance, name)?;
        }
    }
    if !access::is_public_name(name) {
        return Ok(());
    }
    let key = instance.target().key();
    let recorded = DISPATCHER.with(|d| {
        let mut d = d.borrow_mut();
        if !d.locals.contains_key(&key) {
            return false;
        }
        let names = d.peeks.entry(instance);
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
        true
    });
    if recorded {
        trace!(identity = %instance.id(), name, "peek");
        schedule();
    }
    Ok(())
}

/// Record a write. Repeated writes in one epoch coalesce to the newest
/// value and the value from the start of the epoch.
pub(crate) fn poke(instance: &Instance, key: &PropertyKey, new: &Value, old: &Value) {
    let Some(name) = key.as_name() else {
        return;
    };
    if !is_observable(instance) {
        return;
    }
    let target_key = instance.target().key();
    let recorded = DISPATCHER.with(|d| {
        let mut d = d.borrow_mut();
        if !d.is_watched(target_key) {
            return false;
        }
        let pokes = d.pokes.entry(instance);
        match pokes.iter_mut().find(|p| p.name == name) {
            Some(poke) => poke.newest = new.clone(),
            None => pokes.push(Poke {
                name: name.to_string(),
                newest: new.clone(),
                original: old.clone(),
            }),
        }
        true
    });
    if recorded {
        trace!(identity = %instance.id(), name, "poke");
        schedule();
    }
}

/// Snapshot the elements before the first mutation of the epoch.
pub(crate) fn splice(instance: &Instance) {
    if !is_observable(instance) {
        return;
    }
    let key = instance.target().key();
    let needed = DISPATCHER.with(|d| {
        let d = d.borrow();
        d.is_watched(key) && !d.mutes.contains(key)
    });
    if !needed {
        return;
    }
    let snapshot = instance.target().elements();
    DISPATCHER.with(|d| *d.borrow_mut().mutes.entry(instance) = snapshot);
    trace!(identity = %instance.id(), "splice");
    schedule();
}

fn schedule() {
    let (scheduler, previous) = DISPATCHER.with(|d| {
        let mut d = d.borrow_mut();
        (d.scheduler.clone(), d.pending.take())
    });
    let scheduler = scheduler.unwrap_or_else(|| EventLoop::current() as Rc<dyn Scheduler>);
    if let Some(id) = previous {
        scheduler.cancel_tick(id);
    }
    let id = scheduler.request_tick(Task::new(flush));
    DISPATCHER.with(|d| d.borrow_mut().pending = Some(id));
}

/// Deliver everything recorded since the last flush: peeks, then pokes,
/// then splices. The first observer failure aborts the rest of the pass.
pub fn flush() -> Result<()> {
    let (peeks, pokes, mutes) = DISPATCHER.with(|d| {
        let mut d = d.borrow_mut();
        d.pending = None;
        (d.peeks.drain(), d.pokes.drain(), d.mutes.drain())
    });
    if peeks.is_empty() && pokes.is_empty() && mutes.is_empty() {
        return Ok(());
    }
    debug!(
        peeks = peeks.len(),
        pokes = pokes.len(),
        splices = mutes.len(),
        "flushing observers"
    );
    let _suspended = suspend_peeking();
    let result = deliver(peeks, pokes, mutes);
    match &result {
        Ok(()) => debug!("flush complete"),
        Err(error) => warn!(%error, "observer failed, remaining notifications dropped"),
    }
    result
}

fn alive(weak: &WeakInstance) -> Option<Instance> {
    weak.upgrade().filter(|instance| !instance.is_disposed())
}

fn deliver(
    peeks: Vec<(WeakInstance, Vec<String>)>,
    pokes: Vec<(WeakInstance, Vec<Poke>)>,
    mutes: Vec<(WeakInstance, Vec<Value>)>,
) -> Result<()> {
    for (weak, names) in peeks {
        let Some(instance) = alive(&weak) else {
            continue;
        };
        for observer in locals_of(&instance) {
            for name in &names {
                observer.peek(&instance, name)?;
            }
        }
    }

    for (weak, changes) in pokes {
        let Some(instance) = alive(&weak) else {
            continue;
        };
        for observer in globals() {
            for change in &changes {
                observer.poke(&instance, &change.name, &change.newest, &change.original)?;
            }
        }
        for observer in locals_of(&instance) {
            let private_ok = observer.is_self(&instance);
            for change in &changes {
                if private_ok || access::is_public_name(&change.name) {
                    observer.poke(&instance, &change.name, &change.newest, &change.original)?;
                }
            }
        }
    }

    for (weak, before) in mutes {
        let Some(instance) = alive(&weak) else {
            continue;
        };
        let after = instance.target().elements();
        let added = difference(&after, &before);
        let removed = difference(&before, &after);
        let mut observers = globals();
        for local in locals_of(&instance) {
            if !observers.iter().any(|o| o.same(&local)) {
                observers.push(local);
            }
        }
        for observer in observers {
            observer.splice(&instance, &added, &removed)?;
        }
    }
    Ok(())
}

/// Elements of `a` not found in `b`.
fn difference(a: &[Value], b: &[Value]) -> Vec<Value> {
    a.iter()
        .filter(|x| !b.iter().any(|y| same_value(x, y)))
        .cloned()
        .collect()
}

/// Register a local observer. Registering the same observer twice is a
/// no-op.
pub(crate) fn add(instance: &Instance, observer: Observer) -> Result<()> {
    if !instance.class().is_observable() {
        return Err(access::not_observable(instance.class()));
    }
    let key = instance.target().key();
    let rejected = DISPATCHER.with(|d| {
        let mut d = d.borrow_mut();
        let list = d.locals.entry(key).or_default();
        if list.iter().any(|o| o.same(&observer)) {
            return Some(observer);
        }
        list.push(observer);
        None
    });
    drop(rejected);
    Ok(())
}

/// Unregister a local observer.
pub(crate) fn remove(instance: &Instance, observer: &Observer) -> Result<()> {
    if !instance.class().is_observable() {
        return Err(access::not_observable(instance.class()));
    }
    let key = instance.target().key();
    let removed = DISPATCHER.with(|d| {
        let mut d = d.borrow_mut();
        let list = d.locals.remove(&key).unwrap_or_default();
        let (removed, kept): (Vec<_>, Vec<_>) =
            list.into_iter().partition(|o| o.same(observer));
        if !kept.is_empty() {
            d.locals.insert(key, kept);
        }
        removed
    });
    drop(removed);
    Ok(())
}

/// Drop the registrations of a target that no longer exists.
pub(crate) fn forget(key: u64) {
    let _ = DISPATCHER.try_with(|d| {
        let removed = d
            .try_borrow_mut()
            .ok()
            .and_then(|mut d| d.locals.remove(&key));
        drop(removed);
    });
}

/// Register an observer for every observable instance.
pub fn add_global_observer(observer: Observer) {
    let rejected = DISPATCHER.with(|d| {
        let mut d = d.borrow_mut();
        if d.globals.iter().any(|o| o.same(&observer)) {
            return Some(observer);
        }
        d.globals.push(observer);
        None
    });
    drop(rejected);
}

/// Unregister a global observer. Returns false when it was not registered.
pub fn remove_global_observer(observer: &Observer) -> bool {
    let removed = DISPATCHER.with(|d| {
        let mut d = d.borrow_mut();
        let position = d.globals.iter().position(|o| o.same(observer));
        position.map(|i| d.globals.remove(i))
    });
    removed.is_some()
}

/// Route flush requests to `scheduler` instead of the thread's event loop.
pub fn set_scheduler(scheduler: Rc<dyn Scheduler>) {
    DISPATCHER.with(|d| d.borrow_mut().scheduler = Some(scheduler));
}

/// Run every pending immediate task on this thread's event loop,
/// delivering any scheduled flush.
pub fn tick() -> Result<()> {
    EventLoop::current().run_until_done()
}

/// Run one frame on this thread's event loop.
pub fn frame() -> Result<()> {
    EventLoop::current().run_frame()
}
