//! Instance handles.
//!
//! [`Instance`] is the only way to reach a target. Every operation on it is
//! routed through the interception layer.

use crate::class::ClassRef;
use crate::handlers::collection_handler;
use crate::observers::{self, Observer};
use crate::proxy::{PropertyDescriptor, ProxyHandler};
use crate::target::Target;
use crate::value::{self, elements_to_json, entries_to_json, Function, Value};
use core_types::{Error, PropertyKey, Result};
use std::fmt;
use std::rc::{Rc, Weak};

/// A model or collection.
///
/// Cloning is cheap and yields another handle to the same instance.
#[derive(Clone)]
pub struct Instance(Rc<Target>);

/// Non-owning handle, as held by observer registrations and ledgers.
#[derive(Clone)]
pub struct WeakInstance(Weak<Target>);

impl WeakInstance {
    /// Get the instance back if it is still alive
    pub fn upgrade(&self) -> Option<Instance> {
        self.0.upgrade().map(Instance)
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &WeakInstance) -> bool {
        Weak::ptr_eq(&self.0, &other.0)
    }

    /// Check if this handle refers to `instance`
    pub fn points_to(&self, instance: &Instance) -> bool {
        std::ptr::eq(self.0.as_ptr(), Rc::as_ptr(&instance.0))
    }
}

impl Instance {
    /// Allocate a target for `class`. Construction is finished by the
    /// caller.
    pub(crate) fn allocate(class: &ClassRef) -> Instance {
        Instance(Rc::new_cyclic(|weak| Target::new(class.clone(), weak.clone())))
    }

    pub(crate) fn from_target(target: Rc<Target>) -> Instance {
        Instance(target)
    }

    pub(crate) fn target(&self) -> &Target {
        &self.0
    }

    /// The class this instance was built from
    pub fn class(&self) -> &ClassRef {
        self.0.class()
    }

    /// Unique identity string, readable as `$id`
    pub fn id(&self) -> String {
        self.0.identity()
    }

    /// Check if the constructor has finished
    pub fn is_constructed(&self) -> bool {
        self.0.is_constructed()
    }

    /// Check if the instance has been disposed
    pub fn is_disposed(&self) -> bool {
        self.0.is_disposed()
    }

    /// Non-owning handle
    pub fn downgrade(&self) -> WeakInstance {
        WeakInstance(Rc::downgrade(&self.0))
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Read a property.
    pub fn get(&self, key: impl Into<PropertyKey>) -> Result<Value> {
        ProxyHandler::get(self, &key.into())
    }

    /// Assign a property.
    pub fn set(&self, key: impl Into<PropertyKey>, value: impl Into<Value>) -> Result<()> {
        ProxyHandler::set(self, &key.into(), value.into())
    }

    /// Define a data property.
    pub fn define_property(
        &self,
        key: impl Into<PropertyKey>,
        desc: PropertyDescriptor,
    ) -> Result<()> {
        ProxyHandler::define_property(self, &key.into(), desc)
    }

    /// Delete a property.
    pub fn delete_property(&self, key: impl Into<PropertyKey>) -> Result<()> {
        ProxyHandler::delete_property(self, &key.into())
    }

    /// Enumerable keys: element indices, then public fields.
    pub fn own_keys(&self) -> Result<Vec<String>> {
        crate::handlers::model_handler::cool(self, &PropertyKey::from("ownKeys"))?;
        Ok(ProxyHandler::own_keys(self))
    }

    /// Descriptor of an own enumerable property.
    pub fn get_own_property_descriptor(
        &self,
        key: impl Into<PropertyKey>,
    ) -> Result<Option<PropertyDescriptor>> {
        ProxyHandler::get_own_property_descriptor(self, &key.into())
    }

    /// Call a method (or a function-valued field).
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        let callee = self.get(name)?;
        value::call(&callee, self.class().name(), name, args)
    }

    /// Register a local observer.
    pub fn add_observer(&self, observer: Observer) -> Result<()> {
        crate::handlers::model_handler::cool(self, &PropertyKey::from("addObserver"))?;
        observers::add(self, observer)
    }

    /// Unregister a local observer.
    pub fn remove_observer(&self, observer: &Observer) -> Result<()> {
        crate::handlers::model_handler::cool(self, &PropertyKey::from("removeObserver"))?;
        observers::remove(self, observer)
    }

    /// Register a write callback, optionally narrowed to a single field.
    /// Returns the observer, for [`Instance::unobserve`].
    pub fn observe<F>(&self, name: Option<&str>, callback: F) -> Result<Observer>
    where
        F: Fn(&str, &Value, &Value, &Instance) -> Result<()> + 'static,
    {
        let observer = match name {
            Some(field) => {
                let field = field.to_string();
                Observer::callback(move |name, new, old, instance| {
                    if name == field {
                        callback(name, new, old, instance)
                    } else {
                        Ok(())
                    }
                })
            }
            None => Observer::callback(callback),
        };
        self.add_observer(observer.clone())?;
        Ok(observer)
    }

    /// Unregister an observer returned by [`Instance::observe`].
    pub fn unobserve(&self, observer: &Observer) -> Result<()> {
        self.remove_observer(observer)
    }

    /// Dispose the instance. Runs the destruct hook once; every later access
    /// except reading `disposed` fails.
    pub fn dispose(&self) -> Result<()> {
        self.0.dispose()
    }

    /// Serialize the public fields (models) or the elements (collections).
    /// An instance that reaches itself fails with a `TypeError`.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        self.to_json_within(&mut Vec::new())
    }

    pub(crate) fn to_json_within(&self, open: &mut Vec<*const ()>) -> Result<serde_json::Value> {
        crate::handlers::model_handler::cool(self, &PropertyKey::from("toJSON"))?;
        let pointer = Rc::as_ptr(&self.0) as *const ();
        let owner = self.class().name();
        if self.class().is_collection() {
            let elements = self.0.elements();
            value::within(open, pointer, &owner, |open| elements_to_json(&elements, open))
        } else {
            let entries = self.0.public_entries();
            value::within(open, pointer, &owner, |open| entries_to_json(entries.iter(), open))
        }
    }

    // Collection operations ..................................................

    /// Number of elements
    pub fn len(&self) -> Result<usize> {
        let length = self.get("length")?;
        Ok(length.as_number().map(|n| n as usize).unwrap_or(0))
    }

    /// Check if there are no elements
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Element at `index`, `Undefined` when out of range.
    pub fn at(&self, index: usize) -> Result<Value> {
        self.get(index)
    }

    /// Append elements, returning the new length.
    pub fn push<I, V>(&self, items: I) -> Result<usize>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let items = items.into_iter().map(Into::into).collect();
        let len = self.0.len();
        collection_handler::splice(self, len, 0, items)?;
        Ok(self.0.len())
    }

    /// Remove and return the last element.
    pub fn pop(&self) -> Result<Value> {
        let len = self.0.len();
        if len == 0 {
            collection_handler::splice(self, 0, 0, Vec::new())?;
            return Ok(Value::Undefined);
        }
        let removed = collection_handler::splice(self, len - 1, 1, Vec::new())?;
        Ok(removed.into_iter().next().unwrap_or_default())
    }

    /// Remove and return the first element.
    pub fn shift(&self) -> Result<Value> {
        let removed = collection_handler::splice(self, 0, 1, Vec::new())?;
        Ok(removed.into_iter().next().unwrap_or_default())
    }

    /// Prepend elements, returning the new length.
    pub fn unshift<I, V>(&self, items: I) -> Result<usize>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let items = items.into_iter().map(Into::into).collect();
        collection_handler::splice(self, 0, 0, items)?;
        Ok(self.0.len())
    }

    /// Remove `delete_count` elements at `start` and insert `items` in
    /// their place. Returns the removed elements.
    pub fn splice<I, V>(&self, start: usize, delete_count: usize, items: I) -> Result<Vec<Value>>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let items = items.into_iter().map(Into::into).collect();
        collection_handler::splice(self, start, delete_count, items)
    }

    /// Snapshot of the elements.
    pub fn to_vec(&self) -> Result<Vec<Value>> {
        let len = self.len()?;
        (0..len).map(|i| self.at(i)).collect()
    }

    /// Truncate or pad (with `Undefined`) to `len` elements.
    pub fn set_len(&self, len: usize) -> Result<()> {
        self.set("length", len as f64)
    }
}

/// A callable bound to `instance`: a method or one of the reserved
/// observation entry points.
pub(crate) fn bound(instance: &Instance, name: &str) -> Value {
    let weak = instance.downgrade();
    let name = name.to_string();
    Value::Function(Function::new(move |args| {
        let instance = weak
            .upgrade()
            .ok_or_else(|| Error::access(format!("Attempt to call \"{}\" on a dropped instance", name)))?;
        invoke(&instance, &name, args)
    }))
}

fn invoke(instance: &Instance, name: &str, args: &[Value]) -> Result<Value> {
    if let Some(method) = instance.class().find_method(name).cloned() {
        return method(instance, args);
    }
    let first = args.first().cloned().unwrap_or_default();
    match name {
        "addObserver" => {
            let observer = Observer::from_value(&first, instance)?;
            instance.add_observer(observer.clone())?;
            Ok(remover(instance, observer))
        }
        "removeObserver" | "unobserve" => {
            let observer = Observer::from_value(&first, instance)?;
            instance.remove_observer(&observer)?;
            Ok(Value::Undefined)
        }
        "observe" => {
            let observer = match (&first, args.get(1)) {
                (Value::String(field), Some(Value::Function(f))) => {
                    let (field, f) = (field.clone(), f.clone());
                    Observer::callback(move |name, new, old, instance| {
                        if name == field {
                            f.call(&[new.clone(), old.clone(), instance.into()])?;
                        }
                        Ok(())
                    })
                }
                _ => Observer::from_value(&first, instance)?,
            };
            instance.add_observer(observer.clone())?;
            Ok(remover(instance, observer))
        }
        "dispose" => {
            instance.dispose()?;
            Ok(Value::Undefined)
        }
        _ => Err(crate::access::bad_value(
            instance.class(),
            &PropertyKey::from(name),
        )),
    }
}

fn remover(instance: &Instance, observer: Observer) -> Value {
    let weak = instance.downgrade();
    Value::Function(Function::new(move |_| {
        if let Some(instance) = weak.upgrade() {
            instance.remove_observer(&observer)?;
        }
        Ok(Value::Undefined)
    }))
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.class().is_collection() {
            "collection"
        } else {
            "model"
        };
        write!(f, "[{} {}]", kind, self.class().name())
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self, self.id())
    }
}
