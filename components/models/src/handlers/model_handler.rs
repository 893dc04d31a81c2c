//! Keyed field access.

use crate::access;
use crate::instance::{self, Instance};
use crate::observers;
use crate::pipes::object_pipe;
use crate::value::{same_value, Value};
use core_types::{PropertyKey, Result};
use indexmap::IndexMap;

/// Reading this tells a wrapper apart from a bare target.
pub(crate) const CONFIRM_PROXY: &str = "$CONFIRM_PROXY";

const SPECIAL: [&str; 5] = ["constructor", "constructed", "dispose", "disposed", CONFIRM_PROXY];

/// Fail on any access to a disposed instance, except reading `disposed`.
pub(crate) fn cool(instance: &Instance, key: &PropertyKey) -> Result<()> {
    if key.as_name() != Some("disposed") && instance.target().is_disposed() {
        return Err(access::destructed(instance.class(), key));
    }
    Ok(())
}

/// Names the handler answers itself. They can never be assigned.
pub(crate) fn is_special(name: &str) -> bool {
    SPECIAL.contains(&name) || access::is_reserved(name)
}

/// Store the constructor record. Keys were already confirmed and declared.
pub(crate) fn init(instance: &Instance, record: IndexMap<String, Value>) -> Result<()> {
    for (name, value) in record {
        let key = PropertyKey::from(name);
        let value = piped(instance, &key, value)?;
        instance.target().set(&key, value, None);
    }
    Ok(())
}

/// Read a field, falling back to the universal getter when undefined.
pub(crate) fn get(instance: &Instance, key: &PropertyKey) -> Result<Value> {
    cool(instance, key)?;
    if let Some(value) = key.as_name().and_then(|name| special(instance, name)) {
        return Ok(value);
    }
    observers::peek(instance, key)?;
    let value = instance.target().get(key);
    if !value.is_undefined() {
        return Ok(value);
    }
    match key.as_name() {
        Some(name) => Ok(universal_get(instance, name)?.unwrap_or(value)),
        None => Ok(value),
    }
}

/// Write a field through the pipeline. Unchanged values are stored but
/// not reported.
pub(crate) fn set(instance: &Instance, key: &PropertyKey, value: Value) -> Result<()> {
    cool(instance, key)?;
    if let Some(name) = key.as_name() {
        if universal_set(instance, name, &value)? {
            return Ok(());
        }
    }
    let value = piped(instance, key, value)?;
    let target = instance.target();
    let old = target.get(key);
    let changed = !same_value(&old, &value);
    target.set(key, value.clone(), None);
    if changed {
        observers::poke(instance, key, &value, &old);
    }
    Ok(())
}

/// Remove a stored field. Declared fields stay declared; the removal is
/// reported as a change to `Undefined`.
pub(crate) fn delete(instance: &Instance, key: &PropertyKey) -> Result<()> {
    cool(instance, key)?;
    if let (Some(name), Some(pipe)) = (key.as_name(), object_pipe(instance.class())) {
        if access::is_public_name(name) && !pipe.has(name) {
            return Err(access::bad_value(instance.class(), key));
        }
    }
    if let Some(old) = instance.target().remove(key) {
        if !old.is_undefined() {
            observers::poke(instance, key, &Value::Undefined, &old);
        }
    }
    Ok(())
}

/// Public stored field names.
pub(crate) fn keys(instance: &Instance) -> Vec<String> {
    instance.target().public_keys()
}

/// Run a public field through the class pipeline. Private names and
/// symbols pass through.
pub(crate) fn piped(instance: &Instance, key: &PropertyKey, value: Value) -> Result<Value> {
    match key.as_name() {
        Some(name) if access::is_public_name(name) => match object_pipe(instance.class()) {
            Some(pipe) => pipe.pipe(name, &value),
            None => Ok(value),
        },
        _ => Ok(value),
    }
}

fn special(instance: &Instance, name: &str) -> Option<Value> {
    let target = instance.target();
    match name {
        "disposed" => Some(Value::Boolean(target.is_disposed())),
        "constructed" => Some(Value::Boolean(target.is_constructed())),
        "constructor" => Some(Value::String(instance.class().name().to_string())),
        CONFIRM_PROXY => Some(Value::Boolean(true)),
        "dispose" => Some(instance::bound(instance, name)),
        _ if access::is_reserved(name) => Some(instance::bound(instance, name)),
        _ => None,
    }
}

fn universal_get(instance: &Instance, name: &str) -> Result<Option<Value>> {
    let Some(get) = instance.class().universal_getter().cloned() else {
        return Ok(None);
    };
    let target = instance.target();
    if !target.is_constructed() {
        return Ok(None);
    }
    target
        .universally(|| get(instance, name))
        .transpose()
        .map(Option::flatten)
}

fn universal_set(instance: &Instance, name: &str, value: &Value) -> Result<bool> {
    let Some(set) = instance.class().universal_setter().cloned() else {
        return Ok(false);
    };
    let target = instance.target();
    if !target.is_constructed() {
        return Ok(false);
    }
    target
        .universally(|| set(instance, name, value))
        .unwrap_or(Ok(false))
}
