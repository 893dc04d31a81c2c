//! Element and `length` access on collections.

use super::model_handler::cool;
use crate::access;
use crate::instance::Instance;
use crate::observers;
use crate::pipes::array_pipe;
use crate::value::Value;
use core_types::{Error, PropertyKey, Result};
use regex::Regex;
use std::sync::LazyLock;

/// Strings that would address an element by index.
static INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-*(?:[1-9]\d*|\d)$").expect("valid regex"));

const LENGTH: &str = "length";

/// Indices run below `2^32 - 1`; lengths up to it.
const MAX_LENGTH: usize = 4_294_967_295;

/// Check if `key` addresses `length` or an element of a collection.
pub(crate) fn matches(instance: &Instance, key: &PropertyKey) -> bool {
    instance.class().is_collection()
        && key
            .as_name()
            .is_some_and(|name| name == LENGTH || INTEGER.is_match(name))
}

/// Index in range, `None` for negative or out-of-range strings.
fn index(name: &str) -> Option<usize> {
    name.parse::<usize>().ok().filter(|i| *i < MAX_LENGTH)
}

/// Read `length` or an element. Negative indices read `Undefined`.
pub(crate) fn get(instance: &Instance, key: &PropertyKey) -> Result<Value> {
    cool(instance, key)?;
    observers::peek(instance, key)?;
    let target = instance.target();
    Ok(match key.as_name() {
        Some(LENGTH) => Value::Number(target.len() as f64),
        Some(name) => index(name).map(|i| target.element(i)).unwrap_or_default(),
        None => Value::Undefined,
    })
}

/// Write `length` or an element. Elements go through the element pipeline.
pub(crate) fn set(instance: &Instance, key: &PropertyKey, value: Value) -> Result<()> {
    cool(instance, key)?;
    let name = key.as_name().unwrap_or_default();
    if name == LENGTH {
        let len = length(instance, key, &value)?;
        observers::splice(instance);
        instance.target().with_elements(|elements| elements.resize(len, Value::Undefined));
        return Ok(());
    }
    let Some(i) = index(name) else {
        return Err(access::bad_value(instance.class(), key));
    };
    let value = array_pipe(instance.class())?.pipe(&value)?;
    observers::splice(instance);
    write(instance, key, i, value)
}

/// Leave an `Undefined` hole at an index without running the pipeline.
pub(crate) fn unset(instance: &Instance, key: &PropertyKey) -> Result<()> {
    cool(instance, key)?;
    let Some(i) = key.as_name().and_then(index) else {
        return Err(access::bad_value(instance.class(), key));
    };
    if i < instance.target().len() {
        observers::splice(instance);
        write(instance, key, i, Value::Undefined)?;
    }
    Ok(())
}

/// Piped bulk insertion during construction.
pub(crate) fn init(instance: &Instance, elements: Vec<Value>) -> Result<()> {
    if elements.is_empty() {
        return Ok(());
    }
    let elements = array_pipe(instance.class())?.pipe_all(&elements)?;
    instance.target().with_elements(|current| current.extend(elements));
    Ok(())
}

/// Remove `delete_count` elements at `start` and insert `items` there,
/// returning the removed elements. Items are piped before anything
/// changes.
pub(crate) fn splice(
    instance: &Instance,
    start: usize,
    delete_count: usize,
    items: Vec<Value>,
) -> Result<Vec<Value>> {
    let key = PropertyKey::from(LENGTH);
    cool(instance, &key)?;
    if !instance.class().is_collection() {
        return Err(access::bad_value(instance.class(), &key));
    }
    let items = array_pipe(instance.class())?.pipe_all(&items)?;
    let target = instance.target();
    let len = target.len();
    let start = start.min(len);
    let end = start.saturating_add(delete_count).min(len);
    if start == end && items.is_empty() {
        return Ok(Vec::new());
    }
    observers::splice(instance);
    Ok(target.with_elements(|elements| elements.splice(start..end, items).collect::<Vec<_>>()))
}

fn write(instance: &Instance, key: &PropertyKey, i: usize, value: Value) -> Result<()> {
    let Some(len) = i.checked_add(1) else {
        return Err(access::bad_value(instance.class(), key));
    };
    instance.target().with_elements(|elements| {
        if len > elements.len() {
            elements.resize(len, Value::Undefined);
        }
        elements[i] = value;
    });
    Ok(())
}

fn length(instance: &Instance, key: &PropertyKey, value: &Value) -> Result<usize> {
    match value {
        Value::Number(n) if *n >= 0.0 && n.fract() == 0.0 && *n <= MAX_LENGTH as f64 => {
            Ok(*n as usize)
        }
        _ => Err(Error::Type(core_types::TypeError::assignment(
            instance.class().name(),
            key.to_string(),
            vec!["Number".to_string()],
            value.type_of(),
        ))),
    }
}
