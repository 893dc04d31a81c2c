//! Access policy.
//!
//! Classifies property names and builds the errors raised for illegal
//! access. Names starting with `_` or `$`, and all symbols, are private:
//! they are kept out of enumeration and out of local observer
//! notifications.

use crate::class::Class;
use crate::value::Value;
use core_types::{Error, PropertyKey};
use indexmap::IndexMap;

/// Names that can never be assigned.
pub const RESERVED: [&str; 4] = ["addObserver", "removeObserver", "observe", "unobserve"];

/// Check if a name is public (enumerable and locally observable).
pub fn is_public_name(name: &str) -> bool {
    !(name.starts_with('_') || name.starts_with('$'))
}

/// Check if a key is public. Symbols never are.
pub fn is_public(key: &PropertyKey) -> bool {
    key.as_name().is_some_and(is_public_name)
}

/// Check if a name is reserved for observer management.
pub fn is_reserved(name: &str) -> bool {
    RESERVED.contains(&name)
}

/// Check that every constructor key is public and not reserved.
pub fn confirm(record: &IndexMap<String, Value>) -> bool {
    record
        .keys()
        .all(|key| is_public_name(key) && !is_reserved(key))
}

/// Render a key as it appears in messages.
fn signature(key: &PropertyKey) -> String {
    match key {
        PropertyKey::Name(name) => name.clone(),
        PropertyKey::Symbol(_) => "[symbol]".to_string(),
    }
}

/// Constructor input contained private or reserved keys.
pub fn bad_constructor(class: &Class, record: &IndexMap<String, Value>) -> Error {
    let rejected = record
        .keys()
        .filter(|key| !is_public_name(key) || is_reserved(key))
        .map(|key| format!("  \"{}\" is not allowed\n", key))
        .collect::<String>();
    Error::access(format!("Cannot create {}: \n{}", class.name(), rejected))
}

/// Assignment to a readonly, reserved, locked or undeclared field.
pub fn bad_value(class: &Class, key: &PropertyKey) -> Error {
    Error::access(format!("Cannot assign to {}.{}", class.name(), signature(key)))
}

/// Read of a write-only computed property.
pub fn bad_getter(class: &Class, key: &PropertyKey) -> Error {
    Error::access(format!(
        "Getting a property that only has a setter: {}.{}",
        class.name(),
        signature(key)
    ))
}

/// Write of a read-only computed property.
pub fn bad_setter(class: &Class, key: &PropertyKey) -> Error {
    Error::access(format!(
        "Setting a property that only has a getter: {}.{}",
        class.name(),
        signature(key)
    ))
}

/// Attempt to define an accessor or a reserved name.
pub fn bad_define(class: &Class, key: &PropertyKey) -> Error {
    Error::access(format!("Cannot redefine {}.{}", class.name(), signature(key)))
}

/// Any access on a disposed instance.
pub fn destructed(class: &Class, key: &PropertyKey) -> Error {
    Error::access(format!(
        "Attempt to access \"{}\" on destructed {}",
        signature(key),
        class.name()
    ))
}

/// Observer registration on a class that opted out of observation.
pub fn not_observable(class: &Class) -> Error {
    Error::access(format!(
        "The {} is unfortunately not observable.",
        class.name()
    ))
}
