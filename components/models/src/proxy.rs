//! Interception layer.
//!
//! Every property operation on an [`Instance`] enters here. Each operation
//! is an ordered chain of checks: accessor on the class chain, method,
//! collection index, illegal name, and finally the model handler.

use crate::access;
use crate::class::{Accessor, Getter, Setter};
use crate::handlers::{collection_handler, model_handler};
use crate::instance::{self, Instance};
use crate::observers;
use crate::value::{same_value, Value};
use core_types::{PropertyKey, Result};

/// Property descriptor for `define_property` and
/// `get_own_property_descriptor`.
#[derive(Clone, Default)]
pub struct PropertyDescriptor {
    /// The value of the property
    pub value: Option<Value>,
    /// Whether the property value can be changed
    pub writable: Option<bool>,
    /// Whether the property shows up in enumeration
    pub enumerable: Option<bool>,
    /// Whether the property can be redefined
    pub configurable: Option<bool>,
    /// Getter function
    pub get: Option<Getter>,
    /// Setter function
    pub set: Option<Setter>,
}

impl std::fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("value", &self.value)
            .field("writable", &self.writable)
            .field("enumerable", &self.enumerable)
            .field("configurable", &self.configurable)
            .field("get", &self.get.as_ref().map(|_| "<function>"))
            .field("set", &self.set.as_ref().map(|_| "<function>"))
            .finish()
    }
}

impl PropertyDescriptor {
    /// A data descriptor. Unless opened up with [`writable`] and
    /// [`configurable`], the defined field ends up readonly and locked.
    ///
    /// [`writable`]: PropertyDescriptor::writable
    /// [`configurable`]: PropertyDescriptor::configurable
    pub fn data(value: impl Into<Value>) -> Self {
        PropertyDescriptor {
            value: Some(value.into()),
            ..Default::default()
        }
    }

    /// An accessor descriptor.
    pub fn accessor(get: Option<Getter>, set: Option<Setter>) -> Self {
        PropertyDescriptor {
            get,
            set,
            ..Default::default()
        }
    }

    /// Set the writable flag
    pub fn writable(mut self, writable: bool) -> Self {
        self.writable = Some(writable);
        self
    }

    /// Set the enumerable flag
    pub fn enumerable(mut self, enumerable: bool) -> Self {
        self.enumerable = Some(enumerable);
        self
    }

    /// Set the configurable flag
    pub fn configurable(mut self, configurable: bool) -> Self {
        self.configurable = Some(configurable);
        self
    }

    /// Check if this is a data descriptor
    pub fn is_data_descriptor(&self) -> bool {
        self.value.is_some() || self.writable.is_some()
    }

    /// Check if this is an accessor descriptor
    pub fn is_accessor_descriptor(&self) -> bool {
        self.get.is_some() || self.set.is_some()
    }
}

/// Entry points for every intercepted operation.
pub(crate) struct ProxyHandler;

impl ProxyHandler {
    pub(crate) fn get(instance: &Instance, key: &PropertyKey) -> Result<Value> {
        if let Some(name) = key.as_name() {
            let class = instance.class().clone();
            if let Some(accessor) = class.find_accessor(name) {
                model_handler::cool(instance, key)?;
                return Self::getter(instance, accessor, key);
            }
            if class.find_method(name).is_some() {
                model_handler::cool(instance, key)?;
                return Ok(instance::bound(instance, name));
            }
            if collection_handler::matches(instance, key) {
                return collection_handler::get(instance, key);
            }
        }
        model_handler::get(instance, key)
    }

    pub(crate) fn set(instance: &Instance, key: &PropertyKey, value: Value) -> Result<()> {
        model_handler::cool(instance, key)?;
        if let Some(name) = key.as_name() {
            let class = instance.class().clone();
            if let Some(accessor) = class.find_accessor(name) {
                return Self::setter(instance, accessor, key, value);
            }
        }
        if collection_handler::matches(instance, key) {
            return collection_handler::set(instance, key, value);
        }
        if Self::illegal(instance, key) {
            return Err(access::bad_value(instance.class(), key));
        }
        model_handler::set(instance, key, value)
    }

    pub(crate) fn define_property(
        instance: &Instance,
        key: &PropertyKey,
        desc: PropertyDescriptor,
    ) -> Result<()> {
        model_handler::cool(instance, key)?;
        let reserved = key.as_name().is_some_and(model_handler::is_special);
        if desc.is_accessor_descriptor() || reserved {
            return Err(access::bad_define(instance.class(), key));
        }
        if collection_handler::matches(instance, key) {
            return collection_handler::set(instance, key, desc.value.unwrap_or_default());
        }
        let target = instance.target();
        let old = target.get(key);
        let value = desc.value.clone().unwrap_or_default();
        if target.has(key) && same_value(&old, &value) {
            return Ok(());
        }
        if target.is_preserved(key) || target.is_readonly(key) {
            return Err(access::bad_value(instance.class(), key));
        }
        let value = model_handler::piped(instance, key, value)?;
        target.set(key, value.clone(), Some(&desc));
        if !same_value(&old, &value) {
            observers::poke(instance, key, &value, &old);
        }
        Ok(())
    }

    pub(crate) fn delete_property(instance: &Instance, key: &PropertyKey) -> Result<()> {
        model_handler::cool(instance, key)?;
        if collection_handler::matches(instance, key) {
            return match key.as_name() {
                Some("length") => Err(access::bad_value(instance.class(), key)),
                _ => collection_handler::unset(instance, key),
            };
        }
        if Self::illegal(instance, key) || instance.target().is_preserved(key) {
            return Err(access::bad_value(instance.class(), key));
        }
        model_handler::delete(instance, key)
    }

    /// Enumerable keys: element indices, then public stored fields.
    pub(crate) fn own_keys(instance: &Instance) -> Vec<String> {
        let indices = (0..instance.target().len()).map(|i| i.to_string());
        indices.chain(model_handler::keys(instance)).collect()
    }

    pub(crate) fn get_own_property_descriptor(
        instance: &Instance,
        key: &PropertyKey,
    ) -> Result<Option<PropertyDescriptor>> {
        model_handler::cool(instance, key)?;
        let target = instance.target();
        if collection_handler::matches(instance, key) {
            let index = key.as_name().and_then(|name| name.parse::<usize>().ok());
            return Ok(match index {
                Some(i) if i < target.len() => Some(
                    PropertyDescriptor::data(target.element(i))
                        .writable(true)
                        .enumerable(true)
                        .configurable(true),
                ),
                _ => None,
            });
        }
        if !access::is_public(key) || !target.has(key) {
            return Ok(None);
        }
        Ok(Some(
            PropertyDescriptor::data(target.get(key))
                .writable(!target.is_readonly(key))
                .enumerable(true)
                .configurable(true),
        ))
    }

    /// Methods, readonly fields and reserved names can't be assigned.
    fn illegal(instance: &Instance, key: &PropertyKey) -> bool {
        if instance.target().is_readonly(key) {
            return true;
        }
        match key.as_name() {
            Some(name) => {
                model_handler::is_special(name) || instance.class().find_method(name).is_some()
            }
            None => false,
        }
    }

    fn getter(instance: &Instance, accessor: &Accessor, key: &PropertyKey) -> Result<Value> {
        let get = accessor
            .get
            .as_ref()
            .ok_or_else(|| access::bad_getter(instance.class(), key))?;
        let value = get(instance)?;
        observers::peek(instance, key)?;
        Ok(value)
    }

    fn setter(instance: &Instance, accessor: &Accessor, key: &PropertyKey, value: Value) -> Result<()> {
        let set = accessor
            .set
            .as_ref()
            .ok_or_else(|| access::bad_setter(instance.class(), key))?;
        let old = match &accessor.get {
            Some(get) => get(instance)?,
            None => Value::Undefined,
        };
        set(instance, value.clone())?;
        if !same_value(&old, &value) {
            observers::poke(instance, key, &value, &old);
        }
        Ok(())
    }
}
