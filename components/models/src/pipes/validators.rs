//! Validators: does a value fit a declared type?

use crate::class::{ClassRef, TypeRef};
use crate::value::Value;
use std::rc::Rc;

/// Returns true when the value fits.
pub(crate) type Validator = Rc<dyn Fn(&Value) -> bool>;

/// Build the validator for `ty`.
pub(crate) fn validator(ty: &TypeRef) -> Validator {
    match ty {
        TypeRef::String => Rc::new(|v| matches!(v, Value::String(_))),
        TypeRef::Number => Rc::new(|v| matches!(v, Value::Number(_))),
        TypeRef::Boolean => Rc::new(|v| matches!(v, Value::Boolean(_))),
        TypeRef::Function => Rc::new(|v| matches!(v, Value::Function(_))),
        TypeRef::Date => Rc::new(|v| matches!(v, Value::Date(_))),
        TypeRef::Symbol => Rc::new(|v| matches!(v, Value::Symbol(_))),
        TypeRef::Object => Rc::new(|v| match v {
            Value::Null | Value::Object(_) | Value::Date(_) => true,
            Value::Instance(instance) => !instance.class().is_collection(),
            _ => false,
        }),
        TypeRef::Array => Rc::new(|v| match v {
            Value::Array(_) => true,
            Value::Instance(instance) => instance.class().is_collection(),
            _ => false,
        }),
        TypeRef::Class(class) => class_validator(class.clone()),
        TypeRef::OneOf(types) => {
            let validators = types.iter().map(validator).collect::<Vec<_>>();
            Rc::new(move |v| validators.iter().any(|validate| validate(v)))
        }
    }
}

/// Null, an instance of the class, or raw input the class can be built from.
fn class_validator(class: ClassRef) -> Validator {
    Rc::new(move |v| match v {
        Value::Null => true,
        Value::Instance(_) => class.is(v),
        Value::Array(_) => class.is_collection(),
        Value::Object(_) => !class.is_collection(),
        _ => false,
    })
}
