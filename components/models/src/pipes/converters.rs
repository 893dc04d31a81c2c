//! Converters: turn validated input into its stored form.
//!
//! Primitives pass through. Class types build a new instance from a plain
//! record (models) or a plain array (collections) and pass existing
//! instances through untouched.

use super::validators::{validator, Validator};
use crate::class::{ClassRef, TypeRef};
use crate::model;
use crate::value::Value;
use core_types::{Error, Result, TypeError};
use std::rc::Rc;

/// Converts a value that already passed validation.
pub(crate) type Converter = Rc<dyn Fn(&Value) -> Result<Value>>;

/// Build the converter for `ty`.
pub(crate) fn converter(ty: &TypeRef) -> Converter {
    match ty {
        TypeRef::Class(class) => class_converter(class.clone()),
        TypeRef::OneOf(types) => {
            let options = types
                .iter()
                .map(|ty| (validator(ty), converter(ty)))
                .collect::<Vec<(Validator, Converter)>>();
            Rc::new(move |v| {
                match options.iter().find(|(validate, _)| validate(v)) {
                    Some((_, convert)) => convert(v),
                    None => Ok(v.clone()),
                }
            })
        }
        _ => Rc::new(|v| Ok(v.clone())),
    }
}

fn class_converter(class: ClassRef) -> Converter {
    Rc::new(move |v| match v {
        Value::Null => Ok(Value::Null),
        Value::Instance(_) if class.is(v) => Ok(v.clone()),
        Value::Array(items) if class.is_collection() => {
            let items = items.borrow().clone();
            model::construct(&class, Default::default(), items).map(Value::Instance)
        }
        Value::Object(record) if !class.is_collection() => {
            let record = record.borrow().clone();
            model::construct(&class, record, Vec::new()).map(Value::Instance)
        }
        other => Err(Error::Type(TypeError::element(
            class.name(),
            vec![class.name().to_string()],
            other.type_of(),
        ))),
    })
}
