//! Element pipelines for collection classes.

use super::converters::{converter, Converter};
use super::validators::{validator, Validator};
use crate::class::{ClassId, ClassRef, ElementType, Selector, TypeRef};
use crate::value::Value;
use core_types::{Error, Result, TypeError};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

thread_local! {
    static PIPES: RefCell<HashMap<ClassId, Rc<ArrayPipe>>> = RefCell::new(HashMap::new());
}

/// Validate-then-convert for elements written into a collection.
pub(crate) enum ArrayPipe {
    /// Untyped elements
    Identity,
    /// One declared element type
    Typed {
        class: ClassRef,
        expected: Vec<String>,
        validate: Validator,
        convert: Converter,
    },
    /// Element type chosen per value
    Select { class: ClassRef, selector: Selector },
}

impl ArrayPipe {
    /// Validate and convert one element.
    pub(crate) fn pipe(&self, value: &Value) -> Result<Value> {
        match self {
            ArrayPipe::Identity => Ok(value.clone()),
            ArrayPipe::Typed {
                class,
                expected,
                validate,
                convert,
            } => {
                if !validate(value) {
                    return Err(Error::Type(TypeError::element(
                        class.name(),
                        expected.clone(),
                        value.type_of(),
                    )));
                }
                convert(value)
            }
            ArrayPipe::Select { class, selector } => match selector(value) {
                ty @ TypeRef::Class(_) => {
                    if !validator(&ty)(value) {
                        return Err(Error::Type(TypeError::element(
                            class.name(),
                            ty.names(),
                            value.type_of(),
                        )));
                    }
                    converter(&ty)(value)
                }
                other => Err(Error::Type(TypeError::declaration(
                    class.name(),
                    "select",
                    vec!["Model".to_string(), "Collection".to_string()],
                    other.name(),
                ))),
            },
        }
    }

    /// Pipe a batch, stopping at the first failure.
    pub(crate) fn pipe_all(&self, values: &[Value]) -> Result<Vec<Value>> {
        values.iter().map(|value| self.pipe(value)).collect()
    }
}

/// The element pipeline of a collection class: the nearest element
/// declaration along the chain.
pub(crate) fn array_pipe(class: &ClassRef) -> Result<Rc<ArrayPipe>> {
    if let Some(found) = PIPES.with(|p| p.borrow().get(&class.id()).cloned()) {
        return Ok(found);
    }
    let declaration = class
        .ancestors()
        .iter()
        .rev()
        .find_map(|c| c.element_declaration().cloned());
    let pipe = match declaration {
        Some(ElementType::Any) => ArrayPipe::Identity,
        Some(ElementType::Type(ty)) => ArrayPipe::Typed {
            class: class.clone(),
            expected: ty.names(),
            validate: validator(&ty),
            convert: converter(&ty),
        },
        Some(ElementType::Select(selector)) => ArrayPipe::Select {
            class: class.clone(),
            selector,
        },
        None => {
            return Err(Error::Type(TypeError::declaration(
                class.name(),
                "elements",
                vec!["ElementType".to_string()],
                "undefined",
            )))
        }
    };
    let pipe = Rc::new(pipe);
    PIPES.with(|p| p.borrow_mut().insert(class.id(), pipe.clone()));
    Ok(pipe)
}
