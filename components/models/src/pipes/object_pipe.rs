//! Field pipelines for model classes.

use super::converters::{converter, Converter};
use super::validators::{validator, Validator};
use crate::access;
use crate::class::{ClassId, ClassRef, Shape};
use crate::value::Value;
use core_types::{Error, PropertyKey, Result, TypeError};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::trace;

/// Result of folding shape declarations down the inheritance chain.
#[derive(Clone)]
enum Mapping {
    /// No class in the chain declared a shape
    Undeclared,
    /// Some class opted out; typing is off for it and its descendants
    Untyped,
    /// The effective shape
    Shape(Shape),
}

thread_local! {
    static MAPPINGS: RefCell<HashMap<ClassId, Mapping>> = RefCell::new(HashMap::new());
    static PIPES: RefCell<HashMap<ClassId, Option<Rc<ObjectPipe>>>> = RefCell::new(HashMap::new());
}

struct FieldPipe {
    expected: Vec<String>,
    validate: Validator,
    convert: Converter,
}

/// Validate-then-convert functions for every declared field of a class.
pub(crate) struct ObjectPipe {
    class: ClassRef,
    fields: HashMap<String, FieldPipe>,
}

impl ObjectPipe {
    /// Check if `name` is declared
    pub(crate) fn has(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Validate and convert a value assigned to `name`.
    pub(crate) fn pipe(&self, name: &str, value: &Value) -> Result<Value> {
        let field = self
            .fields
            .get(name)
            .ok_or_else(|| access::bad_value(&self.class, &PropertyKey::from(name)))?;
        if !(field.validate)(value) {
            return Err(Error::Type(TypeError::assignment(
                self.class.name(),
                name,
                field.expected.clone(),
                value.type_of(),
            )));
        }
        (field.convert)(value)
    }
}

fn mapping(class: &ClassRef) -> Mapping {
    if let Some(found) = MAPPINGS.with(|m| m.borrow().get(&class.id()).cloned()) {
        return found;
    }
    let inherited = match class.parent() {
        Some(parent) => mapping(parent),
        None => Mapping::Undeclared,
    };
    let resolved = match (inherited, class.shape_declaration()) {
        (Mapping::Untyped, _) => Mapping::Untyped,
        (inherited, Some(declare)) => {
            let base = match inherited {
                Mapping::Shape(shape) => shape,
                _ => Shape::new(),
            };
            match declare(base) {
                Some(shape) => Mapping::Shape(shape),
                None => Mapping::Untyped,
            }
        }
        (inherited, None) => inherited,
    };
    MAPPINGS.with(|m| m.borrow_mut().insert(class.id(), resolved.clone()));
    resolved
}

/// The field pipeline of `class`, or `None` when the class is untyped.
pub(crate) fn object_pipe(class: &ClassRef) -> Option<Rc<ObjectPipe>> {
    if let Some(found) = PIPES.with(|p| p.borrow().get(&class.id()).cloned()) {
        return found;
    }
    let pipe = match mapping(class) {
        Mapping::Shape(shape) => {
            let fields = shape
                .iter()
                .map(|(name, ty)| {
                    let field = FieldPipe {
                        expected: ty.names(),
                        validate: validator(ty),
                        convert: converter(ty),
                    };
                    (name.clone(), field)
                })
                .collect();
            trace!(class = class.name(), fields = shape.len(), "built object pipe");
            Some(Rc::new(ObjectPipe {
                class: class.clone(),
                fields,
            }))
        }
        Mapping::Undeclared | Mapping::Untyped => None,
    };
    PIPES.with(|p| p.borrow_mut().insert(class.id(), pipe.clone()));
    pipe
}
