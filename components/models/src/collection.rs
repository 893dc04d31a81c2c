//! Collection construction.

use crate::class::{Class, ClassRef, ElementType};
use crate::instance::Instance;
use crate::model;
use crate::value::Value;
use core_types::{Error, Result, TypeError};

/// Constructors for collections.
///
/// # Examples
///
/// ```
/// use models::{Collection, ElementType, TypeRef, Value};
///
/// let names = Collection::of(ElementType::Type(TypeRef::String));
/// let list = Collection::new(&names, ["a", "b"]).unwrap();
/// assert_eq!(list.len().unwrap(), 2);
/// assert!(list.push([Value::from(3)]).is_err());
/// ```
pub struct Collection;

impl Collection {
    /// Build a collection, piping every element.
    pub fn new<I, V>(class: &ClassRef, elements: I) -> Result<Instance>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        if !class.is_collection() {
            return Err(Error::access(format!(
                "Cannot create {}: expected a collection class",
                class.name()
            )));
        }
        let elements = elements.into_iter().map(Into::into).collect();
        model::construct(class, Default::default(), elements)
    }

    /// Build an empty collection.
    pub fn empty(class: &ClassRef) -> Result<Instance> {
        Collection::new(class, Vec::<Value>::new())
    }

    /// Build a collection from a JSON array.
    pub fn from_json(class: &ClassRef, json: &serde_json::Value) -> Result<Instance> {
        match Value::from_json(json) {
            Value::Array(items) => {
                let items = items.borrow().clone();
                Collection::new(class, items)
            }
            other => Err(TypeError::argument(
                class.name(),
                "from_json",
                vec!["Array".to_string()],
                other.type_of(),
            )
            .into()),
        }
    }

    /// An anonymous collection class with the given element type.
    pub fn of(elements: ElementType) -> ClassRef {
        let name = match &elements {
            ElementType::Any => "Collection".to_string(),
            ElementType::Type(ty) => format!("Collection<{}>", ty.name()),
            ElementType::Select(_) => "Collection<?>".to_string(),
        };
        Class::collection(name).elements(elements).build()
    }
}
