//! Model construction.
//!
//! Shared by models and collections: confirm the input, allocate the
//! target, pipe the initial fields and elements, mark the instance
//! constructed, then run the construct hook.

use crate::access;
use crate::class::ClassRef;
use crate::handlers::{collection_handler, model_handler};
use crate::instance::Instance;
use crate::pipes::object_pipe;
use crate::value::Value;
use core_types::{Error, PropertyKey, Result, TypeError};
use indexmap::IndexMap;
use tracing::trace;

/// Constructors for keyed models.
///
/// # Examples
///
/// ```
/// use models::{Class, Model, TypeRef, Value};
///
/// let animal = Class::model("Animal")
///     .shape(|s| Some(s.field("name", TypeRef::String)))
///     .build();
/// let person = Class::model("Person")
///     .shape(move |s| {
///         Some(
///             s.field("name", TypeRef::String)
///                 .field("pet", TypeRef::Class(animal.clone())),
///         )
///     })
///     .build();
///
/// let jim = Model::from_json(
///     &person,
///     &serde_json::json!({ "name": "Jim", "pet": { "name": "Pretty" } }),
/// )
/// .unwrap();
/// let pet = jim.get("pet").unwrap();
/// assert_eq!(pet.as_instance().unwrap().class().name(), "Animal");
/// assert_eq!(pet.as_instance().unwrap().get("name").unwrap(), Value::from("Pretty"));
/// ```
pub struct Model;

impl Model {
    /// Build an instance of a model class from key/value pairs.
    pub fn new<I, K, V>(class: &ClassRef, record: I) -> Result<Instance>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let record = record
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect::<IndexMap<_, _>>();
        if class.is_collection() {
            return Err(Error::access(format!(
                "Cannot create {}: expected a model class",
                class.name()
            )));
        }
        construct(class, record, Vec::new())
    }

    /// Build an instance with no initial fields.
    pub fn empty(class: &ClassRef) -> Result<Instance> {
        Model::new(class, Vec::<(String, Value)>::new())
    }

    /// Build an instance from a JSON object. Nested objects and arrays are
    /// converted by the field pipeline.
    pub fn from_json(class: &ClassRef, json: &serde_json::Value) -> Result<Instance> {
        match Value::from_json(json) {
            Value::Object(record) => {
                let record = record.borrow().clone();
                Model::new(class, record)
            }
            other => Err(TypeError::argument(
                class.name(),
                "from_json",
                vec!["Object".to_string()],
                other.type_of(),
            )
            .into()),
        }
    }
}

/// Construct an instance of `class`.
pub(crate) fn construct(
    class: &ClassRef,
    record: IndexMap<String, Value>,
    elements: Vec<Value>,
) -> Result<Instance> {
    if !access::confirm(&record) {
        return Err(access::bad_constructor(class, &record));
    }
    if let Some(pipe) = object_pipe(class) {
        if let Some(undeclared) = record.keys().find(|key| !pipe.has(key)) {
            return Err(access::bad_value(class, &PropertyKey::from(undeclared)));
        }
    }
    let instance = Instance::allocate(class);
    model_handler::init(&instance, record)?;
    collection_handler::init(&instance, elements)?;
    instance.target().done();
    if let Some(hook) = class.construct_hook().cloned() {
        hook(&instance)?;
    }
    trace!(identity = %instance.id(), "constructed");
    Ok(instance)
}
