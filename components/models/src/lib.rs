//! Reactive models and collections.
//!
//! Models are keyed objects whose every property operation is intercepted:
//! assignments are validated and converted against a declared shape,
//! nested plain data is upgraded into typed instances, and reads and writes
//! are reported to observers in coalesced batches on a later tick.
//! Collections add an ordered element sequence with its own element type.
//!
//! # Overview
//!
//! - [`Class`] / [`ClassBuilder`] - declare shapes, element types, hooks
//! - [`Model`] / [`Collection`] - construct instances
//! - [`Instance`] - the intercepted handle
//! - [`Observer`] / [`ObserverHandler`] - receive notifications
//! - [`tick`] / [`frame`] - drive delivery on this thread's event loop
//!
//! # Examples
//!
//! ```
//! use models::{Class, Model, TypeRef, Value};
//!
//! let person = Class::model("Person")
//!     .shape(|s| Some(s.field("name", TypeRef::String).field("age", TypeRef::Number)))
//!     .build();
//!
//! let jim = Model::new(&person, [("name", Value::from("Jim")), ("age", Value::from(23))]).unwrap();
//! assert_eq!(jim.get("name").unwrap(), Value::from("Jim"));
//!
//! let error = jim.set("badField", 1).unwrap_err();
//! assert!(error.mentions("cannot assign"));
//!
//! let error = jim.set("age", "old").unwrap_err();
//! assert_eq!(error.to_string(), "TypeError: Bad assignment to Person.age: Expected Number, got string.");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod access;
pub mod class;
pub mod collection;
pub mod config;
mod handlers;
pub mod instance;
pub mod model;
pub mod observers;
mod pipes;
pub mod proxy;
mod target;
pub mod value;

pub use class::{
    Accessor, Class, ClassBuilder, ClassId, ClassKind, ClassRef, ElementType, Shape, TypeRef,
};
pub use collection::Collection;
pub use config::{configure, Config, ConfigError};
pub use core_types::{AccessError, Error, ErrorKind, PropertyKey, Result, Symbol, TypeError};
pub use instance::{Instance, WeakInstance};
pub use model::Model;
pub use observers::{
    add_global_observer, flush, frame, remove_global_observer, set_scheduler, tick, Observer,
    ObserverHandler,
};
pub use proxy::PropertyDescriptor;
pub use value::{same_value, Function, Value};
