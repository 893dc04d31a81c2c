//! Model and collection classes.
//!
//! A [`Class`] plays the part of a constructor: it names the type, points
//! at its parent, and carries the declarations the type pipeline and the
//! interception layer consult. Classes are built once with a
//! [`ClassBuilder`] and shared as [`ClassRef`].
//!
//! # Examples
//!
//! ```
//! use models::{Class, TypeRef};
//!
//! let person = Class::model("Person")
//!     .shape(|shape| Some(shape.field("name", TypeRef::String).field("age", TypeRef::Number)))
//!     .build();
//! assert_eq!(person.name(), "Person");
//! assert!(!person.is_collection());
//! ```

use crate::instance::Instance;
use crate::value::Value;
use core_types::Result;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::LazyLock;

static CLASS_COUNTER: AtomicU64 = AtomicU64::new(1);

static NAME_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\$+)\d+$").expect("valid regex"));

/// Shared handle to a class.
pub type ClassRef = Rc<Class>;

/// Shape declaration: receives the inherited shape and returns the full
/// shape for this class, or `None` to opt out of typing altogether.
pub type ShapeDeclaration = Rc<dyn Fn(Shape) -> Option<Shape>>;
/// Computed property getter.
pub type Getter = Rc<dyn Fn(&Instance) -> Result<Value>>;
/// Computed property setter.
pub type Setter = Rc<dyn Fn(&Instance, Value) -> Result<()>>;
/// Instance method. The instance is the receiver.
pub type Method = Rc<dyn Fn(&Instance, &[Value]) -> Result<Value>>;
/// Lifecycle hook.
pub type Hook = Rc<dyn Fn(&Instance) -> Result<()>>;
/// Fallback read for undefined fields. `Ok(None)` means "not handled".
pub type UniversalGetter = Rc<dyn Fn(&Instance, &str) -> Result<Option<Value>>>;
/// Fallback write. `Ok(true)` claims the assignment.
pub type UniversalSetter = Rc<dyn Fn(&Instance, &str, &Value) -> Result<bool>>;
/// Picks an element type per input value.
pub type Selector = Rc<dyn Fn(&Value) -> TypeRef>;
/// Reads reported to an observing instance: `(observer, observed, name)`.
pub type PeekHook = Rc<dyn Fn(&Instance, &Instance, &str) -> Result<()>>;
/// Writes reported to an observing instance:
/// `(observer, observed, name, new, old)`.
pub type PokeHook = Rc<dyn Fn(&Instance, &Instance, &str, &Value, &Value) -> Result<()>>;
/// Element changes reported to an observing instance:
/// `(observer, collection, added, removed)`.
pub type SpliceHook = Rc<dyn Fn(&Instance, &Instance, &[Value], &[Value]) -> Result<()>>;

/// Unique class identity, used to key memoized pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassId(u64);

/// Whether instances carry elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    /// Keyed fields only
    Model,
    /// Keyed fields plus an ordered element sequence
    Collection,
}

/// A declared field type.
#[derive(Clone)]
pub enum TypeRef {
    /// Text
    String,
    /// Number
    Number,
    /// Boolean
    Boolean,
    /// Plain record or model
    Object,
    /// Plain array or collection
    Array,
    /// Callable
    Function,
    /// Date
    Date,
    /// Symbol
    Symbol,
    /// A model or collection class
    Class(ClassRef),
    /// Any of several types, tried in order
    OneOf(Vec<TypeRef>),
}

impl TypeRef {
    /// Names of the accepted types, flattening unions.
    pub fn names(&self) -> Vec<String> {
        match self {
            TypeRef::OneOf(types) => types.iter().flat_map(TypeRef::names).collect(),
            TypeRef::Class(class) => vec![class.name().to_string()],
            TypeRef::String => vec!["String".to_string()],
            TypeRef::Number => vec!["Number".to_string()],
            TypeRef::Boolean => vec!["Boolean".to_string()],
            TypeRef::Object => vec!["Object".to_string()],
            TypeRef::Array => vec!["Array".to_string()],
            TypeRef::Function => vec!["Function".to_string()],
            TypeRef::Date => vec!["Date".to_string()],
            TypeRef::Symbol => vec!["Symbol".to_string()],
        }
    }

    /// Display name, `A|B` for unions.
    pub fn name(&self) -> String {
        self.names().join("|")
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl From<&ClassRef> for TypeRef {
    fn from(class: &ClassRef) -> Self {
        TypeRef::Class(class.clone())
    }
}

/// Element declaration of a collection class.
#[derive(Clone)]
pub enum ElementType {
    /// Elements pass through untouched
    Any,
    /// Every element is validated and converted against one type
    Type(TypeRef),
    /// The type is chosen per element; the selector must return a class
    Select(Selector),
}

impl fmt::Debug for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementType::Any => write!(f, "Any"),
            ElementType::Type(t) => write!(f, "Type({:?})", t),
            ElementType::Select(_) => write!(f, "Select(<function>)"),
        }
    }
}

/// Field name to type mapping.
#[derive(Clone, Default, Debug)]
pub struct Shape {
    fields: BTreeMap<String, TypeRef>,
}

impl Shape {
    /// Creates a new empty shape.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare (or redeclare) a field.
    pub fn field(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.fields.insert(name.into(), ty);
        self
    }

    /// Drop an inherited field.
    pub fn without(mut self, name: &str) -> Self {
        self.fields.remove(name);
        self
    }

    /// Look up a field type
    pub fn get(&self, name: &str) -> Option<&TypeRef> {
        self.fields.get(name)
    }

    /// Check if a field is declared
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Iterate declared fields in name order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &TypeRef)> {
        self.fields.iter()
    }

    /// Number of declared fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if no field is declared
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Computed property.
#[derive(Clone, Default)]
pub struct Accessor {
    /// Read side
    pub get: Option<Getter>,
    /// Write side
    pub set: Option<Setter>,
}

/// A model or collection class.
pub struct Class {
    id: ClassId,
    name: String,
    kind: ClassKind,
    parent: Option<ClassRef>,
    shape: Option<ShapeDeclaration>,
    elements: Option<ElementType>,
    accessors: HashMap<String, Accessor>,
    methods: HashMap<String, Method>,
    on_construct: Option<Hook>,
    on_destruct: Option<Hook>,
    on_peek: Option<PeekHook>,
    on_poke: Option<PokeHook>,
    on_splice: Option<SpliceHook>,
    universal_get: Option<UniversalGetter>,
    universal_set: Option<UniversalSetter>,
    observable: Option<bool>,
}

thread_local! {
    static BASE_MODEL: ClassRef = ClassBuilder::root("Model", ClassKind::Model).build();
    static BASE_COLLECTION: ClassRef = {
        let mut builder = ClassBuilder::root("Collection", ClassKind::Collection);
        builder.elements = Some(ElementType::Any);
        builder.build()
    };
}

impl Class {
    /// Start a model class extending the base `Model`.
    pub fn model(name: impl Into<String>) -> ClassBuilder {
        ClassBuilder::extending(&Class::base_model(), name)
    }

    /// Start a collection class extending the base `Collection`.
    pub fn collection(name: impl Into<String>) -> ClassBuilder {
        ClassBuilder::extending(&Class::base_collection(), name)
    }

    /// Start a subclass of `parent`.
    pub fn extend(parent: &ClassRef, name: impl Into<String>) -> ClassBuilder {
        ClassBuilder::extending(parent, name)
    }

    /// The untyped root of every model class.
    pub fn base_model() -> ClassRef {
        BASE_MODEL.with(Rc::clone)
    }

    /// The root of every collection class. Its elements are untyped.
    pub fn base_collection() -> ClassRef {
        BASE_COLLECTION.with(Rc::clone)
    }

    /// Unique class id
    pub fn id(&self) -> ClassId {
        self.id
    }

    /// Declared class name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name with any `$N` disambiguation suffix removed, used as the prefix
    /// of instance identities.
    pub fn display_name(&self) -> String {
        NAME_SUFFIX.replace(&self.name, "").into_owned()
    }

    /// Model or collection
    pub fn kind(&self) -> ClassKind {
        self.kind
    }

    /// Check if instances carry elements
    pub fn is_collection(&self) -> bool {
        self.kind == ClassKind::Collection
    }

    /// Parent class, `None` for the two roots
    pub fn parent(&self) -> Option<&ClassRef> {
        self.parent.as_ref()
    }

    pub(crate) fn shape_declaration(&self) -> Option<&ShapeDeclaration> {
        self.shape.as_ref()
    }

    pub(crate) fn element_declaration(&self) -> Option<&ElementType> {
        self.elements.as_ref()
    }

    /// Check if this class is `other` or inherits from it.
    pub fn descends_from(&self, other: &Class) -> bool {
        let mut current = Some(self);
        while let Some(class) = current {
            if class.id == other.id {
                return true;
            }
            current = class.parent.as_deref();
        }
        false
    }

    /// Check if `value` is an instance of this class or a subclass.
    pub fn is(&self, value: &Value) -> bool {
        match value {
            Value::Instance(instance) => instance.class().descends_from(self),
            _ => false,
        }
    }

    /// The inheritance chain, root first, ending with this class.
    pub fn ancestors(self: &Rc<Self>) -> Vec<ClassRef> {
        let mut chain = vec![self.clone()];
        let mut current = self.parent.clone();
        while let Some(class) = current {
            current = class.parent.clone();
            chain.push(class);
        }
        chain.reverse();
        chain
    }

    fn lookup<T>(&self, pick: impl Fn(&Class) -> Option<&T>) -> Option<&T> {
        let mut current = Some(self);
        while let Some(class) = current {
            if let Some(found) = pick(class) {
                return Some(found);
            }
            current = class.parent.as_deref();
        }
        None
    }

    /// Nearest accessor named `name` along the chain
    pub fn find_accessor(&self, name: &str) -> Option<&Accessor> {
        self.lookup(|c| c.accessors.get(name))
    }

    /// Nearest method named `name` along the chain
    pub fn find_method(&self, name: &str) -> Option<&Method> {
        self.lookup(|c| c.methods.get(name))
    }

    pub(crate) fn construct_hook(&self) -> Option<&Hook> {
        self.lookup(|c| c.on_construct.as_ref())
    }

    pub(crate) fn destruct_hook(&self) -> Option<&Hook> {
        self.lookup(|c| c.on_destruct.as_ref())
    }

    pub(crate) fn peek_hook(&self) -> Option<&PeekHook> {
        self.lookup(|c| c.on_peek.as_ref())
    }

    pub(crate) fn poke_hook(&self) -> Option<&PokeHook> {
        self.lookup(|c| c.on_poke.as_ref())
    }

    pub(crate) fn splice_hook(&self) -> Option<&SpliceHook> {
        self.lookup(|c| c.on_splice.as_ref())
    }

    pub(crate) fn universal_getter(&self) -> Option<&UniversalGetter> {
        self.lookup(|c| c.universal_get.as_ref())
    }

    pub(crate) fn universal_setter(&self) -> Option<&UniversalSetter> {
        self.lookup(|c| c.universal_set.as_ref())
    }

    /// Whether instances participate in observation. Inherited; defaults to
    /// true.
    pub fn is_observable(&self) -> bool {
        self.lookup(|c| c.observable.as_ref()).copied().unwrap_or(true)
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("parent", &self.parent.as_ref().map(|p| p.name.clone()))
            .finish()
    }
}

/// Builder for [`Class`].
pub struct ClassBuilder {
    name: String,
    kind: ClassKind,
    parent: Option<ClassRef>,
    shape: Option<ShapeDeclaration>,
    elements: Option<ElementType>,
    accessors: HashMap<String, Accessor>,
    methods: HashMap<String, Method>,
    on_construct: Option<Hook>,
    on_destruct: Option<Hook>,
    on_peek: Option<PeekHook>,
    on_poke: Option<PokeHook>,
    on_splice: Option<SpliceHook>,
    universal_get: Option<UniversalGetter>,
    universal_set: Option<UniversalSetter>,
    observable: Option<bool>,
}

impl ClassBuilder {
    fn root(name: &str, kind: ClassKind) -> Self {
        ClassBuilder {
            name: name.to_string(),
            kind,
            parent: None,
            shape: None,
            elements: None,
            accessors: HashMap::new(),
            methods: HashMap::new(),
            on_construct: None,
            on_destruct: None,
            on_peek: None,
            on_poke: None,
            on_splice: None,
            universal_get: None,
            universal_set: None,
            observable: None,
        }
    }

    fn extending(parent: &ClassRef, name: impl Into<String>) -> Self {
        let mut builder = ClassBuilder::root("", parent.kind);
        builder.name = name.into();
        builder.parent = Some(parent.clone());
        builder
    }

    /// Declare the field shape. The closure receives the inherited shape.
    pub fn shape<F>(mut self, declare: F) -> Self
    where
        F: Fn(Shape) -> Option<Shape> + 'static,
    {
        self.shape = Some(Rc::new(declare));
        self
    }

    /// Declare the element type of a collection.
    pub fn elements(mut self, elements: ElementType) -> Self {
        self.elements = Some(elements);
        self
    }

    /// Shorthand for `elements(ElementType::Type(TypeRef::Class(..)))`.
    pub fn of(self, class: &ClassRef) -> Self {
        self.elements(ElementType::Type(TypeRef::Class(class.clone())))
    }

    /// Shorthand for a selector element declaration.
    pub fn select<F>(self, selector: F) -> Self
    where
        F: Fn(&Value) -> TypeRef + 'static,
    {
        self.elements(ElementType::Select(Rc::new(selector)))
    }

    /// Add the read side of a computed property.
    pub fn getter<F>(mut self, name: impl Into<String>, get: F) -> Self
    where
        F: Fn(&Instance) -> Result<Value> + 'static,
    {
        self.accessors.entry(name.into()).or_default().get = Some(Rc::new(get));
        self
    }

    /// Add the write side of a computed property.
    pub fn setter<F>(mut self, name: impl Into<String>, set: F) -> Self
    where
        F: Fn(&Instance, Value) -> Result<()> + 'static,
    {
        self.accessors.entry(name.into()).or_default().set = Some(Rc::new(set));
        self
    }

    /// Add a method.
    pub fn method<F>(mut self, name: impl Into<String>, method: F) -> Self
    where
        F: Fn(&Instance, &[Value]) -> Result<Value> + 'static,
    {
        self.methods.insert(name.into(), Rc::new(method));
        self
    }

    /// Called once the instance is constructed.
    pub fn on_construct<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Instance) -> Result<()> + 'static,
    {
        self.on_construct = Some(Rc::new(hook));
        self
    }

    /// Called once when the instance is disposed.
    pub fn on_destruct<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Instance) -> Result<()> + 'static,
    {
        self.on_destruct = Some(Rc::new(hook));
        self
    }

    /// Receive reads when instances of this class observe something,
    /// themselves included.
    pub fn on_peek<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Instance, &Instance, &str) -> Result<()> + 'static,
    {
        self.on_peek = Some(Rc::new(hook));
        self
    }

    /// Receive writes. Self observers also see private fields.
    pub fn on_poke<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Instance, &Instance, &str, &Value, &Value) -> Result<()> + 'static,
    {
        self.on_poke = Some(Rc::new(hook));
        self
    }

    /// Receive element changes.
    pub fn on_splice<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Instance, &Instance, &[Value], &[Value]) -> Result<()> + 'static,
    {
        self.on_splice = Some(Rc::new(hook));
        self
    }

    /// Fallback for reads of undefined fields.
    pub fn universal_getter<F>(mut self, get: F) -> Self
    where
        F: Fn(&Instance, &str) -> Result<Option<Value>> + 'static,
    {
        self.universal_get = Some(Rc::new(get));
        self
    }

    /// Fallback for writes; returning true claims the assignment.
    pub fn universal_setter<F>(mut self, set: F) -> Self
    where
        F: Fn(&Instance, &str, &Value) -> Result<bool> + 'static,
    {
        self.universal_set = Some(Rc::new(set));
        self
    }

    /// Opt in or out of observation.
    pub fn observable(mut self, observable: bool) -> Self {
        self.observable = Some(observable);
        self
    }

    /// Finish the class.
    pub fn build(self) -> ClassRef {
        Rc::new(Class {
            id: ClassId(CLASS_COUNTER.fetch_add(1, Ordering::Relaxed)),
            name: self.name,
            kind: self.kind,
            parent: self.parent,
            shape: self.shape,
            elements: self.elements,
            accessors: self.accessors,
            methods: self.methods,
            on_construct: self.on_construct,
            on_destruct: self.on_destruct,
            on_peek: self.on_peek,
            on_poke: self.on_poke,
            on_splice: self.on_splice,
            universal_get: self.universal_get,
            universal_set: self.universal_set,
            observable: self.observable,
        })
    }
}
