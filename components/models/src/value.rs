//! Runtime values stored in model fields and collection elements.
//!
//! Primitives are held inline. Plain records and arrays are shared by
//! reference so that identity comparison behaves the way assignment
//! coalescing expects.

use crate::instance::Instance;
use chrono::{DateTime, Utc};
use core_types::{Error, Result, Symbol};
use indexmap::IndexMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Signature of a native function value.
pub type NativeFn = dyn Fn(&[Value]) -> Result<Value>;

/// A plain record (an object that is not a model). Keys keep insertion
/// order.
pub type Record = Rc<RefCell<IndexMap<String, Value>>>;

/// A plain array (an array that is not a collection).
pub type Array = Rc<RefCell<Vec<Value>>>;

/// A callable value.
#[derive(Clone)]
pub struct Function(Rc<NativeFn>);

impl Function {
    /// Creates a new Function from a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + 'static,
    {
        Function(Rc::new(f))
    }

    /// Call the function
    pub fn call(&self, args: &[Value]) -> Result<Value> {
        (self.0)(args)
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Function) -> bool {
        std::ptr::eq(
            Rc::as_ptr(&self.0) as *const (),
            Rc::as_ptr(&other.0) as *const (),
        )
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[function]")
    }
}

/// A field or element value.
#[derive(Clone, Default)]
pub enum Value {
    /// Absent value
    #[default]
    Undefined,
    /// Explicit null
    Null,
    /// Boolean
    Boolean(bool),
    /// IEEE 754 double
    Number(f64),
    /// Text
    String(String),
    /// Unique symbol
    Symbol(Symbol),
    /// Point in time
    Date(DateTime<Utc>),
    /// Plain array
    Array(Array),
    /// Plain record
    Object(Record),
    /// Callable
    Function(Function),
    /// Model or collection instance
    Instance(Instance),
}

impl Value {
    /// Build a plain record from key/value pairs.
    pub fn record<I, K, V>(entries: I) -> Value
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect::<IndexMap<_, _>>();
        Value::Object(Rc::new(RefCell::new(map)))
    }

    /// Build a plain array.
    pub fn array<I, V>(items: I) -> Value
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let items = items.into_iter().map(Into::into).collect::<Vec<_>>();
        Value::Array(Rc::new(RefCell::new(items)))
    }

    /// Wrap a closure as a function value.
    pub fn function<F>(f: F) -> Value
    where
        F: Fn(&[Value]) -> Result<Value> + 'static,
    {
        Value::Function(Function::new(f))
    }

    /// Check if value is undefined
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    /// Check if value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrow as a string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get as a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Borrow as a model or collection instance
    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Value::Instance(instance) => Some(instance),
            _ => None,
        }
    }

    /// Borrow as a function
    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    /// The runtime kind used in validation messages.
    ///
    /// Instances report their class name.
    pub fn type_of(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Boolean(_) => "boolean".to_string(),
            Value::Number(_) => "number".to_string(),
            Value::String(_) => "string".to_string(),
            Value::Symbol(_) => "symbol".to_string(),
            Value::Date(_) => "date".to_string(),
            Value::Array(_) => "array".to_string(),
            Value::Object(_) => "object".to_string(),
            Value::Function(_) => "function".to_string(),
            Value::Instance(instance) => instance.class().name().to_string(),
        }
    }

    /// Convert parsed JSON into a value. Objects become plain records and
    /// arrays become plain arrays.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => Value::array(items.iter().map(Value::from_json)),
            serde_json::Value::Object(map) => {
                Value::record(map.iter().map(|(k, v)| (k.clone(), Value::from_json(v))))
            }
        }
    }

    /// Serialize to JSON.
    ///
    /// Values JSON cannot represent (undefined, functions, symbols) become
    /// null inside arrays and are skipped inside records. Instances
    /// enumerate their public fields; a disposed instance fails. A value
    /// that contains itself fails with a `TypeError`.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        self.to_json_within(&mut Vec::new())
    }

    /// Serialize with `open` holding the containers being serialized
    /// further up.
    pub(crate) fn to_json_within(&self, open: &mut Vec<*const ()>) -> Result<serde_json::Value> {
        Ok(match self {
            Value::Undefined | Value::Null | Value::Function(_) | Value::Symbol(_) => {
                serde_json::Value::Null
            }
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => number_to_json(*n),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Date(d) => serde_json::Value::String(d.to_rfc3339()),
            Value::Array(items) => {
                let pointer = Rc::as_ptr(items) as *const ();
                let items = items.borrow().clone();
                within(open, pointer, "Array", |open| elements_to_json(&items, open))?
            }
            Value::Object(record) => {
                let pointer = Rc::as_ptr(record) as *const ();
                let entries = record.borrow().clone();
                within(open, pointer, "Object", |open| entries_to_json(entries.iter(), open))?
            }
            Value::Instance(instance) => instance.to_json_within(open)?,
        })
    }

    pub(crate) fn is_json_skipped(&self) -> bool {
        matches!(
            self,
            Value::Undefined | Value::Function(_) | Value::Symbol(_)
        )
    }
}

/// Serialize a container whose identity is `pointer`, failing when it is
/// already open.
pub(crate) fn within<F>(
    open: &mut Vec<*const ()>,
    pointer: *const (),
    owner: &str,
    f: F,
) -> Result<serde_json::Value>
where
    F: FnOnce(&mut Vec<*const ()>) -> Result<serde_json::Value>,
{
    if open.contains(&pointer) {
        return Err(Error::Type(core_types::TypeError::circular(owner)));
    }
    open.push(pointer);
    let result = f(open);
    open.pop();
    result
}

pub(crate) fn elements_to_json(
    elements: &[Value],
    open: &mut Vec<*const ()>,
) -> Result<serde_json::Value> {
    let items = elements
        .iter()
        .map(|value| value.to_json_within(open))
        .collect::<Result<Vec<_>>>()?;
    Ok(serde_json::Value::Array(items))
}

pub(crate) fn entries_to_json<'a, I>(
    entries: I,
    open: &mut Vec<*const ()>,
) -> Result<serde_json::Value>
where
    I: Iterator<Item = (&'a String, &'a Value)>,
{
    let mut map = serde_json::Map::new();
    for (key, value) in entries {
        if value.is_json_skipped() {
            continue;
        }
        map.insert(key.clone(), value.to_json_within(open)?);
    }
    Ok(serde_json::Value::Object(map))
}

/// Integral numbers serialize as JSON integers so `json!` literals compare
/// equal.
fn number_to_json(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        serde_json::Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

/// Identity comparison used to suppress no-op assignments.
///
/// Primitives compare by value with NaN equal to itself. Records, arrays,
/// functions and instances compare by reference.
pub fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (Value::Boolean(x), Value::Boolean(y)) => x == y,
        (Value::Number(x), Value::Number(y)) => x == y || (x.is_nan() && y.is_nan()),
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Symbol(x), Value::Symbol(y)) => x == y,
        (Value::Date(x), Value::Date(y)) => x == y,
        (Value::Array(x), Value::Array(y)) => Rc::ptr_eq(x, y),
        (Value::Object(x), Value::Object(y)) => Rc::ptr_eq(x, y),
        (Value::Function(x), Value::Function(y)) => x.ptr_eq(y),
        (Value::Instance(x), Value::Instance(y)) => x.ptr_eq(y),
        _ => false,
    }
}

/// Call a function value, failing when the value is not callable.
pub(crate) fn call(value: &Value, owner: &str, name: &str, args: &[Value]) -> Result<Value> {
    match value {
        Value::Function(f) => f.call(args),
        other => Err(Error::Type(core_types::TypeError::argument(
            owner,
            name,
            vec!["Function".to_string()],
            other.type_of(),
        ))),
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        same_value(self, other)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Symbol(s) => write!(f, "{}", s),
            Value::Date(d) => write!(f, "{}", d.to_rfc3339()),
            Value::Array(items) => f.debug_list().entries(items.borrow().iter()).finish(),
            Value::Object(record) => f.debug_map().entries(record.borrow().iter()).finish(),
            Value::Function(func) => write!(f, "{:?}", func),
            Value::Instance(instance) => write!(f, "{}", instance),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<Symbol> for Value {
    fn from(s: Symbol) -> Self {
        Value::Symbol(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Value::Date(d)
    }
}

impl From<Instance> for Value {
    fn from(instance: Instance) -> Self {
        Value::Instance(instance)
    }
}

impl From<&Instance> for Value {
    fn from(instance: &Instance) -> Self {
        Value::Instance(instance.clone())
    }
}

impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Value::Function(f)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(items)))
    }
}

impl From<&serde_json::Value> for Value {
    fn from(json: &serde_json::Value) -> Self {
        Value::from_json(json)
    }
}
