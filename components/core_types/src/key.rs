//! Property keys and identity generation.

use crate::Symbol;
use rand::Rng;
use std::collections::HashSet;
use std::fmt;
use std::sync::{LazyLock, Mutex};

/// Every identity handed out so far, so that none is issued twice.
static ISSUED_KEYS: LazyLock<Mutex<HashSet<String>>> = LazyLock::new(|| Mutex::new(HashSet::new()));

/// Generate a key that is unique among all keys generated in this process.
///
/// The key is the prefix followed by nine random digits. On the (unlikely)
/// collision a new suffix is drawn.
///
/// # Examples
///
/// ```
/// use core_types::generate_key;
///
/// let a = generate_key("Person");
/// let b = generate_key("Person");
/// assert!(a.starts_with("Person"));
/// assert_eq!(a.len(), "Person".len() + 9);
/// assert_ne!(a, b);
/// ```
pub fn generate_key(prefix: &str) -> String {
    let mut issued = ISSUED_KEYS.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let mut rng = rand::thread_rng();
    loop {
        let key = format!("{}{:09}", prefix, rng.gen_range(0..1_000_000_000u32));
        if issued.insert(key.clone()) {
            return key;
        }
    }
}

/// A property key: either a name or a symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    /// Textual property name
    Name(String),
    /// Symbol key
    Symbol(Symbol),
}

impl PropertyKey {
    /// The name, unless this is a symbol
    pub fn as_name(&self) -> Option<&str> {
        match self {
            PropertyKey::Name(name) => Some(name),
            PropertyKey::Symbol(_) => None,
        }
    }

    /// Is this a symbol key?
    pub fn is_symbol(&self) -> bool {
        matches!(self, PropertyKey::Symbol(_))
    }
}

impl From<&str> for PropertyKey {
    fn from(name: &str) -> Self {
        PropertyKey::Name(name.to_string())
    }
}

impl From<&String> for PropertyKey {
    fn from(name: &String) -> Self {
        PropertyKey::Name(name.clone())
    }
}

impl From<String> for PropertyKey {
    fn from(name: String) -> Self {
        PropertyKey::Name(name)
    }
}

impl From<usize> for PropertyKey {
    fn from(index: usize) -> Self {
        PropertyKey::Name(index.to_string())
    }
}

impl From<Symbol> for PropertyKey {
    fn from(symbol: Symbol) -> Self {
        PropertyKey::Symbol(symbol)
    }
}

impl From<&Symbol> for PropertyKey {
    fn from(symbol: &Symbol) -> Self {
        PropertyKey::Symbol(symbol.clone())
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKey::Name(name) => write!(f, "{}", name),
            PropertyKey::Symbol(symbol) => write!(f, "{}", symbol),
        }
    }
}
