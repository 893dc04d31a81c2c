//! Symbol property keys.
//!
//! Symbols are unique, non-textual keys. The engine stores symbol-keyed
//! properties with the private and privileged ones, never enumerates them and
//! never reports them to observers.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Global counter for generating unique symbol IDs
static SYMBOL_COUNTER: AtomicU64 = AtomicU64::new(1);

/// A unique symbol.
///
/// Each symbol has a unique internal ID and an optional description for
/// debugging. Two symbols are equal only if they are the same symbol.
///
/// # Examples
///
/// ```
/// use core_types::Symbol;
///
/// let a = Symbol::new(Some("secret"));
/// let b = Symbol::new(Some("secret"));
/// assert_ne!(a, b);
/// assert_eq!(a, a.clone());
/// ```
#[derive(Debug, Clone)]
pub struct Symbol {
    id: u64,
    description: Option<String>,
}

impl Symbol {
    /// Create a new unique symbol with optional description
    pub fn new(description: Option<&str>) -> Self {
        let id = SYMBOL_COUNTER.fetch_add(1, Ordering::SeqCst);
        Symbol {
            id,
            description: description.map(str::to_string),
        }
    }

    /// Get the unique ID of this symbol
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Get the description of this symbol
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Symbol {}

impl std::hash::Hash for Symbol {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.description {
            Some(desc) if !desc.is_empty() => write!(f, "Symbol({})", desc),
            _ => write!(f, "Symbol()"),
        }
    }
}
