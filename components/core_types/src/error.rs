//! Error taxonomy for the model engine.
//!
//! Two families of failure exist: access errors (reserved-name collisions,
//! readonly or locked violations, touching a disposed instance, observing an
//! unobservable one) and type errors (a value failed validation or conversion
//! in a pipeline, or a declared shape is malformed). Observers may also fail
//! while notifications are delivered.

use thiserror::Error as ThisError;

/// The kind of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Illegal property access or definition
    AccessError,
    /// Pipeline validation or conversion failure
    TypeError,
    /// An observer callback failed during notification delivery
    ObserverError,
}

impl ErrorKind {
    /// Get the error name as a string
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::AccessError => "AccessError",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::ObserverError => "ObserverError",
        }
    }
}

/// Illegal property access or definition.
///
/// # Examples
///
/// ```
/// use core_types::AccessError;
///
/// let error = AccessError::new("Cannot redefine Person.name");
/// assert_eq!(error.to_string(), "AccessError: Cannot redefine Person.name");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
#[error("AccessError: {message}")]
pub struct AccessError {
    /// Human-readable error message
    pub message: String,
}

impl AccessError {
    /// Create a new access error
    pub fn new(message: impl Into<String>) -> Self {
        AccessError {
            message: message.into(),
        }
    }
}

/// A value failed validation or conversion.
///
/// Carries enough context to say which type and field rejected which kind
/// of value.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
#[error("TypeError: {message}")]
pub struct TypeError {
    /// Name of the type that owns the pipeline
    pub owner: String,
    /// Field that rejected the value (`None` for collection elements)
    pub field: Option<String>,
    /// Names of the accepted types
    pub expected: Vec<String>,
    /// Runtime kind of the offending value
    pub actual: String,
    /// Human-readable error message
    pub message: String,
}

impl TypeError {
    /// Bad assignment to a declared field.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_types::TypeError;
    ///
    /// let error = TypeError::assignment("Person", "age", vec!["Number".into()], "string");
    /// assert_eq!(
    ///     error.message,
    ///     "Bad assignment to Person.age: Expected Number, got string."
    /// );
    /// ```
    pub fn assignment(
        owner: impl Into<String>,
        field: impl Into<String>,
        expected: Vec<String>,
        actual: impl Into<String>,
    ) -> Self {
        let (owner, field, actual) = (owner.into(), field.into(), actual.into());
        let message = format!(
            "Bad assignment to {}.{}: Expected {}, got {}.",
            owner,
            field,
            expected.join("|"),
            actual
        );
        TypeError {
            owner,
            field: Some(field),
            expected,
            actual,
            message,
        }
    }

    /// Bad element inserted into a collection.
    pub fn element(owner: impl Into<String>, expected: Vec<String>, actual: impl Into<String>) -> Self {
        let (owner, actual) = (owner.into(), actual.into());
        let message = format!(
            "Bad input for {}: Expected {}, got {}.",
            owner,
            expected.join("|"),
            actual
        );
        TypeError {
            owner,
            field: None,
            expected,
            actual,
            message,
        }
    }

    /// Bad argument passed to an operation.
    pub fn argument(
        owner: impl Into<String>,
        operation: impl Into<String>,
        expected: Vec<String>,
        actual: impl Into<String>,
    ) -> Self {
        let (owner, operation, actual) = (owner.into(), operation.into(), actual.into());
        let message = format!(
            "Bad argument to {}.{}: Expected {}, got {}.",
            owner,
            operation,
            expected.join("|"),
            actual
        );
        TypeError {
            owner,
            field: Some(operation),
            expected,
            actual,
            message,
        }
    }

    /// A value contains itself and has no JSON form.
    pub fn circular(owner: impl Into<String>) -> Self {
        let owner = owner.into();
        let message = format!("Converting circular structure to JSON: {} contains itself", owner);
        TypeError {
            owner,
            field: None,
            expected: Vec::new(),
            actual: "circular".to_string(),
            message,
        }
    }

    /// A declaration returned something the pipeline cannot use.
    pub fn declaration(
        owner: impl Into<String>,
        declaration: &str,
        expected: Vec<String>,
        actual: impl Into<String>,
    ) -> Self {
        let (owner, actual) = (owner.into(), actual.into());
        let message = format!(
            "{}.{}() returned {}, expected {}",
            owner,
            declaration,
            actual,
            expected.join("|")
        );
        TypeError {
            owner,
            field: None,
            expected,
            actual,
            message,
        }
    }
}

/// Every failure the engine reports.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum Error {
    /// Illegal property access or definition
    #[error(transparent)]
    Access(#[from] AccessError),
    /// Pipeline validation or conversion failure
    #[error(transparent)]
    Type(#[from] TypeError),
    /// An observer callback failed
    #[error("ObserverError: {0}")]
    Observer(String),
}

impl Error {
    /// Create an access error
    pub fn access(message: impl Into<String>) -> Self {
        Error::Access(AccessError::new(message))
    }

    /// Create an observer failure
    pub fn observer(message: impl Into<String>) -> Self {
        Error::Observer(message.into())
    }

    /// The kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Access(_) => ErrorKind::AccessError,
            Error::Type(_) => ErrorKind::TypeError,
            Error::Observer(_) => ErrorKind::ObserverError,
        }
    }

    /// The message without the kind prefix
    pub fn message(&self) -> &str {
        match self {
            Error::Access(e) => &e.message,
            Error::Type(e) => &e.message,
            Error::Observer(message) => message,
        }
    }

    /// Case-insensitive check against the message, handy when matching on
    /// fragments like "cannot assign".
    pub fn mentions(&self, fragment: &str) -> bool {
        self.message()
            .to_lowercase()
            .contains(&fragment.to_lowercase())
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, Error>;
