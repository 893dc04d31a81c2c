//! Foundational types for the reactive model engine.
//!
//! This crate provides the pieces every other component agrees on: the error
//! taxonomy, symbols, property keys and the generator for instance identities.
//!
//! # Overview
//!
//! - [`Error`] - Every failure the engine reports
//! - [`AccessError`] - Illegal property access or definition
//! - [`TypeError`] - Validation or conversion failure in a type pipeline
//! - [`PropertyKey`] - A property name or a symbol
//! - [`Symbol`] - Unique, non-textual property key
//! - [`generate_key`] - Process-unique identity strings
//!
//! # Examples
//!
//! ```
//! use core_types::{Error, ErrorKind, PropertyKey};
//!
//! let error = Error::access("Cannot assign to Person.badField");
//! assert_eq!(error.kind(), ErrorKind::AccessError);
//! assert!(error.to_string().contains("Cannot assign"));
//!
//! let key = PropertyKey::from("_secret");
//! assert_eq!(key.as_name(), Some("_secret"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod key;
mod symbol;

pub use error::{AccessError, Error, ErrorKind, Result, TypeError};
pub use key::{generate_key, PropertyKey};
pub use symbol::Symbol;
