//! Per-aspect property handlers.
//!
//! [`model_handler`] covers keyed fields and the reserved names,
//! [`collection_handler`] covers `length` and element indices.

pub(crate) mod collection_handler;
pub(crate) mod model_handler;
