//! Type pipeline.
//!
//! Turns declared shapes and element types into validate-then-convert
//! functions. Pipelines are built once per class and memoized for the
//! lifetime of the thread.

mod array_pipe;
mod converters;
mod object_pipe;
mod validators;

pub(crate) use array_pipe::{array_pipe, ArrayPipe};
pub(crate) use object_pipe::{object_pipe, ObjectPipe};
