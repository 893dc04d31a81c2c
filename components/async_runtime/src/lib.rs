//! Host scheduling for deferred work.
//!
//! The model engine does everything synchronously except notification
//! delivery, which it defers to a later turn of the host's task queue. This
//! crate is that host:
//! - [`Scheduler`] - the `request_tick` / `cancel_tick` contract
//! - [`EventLoop`] - a single-threaded loop with an immediate-timer lane and
//!   a frame-aligned lane
//! - [`TaskQueue`] - FIFO of cancellable [`Task`]s
//!
//! # Examples
//!
//! ```
//! use async_runtime::{EventLoop, Scheduler, Task, TickMode};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let event_loop = EventLoop::with_mode(TickMode::Immediate);
//! let runs = Rc::new(Cell::new(0));
//!
//! let r = runs.clone();
//! let first = event_loop.request_tick(Task::new(move || {
//!     r.set(r.get() + 1);
//!     Ok(())
//! }));
//! assert!(event_loop.cancel_tick(first));
//!
//! let r = runs.clone();
//! event_loop.request_tick(Task::new(move || {
//!     r.set(r.get() + 10);
//!     Ok(())
//! }));
//!
//! event_loop.run_until_done().unwrap();
//! assert_eq!(runs.get(), 10);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod event_loop;
pub mod scheduler;
pub mod task_queue;

// Re-export main types at crate root
pub use event_loop::EventLoop;
pub use scheduler::{Scheduler, TickId, TickMode};
pub use task_queue::{Task, TaskQueue};
