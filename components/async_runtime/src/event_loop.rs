//! Event loop implementation.
//!
//! The loop owns two lanes. The timer lane runs tasks one at a time until it
//! is empty, like a chain of zero-delay timeouts. The frame lane batches every
//! task requested before a frame and runs the batch when the host renders the
//! next frame; tasks requested while a frame runs wait for the following one.

use crate::scheduler::{Scheduler, TickId, TickMode};
use crate::task_queue::{Task, TaskQueue};
use core_types::Result;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

thread_local! {
    static CURRENT: Rc<EventLoop> = Rc::new(EventLoop::new());
}

/// Single-threaded event loop.
///
/// Queues are behind `RefCell`s and never borrowed while a task runs, so a
/// task may freely schedule or cancel other tasks.
///
/// # Examples
///
/// ```
/// use async_runtime::{EventLoop, Task};
///
/// let event_loop = EventLoop::new();
/// event_loop.enqueue_task(Task::new(|| Ok(())));
/// event_loop.run_until_done().unwrap();
/// assert!(event_loop.is_task_queue_empty());
/// ```
#[derive(Debug, Default)]
pub struct EventLoop {
    mode: Cell<TickMode>,
    timers: RefCell<TaskQueue>,
    frames: RefCell<TaskQueue>,
}

impl EventLoop {
    /// Creates a new EventLoop with empty queues in immediate mode.
    pub fn new() -> Self {
        Self::with_mode(TickMode::Immediate)
    }

    /// Creates a new EventLoop serving tick requests on the given lane.
    pub fn with_mode(mode: TickMode) -> Self {
        Self {
            mode: Cell::new(mode),
            timers: RefCell::new(TaskQueue::new()),
            frames: RefCell::new(TaskQueue::new()),
        }
    }

    /// The event loop of the current thread.
    pub fn current() -> Rc<EventLoop> {
        CURRENT.with(Rc::clone)
    }

    /// Lane that serves [`Scheduler::request_tick`].
    pub fn mode(&self) -> TickMode {
        self.mode.get()
    }

    /// Switch the lane that serves future tick requests. Tasks already queued
    /// stay where they are.
    pub fn set_mode(&self, mode: TickMode) {
        self.mode.set(mode);
    }

    /// Adds a task to the timer lane.
    pub fn enqueue_task(&self, task: Task) -> TickId {
        self.timers.borrow_mut().enqueue(task)
    }

    /// Adds a task to the next frame.
    pub fn enqueue_frame(&self, task: Task) -> TickId {
        self.frames.borrow_mut().enqueue(task)
    }

    /// Withdraws a task from whichever lane holds it.
    pub fn cancel(&self, id: TickId) -> bool {
        self.timers.borrow_mut().cancel(id) || self.frames.borrow_mut().cancel(id)
    }

    /// Returns true if the timer lane is empty.
    pub fn is_task_queue_empty(&self) -> bool {
        self.timers.borrow().is_empty()
    }

    /// Returns true if no task waits for the next frame.
    pub fn is_frame_queue_empty(&self) -> bool {
        self.frames.borrow().is_empty()
    }

    /// Number of tasks waiting in both lanes.
    pub fn pending(&self) -> usize {
        self.timers.borrow().len() + self.frames.borrow().len()
    }

    /// Runs the timer lane until it is empty, including tasks that running
    /// tasks schedule.
    ///
    /// Stops at the first failing task and returns its error; tasks still
    /// queued stay queued.
    pub fn run_until_done(&self) -> Result<()> {
        while self.process_one_cycle()? {}
        Ok(())
    }

    /// Runs the next timer task, if any. Returns whether a task ran.
    pub fn process_one_cycle(&self) -> Result<bool> {
        let next = self.timers.borrow_mut().dequeue();
        match next {
            Some(task) => {
                task.run()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Runs every task that was waiting when the frame started.
    ///
    /// If a task fails, the rest of the batch is put back in front of the
    /// frame lane and the error is returned.
    pub fn run_frame(&self) -> Result<()> {
        let batch = self.frames.borrow_mut().take_all();
        let mut batch = batch.into_iter();
        while let Some(task) = batch.next() {
            if let Err(error) = task.run() {
                self.frames.borrow_mut().requeue_front(batch.collect());
                return Err(error);
            }
        }
        Ok(())
    }
}

impl Scheduler for EventLoop {
    fn request_tick(&self, task: Task) -> TickId {
        let id = match self.mode() {
            TickMode::Immediate => self.enqueue_task(task),
            TickMode::Frame => self.enqueue_frame(task),
        };
        tracing::trace!(tick = id.value(), mode = %self.mode(), "tick requested");
        id
    }

    fn cancel_tick(&self, id: TickId) -> bool {
        self.cancel(id)
    }
}
