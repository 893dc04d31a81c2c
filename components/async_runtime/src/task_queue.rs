//! Task queue management.
//!
//! Tasks are executed one at a time in FIFO order. Unlike a plain queue, any
//! task can be withdrawn by id before it runs.

use crate::scheduler::TickId;
use core_types::Result;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

/// Ids are unique across every queue in the process.
static TASK_COUNTER: AtomicU64 = AtomicU64::new(1);

/// A task to be executed by the event loop.
pub struct Task {
    id: TickId,
    callback: Box<dyn FnOnce() -> Result<()>>,
}

impl Task {
    /// Creates a new Task from a closure.
    ///
    /// # Arguments
    ///
    /// * `f` - The function to execute when the task runs
    pub fn new<F>(f: F) -> Self
    where
        F: FnOnce() -> Result<()> + 'static,
    {
        Self {
            id: TickId(TASK_COUNTER.fetch_add(1, Ordering::SeqCst)),
            callback: Box::new(f),
        }
    }

    /// The id this task is scheduled under.
    pub fn id(&self) -> TickId {
        self.id
    }

    /// Executes the task.
    pub fn run(self) -> Result<()> {
        (self.callback)()
    }
}

impl std::fmt::Debug for Task {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Task {{ id: {} }}", self.id.0)
    }
}

/// A queue for tasks.
#[derive(Debug, Default)]
pub struct TaskQueue {
    queue: VecDeque<Task>,
}

impl TaskQueue {
    /// Creates a new empty TaskQueue.
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }

    /// Adds a task to the end of the queue.
    pub fn enqueue(&mut self, task: Task) -> TickId {
        let id = task.id();
        self.queue.push_back(task);
        id
    }

    /// Puts tasks back at the front of the queue, keeping their order.
    pub fn requeue_front(&mut self, tasks: Vec<Task>) {
        for task in tasks.into_iter().rev() {
            self.queue.push_front(task);
        }
    }

    /// Removes and returns the next task from the queue.
    pub fn dequeue(&mut self) -> Option<Task> {
        self.queue.pop_front()
    }

    /// Withdraws the task with the given id. Returns whether it was queued.
    pub fn cancel(&mut self, id: TickId) -> bool {
        let before = self.queue.len();
        self.queue.retain(|task| task.id() != id);
        self.queue.len() != before
    }

    /// Empties the queue, returning every task in order.
    pub fn take_all(&mut self) -> Vec<Task> {
        self.queue.drain(..).collect()
    }

    /// Returns true if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Returns the number of tasks in the queue.
    pub fn len(&self) -> usize {
        self.queue.len()
    }
}
