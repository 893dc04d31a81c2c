//! Contract tests for async_runtime component
//!
//! These tests pin down the scheduling contract the model engine relies on:
//! a single pending slot that can be cancelled and re-requested.

use async_runtime::{EventLoop, Scheduler, Task, TickId, TickMode};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Mirrors how a dispatcher keeps at most one flush pending.
struct SingleSlot {
    scheduler: Rc<EventLoop>,
    pending: Cell<Option<TickId>>,
}

impl SingleSlot {
    fn schedule(&self, task: Task) {
        if let Some(id) = self.pending.take() {
            self.scheduler.cancel_tick(id);
        }
        self.pending.set(Some(self.scheduler.request_tick(task)));
    }
}

mod scheduler_contract {
    use super::*;

    #[test]
    fn test_rescheduling_replaces_the_pending_request() {
        let slot = SingleSlot {
            scheduler: Rc::new(EventLoop::new()),
            pending: Cell::new(None),
        };
        let runs = Rc::new(RefCell::new(vec![]));

        for n in 0..5 {
            let r = runs.clone();
            slot.schedule(Task::new(move || {
                r.borrow_mut().push(n);
                Ok(())
            }));
        }

        assert_eq!(slot.scheduler.pending(), 1);
        slot.scheduler.run_until_done().unwrap();
        assert_eq!(*runs.borrow(), vec![4]);
    }

    #[test]
    fn test_tick_mode_deserializes_from_lowercase() {
        let mode: TickMode = serde_json::from_str("\"frame\"").unwrap();
        assert_eq!(mode, TickMode::Frame);
    }

    #[test]
    fn test_current_loop_is_shared_per_thread() {
        let a = EventLoop::current();
        let b = EventLoop::current();
        assert!(Rc::ptr_eq(&a, &b));
    }
}
