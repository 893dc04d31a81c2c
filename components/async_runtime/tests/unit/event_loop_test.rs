//! Unit tests for EventLoop

use async_runtime::{EventLoop, Scheduler, Task, TickMode};
use core_types::Error;
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn test_new_event_loop_has_empty_lanes() {
    let event_loop = EventLoop::new();
    assert!(event_loop.is_task_queue_empty());
    assert!(event_loop.is_frame_queue_empty());
    assert_eq!(event_loop.pending(), 0);
}

#[test]
fn test_task_queue_fifo_order() {
    let event_loop = EventLoop::new();
    let results = Rc::new(RefCell::new(vec![]));

    let results1 = results.clone();
    event_loop.enqueue_task(Task::new(move || {
        results1.borrow_mut().push(1);
        Ok(())
    }));

    let results2 = results.clone();
    event_loop.enqueue_task(Task::new(move || {
        results2.borrow_mut().push(2);
        Ok(())
    }));

    event_loop.run_until_done().unwrap();
    assert_eq!(*results.borrow(), vec![1, 2]);
}

#[test]
fn test_cancelled_tick_never_runs() {
    let event_loop = EventLoop::new();
    let results = Rc::new(RefCell::new(vec![]));

    let r = results.clone();
    let id = event_loop.request_tick(Task::new(move || {
        r.borrow_mut().push("cancelled");
        Ok(())
    }));
    assert!(event_loop.cancel_tick(id));

    let r = results.clone();
    event_loop.request_tick(Task::new(move || {
        r.borrow_mut().push("rescheduled");
        Ok(())
    }));

    event_loop.run_until_done().unwrap();
    assert_eq!(*results.borrow(), vec!["rescheduled"]);
}

#[test]
fn test_cancel_after_run_reports_false() {
    let event_loop = EventLoop::new();
    let id = event_loop.request_tick(Task::new(|| Ok(())));
    event_loop.run_until_done().unwrap();
    assert!(!event_loop.cancel_tick(id));
}

#[test]
fn test_frame_lane_runs_only_the_batch_present_at_frame_start() {
    let event_loop = Rc::new(EventLoop::with_mode(TickMode::Frame));
    let frames = Rc::new(RefCell::new(vec![]));

    let (el, f) = (event_loop.clone(), frames.clone());
    event_loop.request_tick(Task::new(move || {
        f.borrow_mut().push(1);
        let f = f.clone();
        el.request_tick(Task::new(move || {
            f.borrow_mut().push(2);
            Ok(())
        }));
        Ok(())
    }));

    event_loop.run_frame().unwrap();
    assert_eq!(*frames.borrow(), vec![1]);
    event_loop.run_frame().unwrap();
    assert_eq!(*frames.borrow(), vec![1, 2]);
}

#[test]
fn test_failing_frame_task_keeps_the_rest_of_the_batch() {
    let event_loop = EventLoop::with_mode(TickMode::Frame);
    let hit = Rc::new(RefCell::new(false));

    event_loop.request_tick(Task::new(|| Err(Error::observer("boom"))));
    let h = hit.clone();
    event_loop.request_tick(Task::new(move || {
        *h.borrow_mut() = true;
        Ok(())
    }));

    assert!(event_loop.run_frame().is_err());
    assert!(!*hit.borrow());
    event_loop.run_frame().unwrap();
    assert!(*hit.borrow());
}

#[test]
fn test_switching_mode_changes_the_serving_lane() {
    let event_loop = EventLoop::new();
    event_loop.request_tick(Task::new(|| Ok(())));
    event_loop.set_mode(TickMode::Frame);
    event_loop.request_tick(Task::new(|| Ok(())));

    assert!(!event_loop.is_task_queue_empty());
    assert!(!event_loop.is_frame_queue_empty());
}
