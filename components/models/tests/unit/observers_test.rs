//! Unit tests for observer dispatch

use crate::support::{init_tracing, person, Recorder};
use async_runtime::{EventLoop, Scheduler, Task, TickId, TickMode};
use models::{
    add_global_observer, configure, remove_global_observer, set_scheduler, Class, Collection,
    Config, Error, ElementType, Instance, Model, Observer, TypeRef, Value,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

fn jim() -> Instance {
    Model::new(&person(), [("name", Value::from("Jim")), ("age", Value::from(23))]).unwrap()
}

#[test]
fn test_pokes_wait_for_the_tick() {
    init_tracing();
    let jim = jim();
    let recorder = Recorder::default();
    jim.add_observer(Observer::handler(recorder.clone())).unwrap();

    jim.set("age", 24).unwrap();
    assert!(recorder.entries().is_empty());

    models::tick().unwrap();
    assert_eq!(recorder.entries(), vec!["poke age 24 23"]);

    models::tick().unwrap();
    assert_eq!(recorder.entries().len(), 1);
}

#[test]
fn test_repeated_writes_coalesce() {
    let jim = jim();
    let recorder = Recorder::default();
    jim.add_observer(Observer::handler(recorder.clone())).unwrap();

    jim.set("age", 24).unwrap();
    jim.set("name", "James").unwrap();
    jim.set("age", 25).unwrap();
    models::tick().unwrap();

    assert_eq!(
        recorder.entries(),
        vec!["poke age 25 23", "poke name \"James\" \"Jim\""]
    );
}

#[test]
fn test_unchanged_writes_are_not_reported() {
    let jim = jim();
    let recorder = Recorder::default();
    jim.add_observer(Observer::handler(recorder.clone())).unwrap();
    jim.set("age", 23).unwrap();
    models::tick().unwrap();
    assert!(recorder.entries().is_empty());
}

#[test]
fn test_local_peeks_are_delivered_on_flush() {
    let jim = jim();
    let recorder = Recorder::default();
    jim.add_observer(Observer::handler(recorder.clone())).unwrap();

    jim.get("name").unwrap();
    jim.get("name").unwrap();
    jim.get("_private").unwrap();
    assert!(recorder.entries().is_empty());

    models::tick().unwrap();
    assert_eq!(recorder.entries(), vec!["peek name"]);
}

#[test]
fn test_global_observers_see_every_instance() {
    let recorder = Recorder::default();
    let observer = Observer::handler(recorder.clone());
    add_global_observer(observer.clone());
    add_global_observer(observer.clone());

    let jim = jim();
    jim.get("name").unwrap();
    assert_eq!(recorder.entries(), vec!["peek name"]);

    jim.set("age", 30).unwrap();
    models::tick().unwrap();
    assert_eq!(recorder.entries(), vec!["peek name", "poke age 30 23"]);

    assert!(remove_global_observer(&observer));
    assert!(!remove_global_observer(&observer));
    jim.set("age", 31).unwrap();
    models::tick().unwrap();
    assert_eq!(recorder.entries().len(), 2);
}

#[test]
fn test_observe_can_narrow_to_one_field() {
    let jim = jim();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = seen.clone();
    let observer = jim
        .observe(Some("age"), move |name, new, old, _| {
            log.borrow_mut().push((name.to_string(), new.clone(), old.clone()));
            Ok(())
        })
        .unwrap();

    jim.set("name", "James").unwrap();
    jim.set("age", 40).unwrap();
    models::tick().unwrap();
    assert_eq!(
        *seen.borrow(),
        vec![("age".to_string(), Value::from(40), Value::from(23))]
    );

    jim.unobserve(&observer).unwrap();
    jim.set("age", 41).unwrap();
    models::tick().unwrap();
    assert_eq!(seen.borrow().len(), 1);
}

#[test]
fn test_observers_are_registered_once() {
    let jim = jim();
    let recorder = Recorder::default();
    let observer = Observer::handler(recorder.clone());
    jim.add_observer(observer.clone()).unwrap();
    jim.add_observer(observer.clone()).unwrap();
    jim.set("age", 50).unwrap();
    models::tick().unwrap();
    assert_eq!(recorder.entries().len(), 1);
}

#[test]
fn test_add_observer_returns_a_remover() {
    let jim = jim();
    let calls = Rc::new(Cell::new(0));
    let counter = calls.clone();
    let callback = Value::function(move |_| {
        counter.set(counter.get() + 1);
        Ok(Value::Undefined)
    });

    let remover = jim.call("addObserver", &[callback]).unwrap();
    jim.set("age", 1).unwrap();
    models::tick().unwrap();
    assert_eq!(calls.get(), 1);

    remover.as_function().unwrap().call(&[]).unwrap();
    jim.set("age", 2).unwrap();
    models::tick().unwrap();
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_observe_by_name_passes_new_old_and_instance() {
    let jim = jim();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = seen.clone();
    let callback = Value::function(move |args| {
        log.borrow_mut().push(args.to_vec());
        Ok(Value::Undefined)
    });
    jim.call("observe", &[Value::from("age"), callback]).unwrap();

    jim.set("name", "Other").unwrap();
    jim.set("age", 60).unwrap();
    models::tick().unwrap();

    let seen = seen.borrow();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0][0], Value::from(60));
    assert_eq!(seen[0][1], Value::from(23));
    assert_eq!(seen[0][2], Value::from(&jim));
}

#[test]
fn test_record_observers_use_their_hook_fields() {
    let jim = jim();
    let names = Rc::new(RefCell::new(Vec::new()));
    let log = names.clone();
    let record = Value::record([(
        "onpoke",
        Value::function(move |args| {
            let name = args.get(1).and_then(Value::as_str).unwrap_or_default();
            log.borrow_mut().push(name.to_string());
            Ok(Value::Undefined)
        }),
    )]);
    jim.call("addObserver", &[record]).unwrap();
    jim.set("age", 70).unwrap();
    models::tick().unwrap();
    assert_eq!(*names.borrow(), vec!["age".to_string()]);
}

#[test]
fn test_bad_observers_are_type_errors() {
    let jim = jim();
    let error = jim.call("addObserver", &[Value::from(5)]).unwrap_err();
    assert!(error.mentions("Bad argument to Person.addObserver"));
}

#[test]
fn test_private_fields_only_reach_self_observers() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = seen.clone();
    let watcher = Class::model("Watcher")
        .on_poke(move |observer, observed, name, _, _| {
            assert!(observer.ptr_eq(observed));
            log.borrow_mut().push(name.to_string());
            Ok(())
        })
        .build();
    let me = Model::empty(&watcher).unwrap();
    me.call("addObserver", &[]).unwrap();
    let recorder = Recorder::default();
    me.add_observer(Observer::handler(recorder.clone())).unwrap();

    me.set("_secret", 1).unwrap();
    me.set("shown", 2).unwrap();
    models::tick().unwrap();

    assert_eq!(*seen.borrow(), vec!["_secret".to_string(), "shown".to_string()]);
    assert_eq!(recorder.entries(), vec!["poke shown 2 undefined"]);
}

#[test]
fn test_instances_can_observe_each_other() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = seen.clone();
    let mirror = Class::model("Mirror")
        .on_poke(move |_, observed, name, new, _| {
            log.borrow_mut()
                .push(format!("{} {} {:?}", observed.class().name(), name, new));
            Ok(())
        })
        .build();
    let mirror = Model::empty(&mirror).unwrap();
    let jim = jim();
    jim.add_observer(Observer::instance(&mirror)).unwrap();

    jim.set("age", 33).unwrap();
    models::tick().unwrap();
    assert_eq!(*seen.borrow(), vec!["Person age 33".to_string()]);
}

#[test]
fn test_splices_report_the_net_change() {
    let numbers = Collection::of(ElementType::Type(TypeRef::Number));
    let list = Collection::new(&numbers, [1, 2]).unwrap();
    let recorder = Recorder::default();
    list.add_observer(Observer::handler(recorder.clone())).unwrap();

    list.push([3]).unwrap();
    list.push([4]).unwrap();
    list.shift().unwrap();
    models::tick().unwrap();
    assert_eq!(recorder.entries(), vec!["splice [3, 4] [1]"]);

    list.push([5]).unwrap();
    list.pop().unwrap();
    models::tick().unwrap();
    assert_eq!(recorder.entries(), vec!["splice [3, 4] [1]", "splice [] []"]);
}

#[test]
fn test_unobservable_classes_refuse_observers() {
    let quiet = Class::model("Quiet").observable(false).build();
    let quiet = Model::empty(&quiet).unwrap();
    let error = quiet
        .add_observer(Observer::handler(Recorder::default()))
        .unwrap_err();
    assert_eq!(error.to_string(), "AccessError: The Quiet is unfortunately not observable.");
    assert!(quiet.observe(None, |_, _, _, _| Ok(())).is_err());
}

#[test]
fn test_constructor_input_is_not_reported() {
    let recorder = Recorder::default();
    let observer = Observer::handler(recorder.clone());
    add_global_observer(observer.clone());

    let greeter = Class::model("Greeter").build();
    let greeter = Model::new(&greeter, [("greeting", "hello")]).unwrap();
    models::tick().unwrap();
    assert!(recorder.entries().is_empty());

    greeter.set("greeting", "bye").unwrap();
    models::tick().unwrap();
    remove_global_observer(&observer);
    assert_eq!(recorder.entries(), vec!["poke greeting \"bye\" \"hello\""]);
}

#[test]
fn test_observer_failures_surface_from_the_tick() {
    init_tracing();
    let jim = jim();
    jim.observe(None, |_, _, _, _| Err(Error::observer("boom")))
        .unwrap();
    jim.set("age", 99).unwrap();
    let error = models::tick().unwrap_err();
    assert!(error.mentions("boom"));

    // The ledger was drained before delivery.
    models::tick().unwrap();
}

#[test]
fn test_frame_mode_delivers_on_the_next_frame() {
    let jim = jim();
    let recorder = Recorder::default();
    jim.add_observer(Observer::handler(recorder.clone())).unwrap();

    configure(&Config {
        tick_mode: TickMode::Frame,
    });
    jim.set("age", 80).unwrap();
    models::tick().unwrap();
    assert!(recorder.entries().is_empty());
    models::frame().unwrap();
    configure(&Config::default());

    assert_eq!(recorder.entries(), vec!["poke age 80 23"]);
}

/// Counts requests and forwards them to the thread's event loop.
struct Counting {
    requests: Cell<usize>,
    cancels: Cell<usize>,
}

impl Scheduler for Counting {
    fn request_tick(&self, task: Task) -> TickId {
        self.requests.set(self.requests.get() + 1);
        EventLoop::current().request_tick(task)
    }

    fn cancel_tick(&self, id: TickId) -> bool {
        self.cancels.set(self.cancels.get() + 1);
        EventLoop::current().cancel_tick(id)
    }
}

#[test]
fn test_every_event_reschedules_the_single_pending_flush() {
    let counting = Rc::new(Counting {
        requests: Cell::new(0),
        cancels: Cell::new(0),
    });
    set_scheduler(counting.clone());

    let jim = jim();
    let recorder = Recorder::default();
    jim.add_observer(Observer::handler(recorder.clone())).unwrap();
    jim.set("age", 1).unwrap();
    jim.set("age", 2).unwrap();
    jim.set("age", 3).unwrap();
    models::tick().unwrap();
    set_scheduler(EventLoop::current());

    assert_eq!(counting.requests.get(), 3);
    assert_eq!(counting.cancels.get(), 2);
    assert_eq!(recorder.entries(), vec!["poke age 3 23"]);
}
