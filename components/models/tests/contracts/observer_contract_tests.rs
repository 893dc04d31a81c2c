//! Notification timing and shape contracts

use models::{
    add_global_observer, remove_global_observer, Class, ClassRef, Collection, ElementType, Error,
    Instance, Model, Observer, ObserverHandler, Result, TypeRef, Value,
};
use std::cell::RefCell;
use std::rc::Rc;

fn person() -> ClassRef {
    Class::model("Person")
        .shape(|s| Some(s.field("name", TypeRef::String).field("age", TypeRef::Number)))
        .build()
}

type Pokes = Rc<RefCell<Vec<(String, String, Value, Value)>>>;

struct PokeLog(Pokes);

impl ObserverHandler for PokeLog {
    fn on_poke(&self, instance: &Instance, name: &str, new: &Value, old: &Value) -> Result<()> {
        self.0
            .borrow_mut()
            .push((instance.id(), name.to_string(), new.clone(), old.clone()));
        Ok(())
    }
}

#[test]
fn test_global_poke_fires_once_at_next_flush() {
    let pokes: Pokes = Rc::default();
    let observer = Observer::handler(PokeLog(pokes.clone()));
    add_global_observer(observer.clone());

    let jim = Model::new(&person(), [("age", 23)]).unwrap();
    jim.set("age", 24).unwrap();
    assert!(pokes.borrow().is_empty());
    models::tick().unwrap();
    models::tick().unwrap();
    remove_global_observer(&observer);

    assert_eq!(
        *pokes.borrow(),
        vec![(jim.id(), "age".to_string(), Value::from(24), Value::from(23))]
    );
}

#[test]
fn test_globals_also_receive_private_changes() {
    let pokes: Pokes = Rc::default();
    let observer = Observer::handler(PokeLog(pokes.clone()));
    add_global_observer(observer.clone());

    let jim = Model::new(&person(), [("age", 23)]).unwrap();
    let local: Pokes = Rc::default();
    jim.add_observer(Observer::handler(PokeLog(local.clone())))
        .unwrap();
    jim.set("_draft", "x").unwrap();
    models::tick().unwrap();
    remove_global_observer(&observer);

    assert_eq!(pokes.borrow().len(), 1);
    assert_eq!(pokes.borrow()[0].1, "_draft");
    assert!(local.borrow().is_empty());
}

#[test]
fn test_setting_the_current_value_is_silent() {
    let pokes: Pokes = Rc::default();
    let jim = Model::new(&person(), [("age", Value::from(23)), ("name", Value::from("Jim"))]).unwrap();
    jim.add_observer(Observer::handler(PokeLog(pokes.clone())))
        .unwrap();
    jim.set("age", 23).unwrap();
    jim.set("name", "Jim").unwrap();
    models::tick().unwrap();
    assert!(pokes.borrow().is_empty());
}

#[test]
fn test_many_writes_coalesce_to_newest_and_original() {
    let pokes: Pokes = Rc::default();
    let jim = Model::new(&person(), [("age", 1)]).unwrap();
    jim.add_observer(Observer::handler(PokeLog(pokes.clone())))
        .unwrap();
    for age in 2..=10 {
        jim.set("age", age).unwrap();
    }
    models::tick().unwrap();
    let pokes = pokes.borrow();
    assert_eq!(pokes.len(), 1);
    assert_eq!((pokes[0].2.clone(), pokes[0].3.clone()), (Value::from(10), Value::from(1)));
}

#[test]
fn test_writes_during_delivery_start_a_new_epoch() {
    let pokes: Pokes = Rc::default();
    let jim = Model::new(&person(), [("age", 1)]).unwrap();
    jim.observe(Some("age"), |_, new, _, instance| {
        let age = new.as_number().unwrap_or_default();
        instance.set("name", format!("aged {}", age))
    })
    .unwrap();
    jim.add_observer(Observer::handler(PokeLog(pokes.clone())))
        .unwrap();

    jim.set("age", 2).unwrap();
    models::tick().unwrap();

    let names = pokes
        .borrow()
        .iter()
        .map(|(_, name, _, _)| name.clone())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["age".to_string(), "name".to_string()]);
}

#[test]
fn test_registration_during_delivery_waits_for_the_next_pass() {
    let pokes: Pokes = Rc::default();
    let jim = Model::new(&person(), [("age", 1)]).unwrap();
    let late = Observer::handler(PokeLog(pokes.clone()));
    jim.observe(None, move |_, _, _, instance| {
        instance.add_observer(late.clone())
    })
    .unwrap();

    jim.set("age", 2).unwrap();
    models::tick().unwrap();
    assert!(pokes.borrow().is_empty());

    jim.set("age", 3).unwrap();
    models::tick().unwrap();
    assert_eq!(pokes.borrow().len(), 1);
}

#[test]
fn test_a_failing_observer_aborts_the_rest_of_the_pass() {
    let pokes: Pokes = Rc::default();
    let jim = Model::new(&person(), [("age", 1)]).unwrap();
    jim.observe(None, |_, _, _, _| Err(Error::observer("nope")))
        .unwrap();
    jim.add_observer(Observer::handler(PokeLog(pokes.clone())))
        .unwrap();

    jim.set("age", 2).unwrap();
    assert!(models::tick().is_err());
    assert!(pokes.borrow().is_empty());

    models::tick().unwrap();
    assert!(pokes.borrow().is_empty());
}

#[derive(Default)]
struct SpliceLog(RefCell<Vec<(Vec<Value>, Vec<Value>)>>);

impl ObserverHandler for SpliceLog {
    fn on_splice(&self, _collection: &Instance, added: &[Value], removed: &[Value]) -> Result<()> {
        self.0.borrow_mut().push((added.to_vec(), removed.to_vec()));
        Ok(())
    }
}

#[test]
fn test_splices_are_net_differences_per_turn() {
    let numbers = Collection::of(ElementType::Type(TypeRef::Number));
    let list = Collection::new(&numbers, [1, 2, 3]).unwrap();
    let log = Rc::new(SpliceLog::default());
    list.add_observer(Observer::Handler(log.clone())).unwrap();

    list.push([4, 5, 6]).unwrap();
    list.pop().unwrap();
    list.pop().unwrap();
    list.shift().unwrap();
    models::tick().unwrap();

    assert_eq!(
        *log.0.borrow(),
        vec![(vec![Value::from(4)], vec![Value::from(1)])]
    );
}

#[test]
fn test_element_writes_and_holes_are_splices() {
    let numbers = Collection::of(ElementType::Type(TypeRef::Number));
    let list = Collection::new(&numbers, [1, 2]).unwrap();
    let log = Rc::new(SpliceLog::default());
    list.add_observer(Observer::Handler(log.clone())).unwrap();

    list.set(0usize, 7).unwrap();
    list.delete_property(1usize).unwrap();
    models::tick().unwrap();

    assert_eq!(
        *log.0.borrow(),
        vec![(
            vec![Value::from(7), Value::Undefined],
            vec![Value::from(1), Value::from(2)]
        )]
    );
}

#[test]
fn test_unobservable_instances_reject_registration() {
    let hidden = Class::model("Hidden").observable(false).build();
    let derived = Class::extend(&hidden, "StillHidden").build();
    let instance = Model::empty(&derived).unwrap();
    let error = instance
        .add_observer(Observer::callback(|_, _, _, _| Ok(())))
        .unwrap_err();
    assert!(error.mentions("not observable"));
}
