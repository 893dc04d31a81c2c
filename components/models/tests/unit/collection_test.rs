//! Unit tests for collections and the element pipeline

use crate::support::{animal, person};
use models::{Class, Collection, ElementType, ErrorKind, TypeRef, Value};
use serde_json::json;

fn numbers() -> models::ClassRef {
    Collection::of(ElementType::Type(TypeRef::Number))
}

#[test]
fn test_untyped_collections_take_anything() {
    let bag = Class::collection("Bag").build();
    let bag = Collection::new(&bag, [Value::from(1), Value::from("two"), Value::Null]).unwrap();
    assert_eq!(bag.len().unwrap(), 3);
    assert_eq!(bag.to_json().unwrap(), json!([1, "two", null]));
}

#[test]
fn test_typed_elements_are_validated() {
    let list = Collection::new(&numbers(), [1, 2]).unwrap();
    let error = list.push([Value::from("3")]).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::TypeError);
    assert_eq!(list.len().unwrap(), 2);
    assert!(list.set(0usize, "zero").is_err());
}

#[test]
fn test_class_elements_are_converted() {
    let people = Class::collection("People").of(&person()).build();
    let people = Collection::from_json(&people, &json!([{ "name": "Jim" }, null])).unwrap();
    let jim = people.at(0).unwrap();
    let jim = jim.as_instance().unwrap();
    assert_eq!(jim.class().name(), "Person");
    assert!(people.at(1).unwrap().is_null());

    people.push([Value::record([("name", "Ann")])]).unwrap();
    let ann = people.at(2).unwrap();
    assert_eq!(ann.as_instance().unwrap().get("name").unwrap(), Value::from("Ann"));
    assert!(people.push([Value::from(3)]).is_err());
}

#[test]
fn test_selectors_pick_the_class_per_element() {
    let animal = animal();
    let person = person();
    let crowd = Class::collection("Crowd")
        .select(move |value| {
            let is_pet = match value {
                Value::Object(record) => record.borrow().len() == 1,
                _ => false,
            };
            if is_pet {
                TypeRef::Class(animal.clone())
            } else {
                TypeRef::Class(person.clone())
            }
        })
        .build();
    let crowd = Collection::new(
        &crowd,
        [
            Value::record([("name", "Rex")]),
            Value::record([("name", Value::from("Jim")), ("age", Value::from(30))]),
        ],
    )
    .unwrap();
    let first = crowd.at(0).unwrap();
    let second = crowd.at(1).unwrap();
    assert_eq!(first.as_instance().unwrap().class().name(), "Animal");
    assert_eq!(second.as_instance().unwrap().class().name(), "Person");
}

#[test]
fn test_selectors_must_name_a_class() {
    let odd = Class::collection("Odd").select(|_| TypeRef::String).build();
    let error = Collection::new(&odd, ["x"]).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::TypeError);
}

#[test]
fn test_element_declarations_are_inherited() {
    let base = Class::collection("Base").of(&animal()).build();
    let derived = Class::extend(&base, "Derived").build();
    let zoo = Collection::new(&derived, [Value::record([("name", "Rex")])]).unwrap();
    assert!(zoo.at(0).unwrap().as_instance().is_some());
}

#[test]
fn test_mutators_return_what_arrays_return() {
    let list = Collection::new(&numbers(), [1, 2, 3]).unwrap();
    assert_eq!(list.push([4, 5]).unwrap(), 5);
    assert_eq!(list.pop().unwrap(), Value::from(5));
    assert_eq!(list.shift().unwrap(), Value::from(1));
    assert_eq!(list.unshift([0]).unwrap(), 4);
    assert_eq!(
        list.splice(1, 2, [9]).unwrap(),
        vec![Value::from(2), Value::from(3)]
    );
    assert_eq!(
        list.to_vec().unwrap(),
        vec![Value::from(0), Value::from(9), Value::from(4)]
    );
}

#[test]
fn test_empty_collections_pop_undefined() {
    let list = Collection::empty(&numbers()).unwrap();
    assert!(list.is_empty().unwrap());
    assert!(list.pop().unwrap().is_undefined());
    assert!(list.shift().unwrap().is_undefined());
}

#[test]
fn test_length_truncates_and_pads() {
    let list = Collection::new(&numbers(), [1, 2, 3]).unwrap();
    list.set_len(1).unwrap();
    assert_eq!(list.to_vec().unwrap(), vec![Value::from(1)]);
    list.set("length", 3).unwrap();
    assert_eq!(list.len().unwrap(), 3);
    assert!(list.at(2).unwrap().is_undefined());

    assert!(list.set("length", -1).is_err());
    assert!(list.set("length", 1.5).is_err());
    assert!(list.set("length", "2").is_err());
    assert!(list.delete_property("length").is_err());
}

#[test]
fn test_writes_past_the_end_grow_the_collection() {
    let list = Collection::new(&numbers(), [1]).unwrap();
    list.set(3usize, 4).unwrap();
    assert_eq!(list.len().unwrap(), 4);
    assert!(list.at(1).unwrap().is_undefined());
    assert_eq!(list.get("3").unwrap(), Value::from(4));
}

#[test]
fn test_negative_indices_are_rejected() {
    let list = Collection::new(&numbers(), [1]).unwrap();
    assert!(list.set("-1", 2).unwrap_err().mentions("cannot assign"));
    assert!(list.get("-1").unwrap().is_undefined());
}

#[test]
fn test_deleting_an_element_leaves_a_hole() {
    let list = Collection::new(&numbers(), [1, 2, 3]).unwrap();
    list.delete_property(1usize).unwrap();
    assert_eq!(list.len().unwrap(), 3);
    assert!(list.at(1).unwrap().is_undefined());
    assert_eq!(list.to_json().unwrap(), json!([1, null, 3]));
}

#[test]
fn test_own_keys_lists_indices() {
    let list = Collection::new(&numbers(), [7, 8]).unwrap();
    assert_eq!(list.own_keys().unwrap(), vec!["0".to_string(), "1".to_string()]);
    let desc = list.get_own_property_descriptor(1usize).unwrap().unwrap();
    assert_eq!(desc.value, Some(Value::from(8)));
    assert!(list.get_own_property_descriptor(2usize).unwrap().is_none());
}

#[test]
fn test_collections_are_not_models() {
    let list = numbers();
    assert!(models::Model::empty(&list).is_err());
    assert!(Collection::empty(&animal()).is_err());
    assert!(Collection::from_json(&list, &json!({ "a": 1 })).is_err());
}

#[test]
fn test_out_of_range_indices_are_rejected() {
    let bag = Class::collection("Bag").build();
    let bag = Collection::new(&bag, [1]).unwrap();

    for index in ["4294967295", "18446744073709551615", "99999999999999999999999"] {
        let error = bag.set(index, 1).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::AccessError, "{}", index);
        assert!(error.mentions("cannot assign"), "{}", index);
        assert_eq!(bag.get(index).unwrap(), Value::Undefined);
    }
    assert_eq!(bag.len().unwrap(), 1);
}

#[test]
fn test_oversized_lengths_are_type_errors() {
    let list = Collection::new(&numbers(), [1, 2]).unwrap();
    for length in [1e20, 4294967296.0, f64::INFINITY, f64::NAN] {
        let error = list.set("length", length).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::TypeError, "{}", length);
    }
    assert_eq!(list.len().unwrap(), 2);
}
