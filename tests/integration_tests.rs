//! Integration tests for keyed-store

use std::cell::RefCell;
use std::rc::Rc;

use keyed_store::{Callback, Destroy, KeyedStore, Record, StoreError, Update};
use proptest::prelude::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Callback that records every value it is called with.
fn recorder<V: Clone + 'static>() -> (Callback<V>, Rc<RefCell<Vec<Option<V>>>>) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let cb = Callback::new({
        let seen = seen.clone();
        move |value: Option<&V>| seen.borrow_mut().push(value.cloned())
    });
    (cb, seen)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Field {
    Count,
    Count2,
    Name,
}

#[derive(Debug, Clone, PartialEq)]
enum Value {
    Int(i64),
    Text(String),
    List(Vec<i64>),
}

impl keyed_store::FieldValue for Value {
    fn is_identical(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Text(a), Value::Text(b)) => a == b,
            _ => false,
        }
    }
}

#[test]
fn counter_increment_end_to_end() {
    init_tracing();
    let store = KeyedStore::with_defaults(&Record::from([("count", 0)]));
    let (cb, seen) = recorder::<i32>();
    store.subscribe("count", &cb).unwrap();

    store
        .apply("count", Update::with(|c: Option<&i32>| c.copied().unwrap_or(0) + 1))
        .unwrap();

    assert_eq!(*seen.borrow(), vec![Some(1)]);
    assert_eq!(*store.get_all().unwrap(), Record::from([("count", 1)]));
}

#[test]
fn mass_update_fires_every_listener_end_to_end() {
    init_tracing();
    let store = KeyedStore::with_defaults(&Record::from([("count", 0), ("count2", 99)]));
    let (first, first_seen) = recorder::<i32>();
    let (second, second_seen) = recorder::<i32>();
    for key in ["count", "count2"] {
        store.subscribe(key, &first).unwrap();
        store.subscribe(key, &second).unwrap();
    }

    store
        .set_many(&["count", "count2"], |values| {
            Record::from([("count", values["count"] + 1), ("count2", 99)])
        })
        .unwrap();

    assert_eq!(*first_seen.borrow(), vec![Some(1), Some(99)]);
    assert_eq!(*second_seen.borrow(), vec![Some(1), Some(99)]);
}

#[test]
fn mass_update_reaches_listeners_of_unset_fields() {
    let store = KeyedStore::with_defaults(&Record::from([("count", 0)]));
    let (cb, seen) = recorder::<i32>();
    store.subscribe("count", &cb).unwrap();
    store.subscribe("pending", &cb).unwrap();

    store.set_many(&["count", "pending"], |values| values).unwrap();
    assert_eq!(*seen.borrow(), vec![Some(0), None]);
}

#[test]
fn shared_values_keep_identity_through_updaters() {
    let store = KeyedStore::with_defaults(&Record::from([("items", Rc::new(vec![1, 2]))]));
    let (cb, seen) = recorder::<Rc<Vec<i32>>>();
    store.subscribe("items", &cb).unwrap();

    assert!(!store.update("items", |old| old.cloned().unwrap_or_default()).unwrap());
    assert!(seen.borrow().is_empty());

    assert!(store
        .update("items", |old| {
            let mut items = old.map(|rc| Vec::clone(rc)).unwrap_or_default();
            items.push(3);
            Rc::new(items)
        })
        .unwrap());
    assert_eq!(*seen.borrow(), vec![Some(Rc::new(vec![1, 2, 3]))]);
}

#[test]
fn enum_keyed_store() {
    init_tracing();
    let store = KeyedStore::builder()
        .label("profile")
        .defaults(Record::from([
            (Field::Count, Value::Int(0)),
            (Field::Name, Value::Text("anon".into())),
        ]))
        .build();

    let (cb, seen) = recorder::<Value>();
    store.subscribe(Field::Name, &cb).unwrap();

    assert!(!store.set(Field::Name, Value::Text("anon".into())).unwrap());
    assert!(store.set(Field::Name, Value::Text("ada".into())).unwrap());
    assert_eq!(*seen.borrow(), vec![Some(Value::Text("ada".into()))]);

    assert_eq!(
        store.get_many(&[Field::Name, Field::Count2]).unwrap(),
        vec![(Field::Name, Some(Value::Text("ada".into()))), (Field::Count2, None)]
    );
}

#[test]
fn list_values_notify_on_every_replacement() {
    let store = KeyedStore::new();
    let (cb, seen) = recorder::<Value>();
    store.subscribe(Field::Count, &cb).unwrap();

    store.set(Field::Count, Value::List(vec![1, 2])).unwrap();
    store.set(Field::Count, Value::List(vec![1, 2])).unwrap();
    assert_eq!(seen.borrow().len(), 2);
}

#[test]
fn defaults_survive_state_mutation() {
    let defaults = Record::from([("items", vec![1, 2, 3])]);
    let store = KeyedStore::new();
    store.configure_default(&defaults).unwrap();
    store.restore_default(None).unwrap();

    store
        .update("items", |items| {
            let mut items = items.cloned().unwrap_or_default();
            items.push(4);
            items
        })
        .unwrap();
    assert_eq!(store.get(&"items").unwrap(), Some(vec![1, 2, 3, 4]));

    store.restore_default(None).unwrap();
    assert_eq!(*store.get_all().unwrap(), defaults);
}

#[test]
fn broad_unsubscribe_regression() {
    let store: KeyedStore<&str, i32> = KeyedStore::new();
    let (cb, seen) = recorder::<i32>();
    let (bystander, bystander_seen) = recorder::<i32>();
    store.subscribe("a", &cb).unwrap();
    store.subscribe("b", &cb).unwrap();
    store.subscribe("a", &bystander).unwrap();
    store.subscribe("c", &bystander).unwrap();

    store.unsubscribe(&"a", &cb).unwrap();

    store.set_record([("a", 1), ("b", 2), ("c", 3)]).unwrap();
    assert!(seen.borrow().is_empty());
    // bystander lost its "a" registration, shares the key
    assert_eq!(*bystander_seen.borrow(), vec![Some(3)]);
}

#[test]
fn destroy_record_and_store() {
    let store = KeyedStore::with_defaults(&Record::from([("present", 1)]));
    assert!(!store.destroy(Destroy::Record("missing")).unwrap());
    assert!(store.destroy(Destroy::Record("present")).unwrap());
    assert_eq!(store.get(&"present").unwrap(), None);

    let (cb, _) = recorder::<i32>();
    let sub = store.subscribe("present", &cb).unwrap();
    assert!(store.destroy(Destroy::Store).unwrap());

    // released handles are inert
    sub.unsubscribe();
    assert_eq!(store.listener_count(), Err(StoreError::Destroyed));
    assert_eq!(store.restore_default(None), Err(StoreError::Destroyed));
}

#[test]
fn clones_share_state() {
    let store = KeyedStore::new();
    let other = store.clone();
    store.set("shared", 5).unwrap();
    assert_eq!(other.get(&"shared").unwrap(), Some(5));
}

proptest! {
    #[test]
    fn restore_default_reproduces_configured_record(
        defaults in prop::collection::hash_map("[a-z]{1,6}", any::<i64>(), 0..16),
        writes in prop::collection::vec(("[a-z]{1,6}", any::<i64>()), 0..16),
    ) {
        let store: KeyedStore<String, i64> = KeyedStore::new();
        store.configure_default(&defaults).unwrap();
        store.restore_default(None).unwrap();
        prop_assert_eq!(store.snapshot().unwrap(), defaults.clone());

        store.set_record(writes).unwrap();
        prop_assert_eq!(store.default_snapshot().unwrap(), Some(defaults.clone()));

        store.restore_default(None).unwrap();
        prop_assert_eq!(store.snapshot().unwrap(), defaults.clone());
    }

    #[test]
    fn unset_keys_read_as_none(
        present in prop::collection::hash_map("[a-m]{1,4}", any::<u8>(), 0..8),
        probe in "[n-z]{1,4}",
    ) {
        let store = KeyedStore::with_defaults(&present);
        prop_assert_eq!(store.get(&probe).unwrap(), None);
    }

    #[test]
    fn repeated_scalar_set_notifies_once(value in any::<i32>(), repeats in 1usize..8) {
        let store: KeyedStore<&str, i32> = KeyedStore::new();
        let (cb, seen) = recorder::<i32>();
        store.subscribe("x", &cb).unwrap();

        for _ in 0..repeats {
            store.set("x", value).unwrap();
        }
        prop_assert_eq!(seen.borrow().clone(), vec![Some(value)]);
    }
}
