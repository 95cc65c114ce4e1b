//! Integration Tests for Observed Data
//!
//! These tests verify that observed containers, reactive fields, the
//! mutation API and the bundled consumers work together correctly.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde_json::json;
use trellis_core::observe::Attributes;
use trellis_core::reactive::untracked;
use trellis_core::{
    del, observe, set, Array, Computed, Consumer, ConsumerId, Dep, Effect, Object, ObserveError,
    TrackingContext, Value,
};

fn observed(obj: &Object) -> Value {
    let value = Value::from(obj.clone());
    observe(&value, false);
    value
}

/// `{a: 1}` observed; an effect reads `.a`; writes of a new value fire it
/// once, writing the same value again does not.
#[test]
fn field_write_notifies_reader_once() {
    let state = Object::from_iter([("a", 1)]);
    observed(&state);

    let seen = Rc::new(RefCell::new(Vec::new()));
    let effect = {
        let (state, seen) = (state.clone(), seen.clone());
        Effect::new(move || seen.borrow_mut().push(state.get("a").unwrap()))
    };
    assert_eq!(effect.dependency_count(), 1);

    state.assign("a", Value::from(2));
    assert_eq!(effect.run_count(), 2);

    state.assign("a", Value::from(2));
    assert_eq!(effect.run_count(), 2);

    assert_eq!(*seen.borrow(), vec![Value::from(1), Value::from(2)]);
}

/// `[1, 2]` observed under a field; appending fires the reader once, and
/// an appended object is instrumented on its own.
#[test]
fn array_append_notifies_and_instruments() {
    let list: Array = [1, 2].into_iter().collect();
    let state = Object::from_iter([("list", list.clone())]);
    observed(&state);

    let effect = {
        let state = state.clone();
        Effect::new(move || {
            state.get("list");
        })
    };

    list.push(Value::from(3));
    assert_eq!(effect.run_count(), 2);

    let item = Object::from_iter([("done", false)]);
    list.push(Value::from(item.clone()));
    assert_eq!(effect.run_count(), 3);
    assert!(item.is_reactive("done"));

    // The re-run read the list again, so it now depends on the new element.
    let reader = {
        let item = item.clone();
        Effect::new(move || {
            item.get("done");
        })
    };
    item.assign("done", Value::from(true));
    assert_eq!(reader.run_count(), 2);
}

#[test]
fn every_proxied_mutation_fires_exactly_once() {
    let list: Array = [3, 1, 2].into_iter().collect();
    let value = Value::from(list.clone());
    let ob = observe(&value, false).unwrap();

    let effect = {
        let value = value.clone();
        Effect::new(move || value.track())
    };
    assert!(ob.dep().subscriber_count() == 1);

    let mut runs = effect.run_count();
    let mut expect_one = |what: &str| {
        runs += 1;
        assert_eq!(effect.run_count(), runs, "{what}");
    };

    list.push(Value::from(4));
    expect_one("push");
    list.pop();
    expect_one("pop");
    list.shift();
    expect_one("shift");
    list.unshift(vec![Value::from(5), Value::from(6)]);
    expect_one("unshift");
    list.splice(0, 2, vec![Value::from(7), Value::from(8), Value::from(9)]);
    expect_one("splice");
    list.sort_by(|a, b| a.as_f64().partial_cmp(&b.as_f64()).unwrap());
    expect_one("sort");
    list.reverse();
    expect_one("reverse");
}

#[test]
fn splice_instruments_every_inserted_container() {
    let list = Array::new();
    observe(&Value::from(list.clone()), false);

    let a = Object::from_iter([("x", 1)]);
    let b: Array = vec![Value::from(Object::new())].into();
    list.splice(0, 0, vec![Value::from(a.clone()), Value::from(b.clone())]);

    assert!(a.is_reactive("x"));
    assert!(b.observer().is_some());
    assert!(b.get(0).unwrap().observer().is_some());
}

#[test]
fn set_index_past_end_grows_and_instruments() {
    let list: Array = [1].into_iter().collect();
    let state = Object::from_iter([("list", list.clone())]);
    observed(&state);

    let effect = {
        let state = state.clone();
        Effect::new(move || {
            state.get("list");
        })
    };

    let tail = Object::from_iter([("n", 0)]);
    set(&Value::from(list.clone()), 3usize, Value::from(tail.clone())).unwrap();

    assert_eq!(list.len(), 4);
    assert!(list.get(1).unwrap().is_null());
    assert!(list.get(2).unwrap().is_null());
    assert_eq!(effect.run_count(), 2);
    assert!(tail.is_reactive("n"));
}

#[test]
fn set_existing_key_reuses_the_field() {
    let state = Object::from_iter([("a", 1)]);
    let target = observed(&state);
    let dep_before = state.field("a").unwrap().dep().id();

    let effect = {
        let state = state.clone();
        Effect::new(move || {
            state.get("a");
        })
    };

    set(&target, "a", Value::from(2)).unwrap();

    assert_eq!(effect.run_count(), 2);
    assert_eq!(state.field("a").unwrap().dep().id(), dep_before);
}

#[test]
fn set_new_key_fires_structural_subject_once() {
    let inner = Object::new();
    let state = Object::from_iter([("inner", inner.clone())]);
    observed(&state);

    // Reading `inner` depends on its structural subject.
    let effect = {
        let state = state.clone();
        Effect::new(move || {
            state.get("inner");
        })
    };

    set(&Value::from(inner.clone()), "fresh", Value::from(1)).unwrap();
    assert_eq!(effect.run_count(), 2);
    assert!(inner.is_reactive("fresh"));

    // The new key is trackable from now on.
    let reader = {
        let inner = inner.clone();
        Effect::new(move || {
            inner.get("fresh");
        })
    };
    inner.assign("fresh", Value::from(2));
    assert_eq!(reader.run_count(), 2);
}

#[test]
fn set_new_key_on_root_changes_nothing() {
    let state = Object::from_iter([("a", 1)]);
    let target = Value::from(state.clone());
    let ob = observe(&target, true).unwrap();

    let effect = {
        let target = target.clone();
        Effect::new(move || target.track())
    };

    let err = set(&target, "b", Value::from(2)).unwrap_err();
    assert!(matches!(err, ObserveError::RootKeyAddition { ref key } if key == "b"));
    assert!(!state.has_own("b"));
    assert_eq!(effect.run_count(), 1);
    assert_eq!(ob.root_count(), 1);
}

#[test]
fn del_notifies_only_when_observed_and_present() {
    let inner = Object::from_iter([("a", 1)]);
    let state = Object::from_iter([("inner", inner.clone())]);
    observed(&state);

    let effect = {
        let state = state.clone();
        Effect::new(move || {
            state.get("inner");
        })
    };

    del(&Value::from(inner.clone()), "missing").unwrap();
    assert_eq!(effect.run_count(), 1);

    del(&Value::from(inner.clone()), "a").unwrap();
    assert_eq!(effect.run_count(), 2);
    assert!(!inner.has_own("a"));

    // An unobserved object is changed without anyone to notify.
    let plain = Object::from_iter([("a", 1)]);
    del(&Value::from(plain.clone()), "a").unwrap();
    assert!(plain.is_empty());
}

#[test]
fn non_configurable_property_is_not_deleted() {
    let obj = Object::new();
    obj.define_data(
        "fixed",
        Value::from(1),
        Attributes {
            enumerable: true,
            configurable: false,
        },
    );
    let target = observed(&obj);

    let effect = {
        let target = target.clone();
        Effect::new(move || target.track())
    };

    del(&target, "fixed").unwrap();
    assert!(obj.has_own("fixed"));
    assert!(!obj.is_reactive("fixed"));
    assert_eq!(effect.run_count(), 1);
}

#[test]
fn untracked_reads_register_nothing() {
    let state = Object::from_iter([("a", 1)]);
    observed(&state);

    let effect = {
        let state = state.clone();
        Effect::new(move || {
            untracked(|| state.get("a"));
        })
    };

    assert_eq!(effect.dependency_count(), 0);
    state.assign("a", Value::from(2));
    assert_eq!(effect.run_count(), 1);
}

#[test]
fn computed_feeds_effect_through_nested_evaluation() {
    let state = Object::from_iter([("n", 2)]);
    observed(&state);

    let doubled = {
        let state = state.clone();
        Computed::new(move || state.get("n").and_then(|v| v.as_f64()).unwrap_or_default() * 2.0)
    };

    let seen = Rc::new(RefCell::new(Vec::new()));
    let effect = {
        let (doubled, seen) = (doubled.clone(), seen.clone());
        Effect::new(move || seen.borrow_mut().push(doubled.get()))
    };

    // The effect subscribed to `n` through the computed value.
    assert_eq!(effect.dependency_count(), 1);

    state.assign("n", Value::from(5));
    assert_eq!(*seen.borrow(), vec![4.0, 10.0]);
    assert_eq!(doubled.evaluations(), 2);
    assert!(!TrackingContext::is_active());
}

/// An effect that writes the field it reads re-runs until the value
/// settles, and stays subscribed for later writes.
#[test]
fn effect_writing_what_it_reads_stays_subscribed() {
    let state = Object::from_iter([("a", 0)]);
    observed(&state);

    let effect = {
        let state = state.clone();
        Effect::new(move || {
            let a = state.get("a").and_then(|v| v.as_f64()).unwrap_or_default();
            if (1.0..3.0).contains(&a) {
                state.assign("a", Value::from(a + 1.0));
            }
        })
    };
    let dep = state.field("a").unwrap().dep().clone();

    state.assign("a", Value::from(1));
    assert_eq!(state.get("a"), Some(Value::from(3)));
    assert_eq!(effect.run_count(), 4);
    assert_eq!(effect.dependency_count(), 1);
    assert_eq!(dep.subscriber_count(), 1);

    state.assign("a", Value::from(10));
    assert_eq!(effect.run_count(), 5);
}

/// One effect's re-run writes a field another effect reads.
#[test]
fn chained_effects_propagate_within_one_pass() {
    let state = Object::from_iter([("input", 1), ("output", 0)]);
    observed(&state);

    let writer = {
        let state = state.clone();
        Effect::new(move || {
            let input = state.get("input").and_then(|v| v.as_f64()).unwrap_or_default();
            state.assign("output", Value::from(input * 10.0));
        })
    };
    let seen = Rc::new(RefCell::new(Vec::new()));
    let reader = {
        let (state, seen) = (state.clone(), seen.clone());
        Effect::new(move || seen.borrow_mut().push(state.get("output").unwrap()))
    };

    state.assign("input", Value::from(2));

    assert_eq!(writer.run_count(), 2);
    assert_eq!(reader.run_count(), 2);
    assert_eq!(*seen.borrow(), vec![Value::from(10), Value::from(20)]);
    assert!(!TrackingContext::is_active());
}

/// Records the order updates arrive in.
struct Ordered {
    id: ConsumerId,
    log: Rc<RefCell<Vec<u64>>>,
}

impl Consumer for Ordered {
    fn id(&self) -> ConsumerId {
        self.id
    }

    fn add_dep(&self, _dep: &Rc<Dep>) {}

    fn update(&self) {
        self.log.borrow_mut().push(self.id.raw());
    }
}

#[test]
fn field_notification_runs_in_creation_order() {
    let state = Object::from_iter([("a", 1)]);
    observed(&state);
    let dep = state.field("a").unwrap().dep().clone();

    let log = Rc::new(RefCell::new(Vec::new()));
    let early = Rc::new(Ordered {
        id: ConsumerId::new(),
        log: log.clone(),
    });
    let late = Rc::new(Ordered {
        id: ConsumerId::new(),
        log: log.clone(),
    });
    dep.add_sub(late.clone());
    dep.add_sub(early.clone());

    state.assign("a", Value::from(2));
    assert_eq!(*log.borrow(), vec![early.id.raw(), late.id.raw()]);
}

#[test]
fn panicking_effect_leaves_context_clean() {
    let state = Object::from_iter([("a", 1)]);
    observed(&state);
    let armed = Rc::new(Cell::new(false));

    let _effect = {
        let (state, armed) = (state.clone(), armed.clone());
        Effect::new(move || {
            state.get("a");
            if armed.get() {
                panic!("derivation failed");
            }
        })
    };

    armed.set(true);
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        state.assign("a", Value::from(2));
    }));

    assert!(result.is_err());
    assert!(!TrackingContext::is_active());
    assert_eq!(TrackingContext::depth(), 0);
}

#[test]
fn json_round_trip_through_observed_tree() {
    let value = Value::from_json(json!({ "todos": [{ "title": "write", "done": false }] }));
    observe(&value, false);

    let todos = value.as_object().unwrap().get("todos").unwrap();
    let first = todos.as_array().unwrap().get(0).unwrap();
    first.as_object().unwrap().assign("done", Value::from(true));

    assert_eq!(
        value.to_json(),
        json!({ "todos": [{ "title": "write", "done": true }] })
    );
}
