//! Structural Observer
//!
//! An [`Observer`] is attached to a container the first time it is
//! observed and lives as long as the container. It owns the container's
//! structural subject, fired when keys are added or removed or when an
//! array is mutated, and counts how many roots use the container as their
//! top-level state.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use super::array::Array;
use super::field::define_reactive;
use super::object::Object;
use super::value::Value;
use crate::reactive::Dep;

thread_local! {
    static SHOULD_OBSERVE: Cell<bool> = const { Cell::new(true) };
}

/// Suspend (`false`) or resume (`true`) instrumentation of new containers.
///
/// Containers that are already observed stay observed. The switch covers
/// the current thread, which is the whole reactive world: no observed
/// handle can leave its thread.
pub fn toggle_observing(enabled: bool) {
    SHOULD_OBSERVE.with(|flag| flag.set(enabled));
}

/// Whether new containers are instrumented right now.
pub fn should_observe() -> bool {
    SHOULD_OBSERVE.with(Cell::get)
}

/// Per-container instrumentation record.
pub struct Observer {
    dep: Rc<Dep>,
    root_count: Cell<usize>,
}

impl Observer {
    fn new() -> Rc<Self> {
        Rc::new(Self {
            dep: Dep::new(),
            root_count: Cell::new(0),
        })
    }

    /// The structural subject: "this container's shape changed".
    pub fn dep(&self) -> &Rc<Dep> {
        &self.dep
    }

    /// How many roots use this container as their top-level state.
    ///
    /// A root refuses dynamic key addition and deletion.
    pub fn root_count(&self) -> usize {
        self.root_count.get()
    }
}

impl fmt::Debug for Observer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer")
            .field("dep", &self.dep.id())
            .field("root_count", &self.root_count())
            .finish()
    }
}

/// Instrument `value` and return its observer.
///
/// Idempotent: an already observed container returns its existing
/// observer. Returns `None` without complaint for primitives and opaque
/// values, for exempt or non-extensible containers, and while observing
/// is toggled off. `as_root` marks the container as a root.
pub fn observe(value: &Value, as_root: bool) -> Option<Rc<Observer>> {
    let ob = match value {
        Value::Object(obj) => observe_object(obj),
        Value::Array(arr) => observe_array(arr),
        _ => None,
    }?;
    if as_root {
        ob.root_count.set(ob.root_count.get() + 1);
    }
    Some(ob)
}

fn observe_object(obj: &Object) -> Option<Rc<Observer>> {
    if let Some(ob) = obj.observer() {
        return Some(ob);
    }
    if !should_observe() || !obj.is_extensible() || obj.is_exempt() {
        return None;
    }

    let ob = Observer::new();
    // Attach first so self-references find the observer.
    obj.attach_observer(Rc::clone(&ob));
    trace!(dep = ob.dep.id().raw(), "observing object");

    for key in obj.keys() {
        define_reactive(obj, &key, None, None, false);
    }
    Some(ob)
}

fn observe_array(arr: &Array) -> Option<Rc<Observer>> {
    if let Some(ob) = arr.observer() {
        return Some(ob);
    }
    if !should_observe() || !arr.is_extensible() || arr.is_exempt() {
        return None;
    }

    let ob = Observer::new();
    arr.attach_observer(Rc::clone(&ob));
    trace!(dep = ob.dep.id().raw(), len = arr.len(), "observing array");

    for item in arr.to_vec() {
        observe(&item, false);
    }
    Some(ob)
}
