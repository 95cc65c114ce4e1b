//! Reactive Field
//!
//! A [`ReactiveField`] replaces one property of an [`Object`]. Reads made
//! while a consumer is evaluating register that consumer with the field's
//! subject (and with the child container's structural subject); accepted
//! writes fire the field's subject once.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::array::Array;
use super::object::{Getter, Object, Property, Setter};
use super::observer::{observe, Observer};
use super::value::Value;
use crate::error::{report, ObserveError};
use crate::reactive::{Dep, TrackingContext};

/// Side channel invoked on every accepted write, before the write lands.
pub type WriteHook = Rc<dyn Fn()>;

/// One instrumented key.
pub struct ReactiveField {
    key: String,
    dep: Rc<Dep>,
    /// Backing slot, unused when a custom getter supplies the value.
    slot: RefCell<Value>,
    getter: Option<Getter>,
    setter: Option<Setter>,
    /// Observer of the current value, when it is a container.
    child: RefCell<Option<Rc<Observer>>>,
    shallow: bool,
    on_write: Option<WriteHook>,
}

impl ReactiveField {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The field's subject: "this value changed".
    pub fn dep(&self) -> &Rc<Dep> {
        &self.dep
    }

    /// Observer of the value currently held, if it is an observed container.
    pub fn child_observer(&self) -> Option<Rc<Observer>> {
        self.child.borrow().clone()
    }

    /// The field has a getter and no setter, so writes are refused.
    pub fn is_read_only(&self) -> bool {
        self.getter.is_some() && self.setter.is_none()
    }

    fn current(&self) -> Value {
        match &self.getter {
            Some(getter) => getter(),
            None => self.slot.borrow().clone(),
        }
    }

    /// Read the value, registering dependencies with the active consumer.
    pub fn get(&self) -> Value {
        let value = self.current();
        if TrackingContext::is_active() {
            self.dep.depend();
            if let Some(child) = self.child_observer() {
                child.dep().depend();
                if let Value::Array(arr) = &value {
                    depend_array(arr);
                }
            }
        }
        value
    }

    /// Write the value and fire the field's subject.
    ///
    /// Writing a value strictly equal to the current one (or `NaN` over
    /// `NaN`) does nothing. A getter-only field reports the write and
    /// drops it.
    pub fn set(&self, new_value: Value) {
        let value = self.current();
        if Value::same_for_change(&value, &new_value) {
            return;
        }
        if let Some(hook) = &self.on_write {
            hook();
        }
        if self.is_read_only() {
            report(ObserveError::ReadOnly {
                key: self.key.clone(),
            });
            return;
        }

        let child = if self.shallow {
            None
        } else {
            observe(&new_value, false)
        };
        match &self.setter {
            Some(setter) => setter(new_value),
            None => *self.slot.borrow_mut() = new_value,
        }
        *self.child.borrow_mut() = child;
        self.dep.notify();
    }
}

impl fmt::Debug for ReactiveField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveField")
            .field("key", &self.key)
            .field("dep", &self.dep.id())
            .field("has_getter", &self.getter.is_some())
            .field("has_setter", &self.setter.is_some())
            .field("shallow", &self.shallow)
            .finish()
    }
}

/// Turn `key` on `obj` into a reactive field.
///
/// `value` seeds the field; when omitted the current property value is
/// used, except for a getter-only accessor, which keeps reading through
/// its getter. Existing getters and setters are preserved. Non-configurable
/// properties, and new keys on non-extensible objects, are left alone.
/// `shallow` stops the stored value from being observed.
pub fn define_reactive(
    obj: &Object,
    key: &str,
    value: Option<Value>,
    on_write: Option<WriteHook>,
    shallow: bool,
) {
    let existing = obj.property(key);
    let (getter, setter): (Option<Getter>, Option<Setter>) = match &existing {
        Some(Property::Data { attrs, .. }) | Some(Property::Accessor { attrs, .. })
            if !attrs.configurable =>
        {
            return
        }
        None if !obj.is_extensible() => return,
        Some(Property::Accessor { getter, setter, .. }) => (getter.clone(), setter.clone()),
        // Redefining a reactive key stacks on top of the old field.
        Some(Property::Reactive(field)) => {
            let read = Rc::clone(field);
            let write = Rc::clone(field);
            let getter: Getter = Rc::new(move || read.get());
            let setter: Setter = Rc::new(move |v: Value| write.set(v));
            (Some(getter), Some(setter))
        }
        _ => (None, None),
    };

    let value = match value {
        Some(value) => value,
        None if getter.is_none() || setter.is_some() => obj.get(key).unwrap_or_default(),
        None => Value::Null,
    };

    let child = if shallow { None } else { observe(&value, false) };
    let field = Rc::new(ReactiveField {
        key: key.to_owned(),
        dep: Dep::new(),
        slot: RefCell::new(value),
        getter,
        setter,
        child: RefCell::new(child),
        shallow,
        on_write,
    });
    obj.put_field(key, field);
}

/// Depend on every observed element of `arr`, recursing into nested arrays.
///
/// Element reads cannot be intercepted per index, so touching an array
/// through a field counts as touching everything in it.
pub(crate) fn depend_array(arr: &Array) {
    for item in arr.to_vec() {
        if let Some(ob) = item.observer() {
            ob.dep().depend();
        }
        if let Value::Array(inner) = &item {
            depend_array(inner);
        }
    }
}
