//! Mutation API
//!
//! [`set`] and [`del`] are the sanctioned ways to add or remove keys after
//! a container has been observed. Plain [`Object::assign`] on a new key
//! creates a slot nobody tracks; these functions route the change through
//! field instrumentation and the structural subject instead.

use tracing::debug;

use super::array::MAX_LENGTH;
use super::field::define_reactive;
use super::object::Object;
use super::value::Value;
use crate::error::{report, ObserveError, Result};

/// Address inside a container: an array index or an object key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Index(usize),
    Name(String),
}

impl Key {
    /// The key as an array index, if it is one.
    ///
    /// A name counts as an index when it spells a finite, non-negative,
    /// integral number: `"3"`, `"3.0"` and `"3e0"` all address element 3.
    /// Names too large for `usize` saturate, and are then refused by the
    /// length limit.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Key::Index(index) => Some(*index),
            Key::Name(name) => {
                let name = name.trim();
                if let Ok(index) = name.parse::<usize>() {
                    return Some(index);
                }
                let n: f64 = name.parse().ok()?;
                (n.is_finite() && n >= 0.0 && n.fract() == 0.0).then_some(n as usize)
            }
        }
    }

    /// The key as an object property name.
    pub fn into_name(self) -> String {
        match self {
            Key::Index(index) => index.to_string(),
            Key::Name(name) => name,
        }
    }
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Key::Index(index)
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Name(name.to_owned())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Name(name)
    }
}

/// Set `key` on `target`, making it reactive when it is new.
///
/// - Array index: the array grows to fit and the write goes through
///   `splice`, so the new element is observed and the array notifies.
/// - Existing own key: plain assignment.
/// - Index at or beyond [`MAX_LENGTH`]: refused, the array is unchanged.
/// - New key on a root (or exempt) object: refused.
/// - New key on a non-extensible object: refused.
/// - New key on an unobserved object: plain assignment.
/// - New key on an observed object: a reactive field is defined and the
///   object's structural subject fires.
///
/// Returns the value written. An `Err` means nothing changed.
pub fn set(target: &Value, key: impl Into<Key>, value: Value) -> Result<Value> {
    let key = key.into();
    match target {
        Value::Array(arr) => {
            let Some(index) = key.as_index() else {
                return Err(report(ObserveError::NonIndexKey {
                    op: "set",
                    key: key.into_name(),
                }));
            };
            if index >= MAX_LENGTH || !arr.grow_to(index) {
                return Err(report(ObserveError::IndexOutOfRange { index }));
            }
            arr.splice(index, 1, vec![value.clone()]);
            Ok(value)
        }
        Value::Object(obj) => set_property(obj, key.into_name(), value),
        other => Err(report(ObserveError::InvalidTarget {
            op: "set",
            found: other.type_name(),
        })),
    }
}

fn set_property(obj: &Object, key: String, value: Value) -> Result<Value> {
    if obj.has_own(&key) {
        obj.assign(&key, value.clone());
        return Ok(value);
    }

    let ob = obj.observer();
    if obj.is_exempt() || ob.as_ref().is_some_and(|ob| ob.root_count() > 0) {
        return Err(report(ObserveError::RootKeyAddition { key }));
    }
    if !obj.is_extensible() {
        return Err(report(ObserveError::NotExtensible { key }));
    }
    let Some(ob) = ob else {
        obj.assign(&key, value.clone());
        return Ok(value);
    };

    define_reactive(obj, &key, Some(value.clone()), None, false);
    debug!(key = %key, "reactive key added");
    ob.dep().notify();
    Ok(value)
}

/// Delete `key` from `target`, notifying when the container is observed.
///
/// Array indices are removed through `splice`. Deleting a missing key or a
/// non-configurable one does nothing. Root (or exempt) objects refuse.
pub fn del(target: &Value, key: impl Into<Key>) -> Result<()> {
    let key = key.into();
    match target {
        Value::Array(arr) => {
            let Some(index) = key.as_index() else {
                return Err(report(ObserveError::NonIndexKey {
                    op: "delete",
                    key: key.into_name(),
                }));
            };
            arr.splice(index, 1, Vec::new());
            Ok(())
        }
        Value::Object(obj) => {
            let key = key.into_name();
            let ob = obj.observer();
            if obj.is_exempt() || ob.as_ref().is_some_and(|ob| ob.root_count() > 0) {
                return Err(report(ObserveError::RootKeyDeletion { key }));
            }
            if !obj.remove_own(&key) {
                return Ok(());
            }
            if let Some(ob) = ob {
                debug!(key = %key, "reactive key deleted");
                ob.dep().notify();
            }
            Ok(())
        }
        other => Err(report(ObserveError::InvalidTarget {
            op: "delete",
            found: other.type_name(),
        })),
    }
}
