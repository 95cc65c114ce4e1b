//! Dynamic values stored in observed containers.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use super::array::Array;
use super::field::depend_array;
use super::object::Object;
use super::observer::Observer;
use crate::reactive::{untracked, TrackingContext};

/// Integral numbers below this magnitude are written as JSON integers.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

/// A value that can live in an [`Object`] field or an [`Array`] slot.
///
/// Equality is strict: primitives compare by value (so `NaN != NaN`),
/// containers and opaque values compare by identity.
#[derive(Clone, Default)]
pub enum Value {
    /// Absent or empty slot.
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Object(Object),
    Array(Array),
    /// Host data the observer never instruments.
    Opaque(Rc<dyn Any>),
}

impl Value {
    /// Wrap arbitrary host data as an opaque value.
    pub fn opaque<T: Any>(value: T) -> Self {
        Value::Opaque(Rc::new(value))
    }

    /// Short name of the variant, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Object(_) => "object",
            Value::Array(_) => "array",
            Value::Opaque(_) => "opaque",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_nan(&self) -> bool {
        matches!(self, Value::Number(n) if n.is_nan())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// The container's observer, if this is an instrumented container.
    pub fn observer(&self) -> Option<Rc<Observer>> {
        match self {
            Value::Object(obj) => obj.observer(),
            Value::Array(arr) => arr.observer(),
            _ => None,
        }
    }

    /// Strict equality, with `NaN` treated as equal to itself.
    ///
    /// This is the change test applied by reactive field writes.
    pub fn same_for_change(old: &Value, new: &Value) -> bool {
        old == new || (old.is_nan() && new.is_nan())
    }

    /// Register the edges a field read returning this value would register.
    ///
    /// Depends on the container's structural subject and, for arrays, on
    /// every instrumented element, recursively. Lets a consumer read a
    /// root container as a whole without going through a field.
    pub fn track(&self) {
        if !TrackingContext::is_active() {
            return;
        }
        if let Some(ob) = self.observer() {
            ob.dep().depend();
            if let Value::Array(arr) = self {
                depend_array(arr);
            }
        }
    }

    /// Build a plain, uninstrumented tree from JSON.
    pub fn from_json(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            Json::String(s) => Value::String(s),
            Json::Array(items) => Value::Array(items.into_iter().map(Value::from_json).collect()),
            Json::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Snapshot the tree as JSON without registering dependencies.
    ///
    /// Only enumerable keys are written. Opaque values and non-finite
    /// numbers become `null`. The tree must be acyclic.
    pub fn to_json(&self) -> serde_json::Value {
        untracked(|| self.snapshot())
    }

    fn snapshot(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Value::Null | Value::Opaque(_) => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Number(n) if n.fract() == 0.0 && n.abs() < MAX_SAFE_INTEGER => {
                Json::from(*n as i64)
            }
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::String(s) => Json::String(s.clone()),
            Value::Array(arr) => Json::Array(arr.to_vec().iter().map(Value::snapshot).collect()),
            Value::Object(obj) => {
                let mut map = serde_json::Map::new();
                for key in obj.keys() {
                    let value = obj.get(&key).unwrap_or_default();
                    map.insert(key, value.snapshot());
                }
                Json::Object(map)
            }
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Array(a), Value::Array(b)) => a.ptr_eq(b),
            (Value::Opaque(a), Value::Opaque(b)) => std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b)),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Number(n) => write!(f, "Number({n})"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::Object(obj) => fmt::Debug::fmt(obj, f),
            Value::Array(arr) => fmt::Debug::fmt(arr, f),
            Value::Opaque(_) => f.write_str("Opaque"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n.into())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Object> for Value {
    fn from(obj: Object) -> Self {
        Value::Object(obj)
    }
}

impl From<Array> for Value {
    fn from(arr: Array) -> Self {
        Value::Array(arr)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::from_json(json)
    }
}
