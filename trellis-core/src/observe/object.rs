//! Keyed containers.
//!
//! An [`Object`] is a shared handle to an insertion-ordered property table.
//! Plain properties are data slots or accessor pairs; once the object is
//! observed every enumerable key becomes a [`ReactiveField`] that tracks
//! reads and notifies on writes. All access goes through the handle, so the
//! bookkeeping a reflective runtime would hide inside rewritten accessors
//! is explicit here.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::field::ReactiveField;
use super::observer::Observer;
use super::value::Value;

/// Custom getter for an accessor property.
pub type Getter = Rc<dyn Fn() -> Value>;

/// Custom setter for an accessor property.
pub type Setter = Rc<dyn Fn(Value)>;

/// Property attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attributes {
    /// Listed by [`Object::keys`] and instrumented by `observe`.
    pub enumerable: bool,
    /// Can be redefined, made reactive, or deleted.
    pub configurable: bool,
}

impl Attributes {
    pub const PLAIN: Attributes = Attributes {
        enumerable: true,
        configurable: true,
    };
}

impl Default for Attributes {
    fn default() -> Self {
        Self::PLAIN
    }
}

#[derive(Clone)]
pub(crate) enum Property {
    Data {
        value: Value,
        attrs: Attributes,
    },
    Accessor {
        getter: Option<Getter>,
        setter: Option<Setter>,
        attrs: Attributes,
    },
    Reactive(Rc<ReactiveField>),
}

impl Property {
    fn attrs(&self) -> Attributes {
        match self {
            Property::Data { attrs, .. } | Property::Accessor { attrs, .. } => *attrs,
            Property::Reactive(_) => Attributes::PLAIN,
        }
    }
}

struct ObjectData {
    props: IndexMap<String, Property>,
    observer: Option<Rc<Observer>>,
    extensible: bool,
    exempt: bool,
}

/// Shared handle to a keyed container.
///
/// Cloning the handle does not copy the table.
#[derive(Clone)]
pub struct Object(Rc<RefCell<ObjectData>>);

impl Object {
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(ObjectData {
            props: IndexMap::new(),
            observer: None,
            extensible: true,
            exempt: false,
        })))
    }

    /// Read `key`.
    ///
    /// Reactive fields register dependencies with the active consumer.
    /// Returns `None` when there is no such own property.
    pub fn get(&self, key: &str) -> Option<Value> {
        let prop = self.property(key)?;
        Some(match prop {
            Property::Data { value, .. } => value,
            Property::Accessor { getter, .. } => getter.map(|g| g()).unwrap_or_default(),
            Property::Reactive(field) => field.get(),
        })
    }

    /// Plain assignment, `obj[key] = value`.
    ///
    /// Reactive fields and custom setters handle the write themselves. An
    /// accessor without a setter drops it. A missing key becomes a plain
    /// data slot when the object is extensible; it is *not* reactive, use
    /// [`set`](super::set) for that.
    pub fn assign(&self, key: &str, value: Value) {
        match self.property(key) {
            Some(Property::Reactive(field)) => field.set(value),
            Some(Property::Accessor { setter, .. }) => {
                if let Some(setter) = setter {
                    setter(value);
                }
            }
            Some(Property::Data { .. }) => {
                if let Some(Property::Data { value: slot, .. }) =
                    self.0.borrow_mut().props.get_mut(key)
                {
                    *slot = value;
                }
            }
            None => {
                self.define_data(key, value, Attributes::PLAIN);
            }
        }
    }

    /// Define a plain enumerable, configurable data slot.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) -> bool {
        self.define_data(key, value.into(), Attributes::PLAIN)
    }

    /// Define a data slot, replacing whatever was there.
    ///
    /// Returns `false` without changing anything when the existing property
    /// is non-configurable, or the key is new and the object is not
    /// extensible.
    pub fn define_data(&self, key: impl Into<String>, value: Value, attrs: Attributes) -> bool {
        self.define(key.into(), Property::Data { value, attrs })
    }

    /// Define an accessor pair, replacing whatever was there.
    pub fn define_accessor(
        &self,
        key: impl Into<String>,
        getter: Option<Getter>,
        setter: Option<Setter>,
        attrs: Attributes,
    ) -> bool {
        self.define(key.into(), Property::Accessor { getter, setter, attrs })
    }

    fn define(&self, key: String, prop: Property) -> bool {
        let mut data = self.0.borrow_mut();
        match data.props.get(&key) {
            Some(existing) if !existing.attrs().configurable => return false,
            None if !data.extensible => return false,
            _ => {}
        }
        data.props.insert(key, prop);
        true
    }

    pub fn has_own(&self, key: &str) -> bool {
        self.0.borrow().props.contains_key(key)
    }

    /// Enumerable own keys, in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.0
            .borrow()
            .props
            .iter()
            .filter(|(_, prop)| prop.attrs().enumerable)
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Number of own properties, enumerable or not.
    pub fn len(&self) -> usize {
        self.0.borrow().props.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().props.is_empty()
    }

    /// Whether `key` is a reactive field.
    pub fn is_reactive(&self, key: &str) -> bool {
        self.field(key).is_some()
    }

    /// The reactive field behind `key`, if it is one.
    pub fn field(&self, key: &str) -> Option<Rc<ReactiveField>> {
        match self.property(key)? {
            Property::Reactive(field) => Some(field),
            _ => None,
        }
    }

    /// Forbid new keys. Non-extensible objects are never instrumented.
    pub fn prevent_extensions(&self) {
        self.0.borrow_mut().extensible = false;
    }

    pub fn is_extensible(&self) -> bool {
        self.0.borrow().extensible
    }

    /// Exclude this object from instrumentation and dynamic keys.
    pub fn mark_exempt(&self) {
        self.0.borrow_mut().exempt = true;
    }

    pub fn is_exempt(&self) -> bool {
        self.0.borrow().exempt
    }

    pub fn observer(&self) -> Option<Rc<Observer>> {
        self.0.borrow().observer.clone()
    }

    /// Whether both handles point at the same object.
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn property(&self, key: &str) -> Option<Property> {
        self.0.borrow().props.get(key).cloned()
    }

    /// Install a reactive field, keeping the key's position.
    pub(crate) fn put_field(&self, key: &str, field: Rc<ReactiveField>) {
        let mut data = self.0.borrow_mut();
        match data.props.get_mut(key) {
            Some(slot) => *slot = Property::Reactive(field),
            None => {
                data.props.insert(key.to_owned(), Property::Reactive(field));
            }
        }
    }

    pub(crate) fn attach_observer(&self, observer: Rc<Observer>) {
        self.0.borrow_mut().observer = Some(observer);
    }

    /// Remove an own property, preserving the order of the rest.
    ///
    /// Non-configurable properties stay; returns whether anything went.
    pub(crate) fn remove_own(&self, key: &str) -> bool {
        let mut data = self.0.borrow_mut();
        match data.props.get(key) {
            Some(prop) if prop.attrs().configurable => {
                data.props.shift_remove(key);
                true
            }
            _ => false,
        }
    }
}

impl Default for Object {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> FromIterator<(K, V)> for Object
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let obj = Object::new();
        for (key, value) in iter {
            obj.insert(key, value);
        }
        obj
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.0.borrow();
        f.debug_struct("Object")
            .field("keys", &data.props.keys().collect::<Vec<_>>())
            .field("observed", &data.observer.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn insert_and_get() {
        let obj = Object::from_iter([("a", 1), ("b", 2)]);

        assert_eq!(obj.get("a"), Some(Value::from(1)));
        assert_eq!(obj.get("missing"), None);
        assert_eq!(obj.keys(), vec!["a", "b"]);
    }

    #[test]
    fn assign_creates_plain_slot() {
        let obj = Object::new();
        obj.assign("x", Value::from(3));

        assert_eq!(obj.get("x"), Some(Value::from(3)));
        assert!(!obj.is_reactive("x"));
    }

    #[test]
    fn assign_respects_extensibility() {
        let obj = Object::from_iter([("a", 1)]);
        obj.prevent_extensions();

        obj.assign("b", Value::from(2));
        obj.assign("a", Value::from(5));

        assert!(!obj.has_own("b"));
        assert_eq!(obj.get("a"), Some(Value::from(5)));
    }

    #[test]
    fn accessor_routes_reads_and_writes() {
        let backing = Rc::new(Cell::new(1.0));
        let obj = Object::new();
        obj.define_accessor(
            "n",
            Some({
                let backing = backing.clone();
                Rc::new(move || Value::from(backing.get()))
            }),
            Some({
                let backing = backing.clone();
                Rc::new(move |v: Value| backing.set(v.as_f64().unwrap_or_default()))
            }),
            Attributes::PLAIN,
        );

        assert_eq!(obj.get("n"), Some(Value::from(1)));
        obj.assign("n", Value::from(4));
        assert_eq!(backing.get(), 4.0);
    }

    #[test]
    fn non_configurable_cannot_be_redefined_or_removed() {
        let obj = Object::new();
        let fixed = Attributes {
            enumerable: true,
            configurable: false,
        };
        assert!(obj.define_data("k", Value::from(1), fixed));

        assert!(!obj.insert("k", 2));
        assert!(!obj.remove_own("k"));
        assert_eq!(obj.get("k"), Some(Value::from(1)));
    }

    #[test]
    fn keys_skip_non_enumerable() {
        let obj = Object::new();
        obj.insert("shown", 1);
        obj.define_data(
            "hidden",
            Value::from(2),
            Attributes {
                enumerable: false,
                configurable: true,
            },
        );

        assert_eq!(obj.keys(), vec!["shown"]);
        assert_eq!(obj.len(), 2);
    }

    #[test]
    fn remove_keeps_order() {
        let obj = Object::from_iter([("a", 1), ("b", 2), ("c", 3)]);
        assert!(obj.remove_own("b"));
        assert_eq!(obj.keys(), vec!["a", "c"]);
    }
}
