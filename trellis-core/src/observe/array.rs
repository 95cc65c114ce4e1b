//! Sequences and their mutation proxy.
//!
//! Element reads on an [`Array`] are never tracked individually; reading
//! the array through a reactive field depends on the whole array instead.
//! Every structural mutation goes through one of the methods here. On an
//! observed array each of them instruments the inserted elements and then
//! fires the array's structural subject exactly once.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use super::observer::{observe, Observer};
use super::value::Value;

/// Largest length an array can grow to through an index write.
pub const MAX_LENGTH: usize = u32::MAX as usize;

struct ArrayData {
    items: Vec<Value>,
    observer: Option<Rc<Observer>>,
    extensible: bool,
    exempt: bool,
}

/// Shared handle to a sequence.
#[derive(Clone)]
pub struct Array(Rc<RefCell<ArrayData>>);

impl Array {
    pub fn new() -> Self {
        Self::from(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.borrow().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.borrow().items.is_empty()
    }

    /// Untracked element read.
    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.borrow().items.get(index).cloned()
    }

    /// Copy of the current elements, untracked.
    pub fn to_vec(&self) -> Vec<Value> {
        self.0.borrow().items.clone()
    }

    /// Append one element. Returns the new length.
    pub fn push(&self, value: Value) -> usize {
        let len = {
            let mut data = self.0.borrow_mut();
            data.items.push(value.clone());
            data.items.len()
        };
        self.mutated("push", std::slice::from_ref(&value));
        len
    }

    pub fn pop(&self) -> Option<Value> {
        let popped = self.0.borrow_mut().items.pop();
        self.mutated("pop", &[]);
        popped
    }

    /// Remove the first element.
    pub fn shift(&self) -> Option<Value> {
        let shifted = {
            let mut data = self.0.borrow_mut();
            if data.items.is_empty() {
                None
            } else {
                Some(data.items.remove(0))
            }
        };
        self.mutated("shift", &[]);
        shifted
    }

    /// Prepend `items`, keeping their order. Returns the new length.
    pub fn unshift(&self, items: Vec<Value>) -> usize {
        let len = {
            let mut data = self.0.borrow_mut();
            let tail = std::mem::take(&mut data.items);
            data.items = items.iter().cloned().chain(tail).collect();
            data.items.len()
        };
        self.mutated("unshift", &items);
        len
    }

    /// Remove `delete_count` elements at `start` and insert `items` there.
    ///
    /// Both bounds are clamped to the array. Returns the removed elements.
    pub fn splice(&self, start: usize, delete_count: usize, items: Vec<Value>) -> Vec<Value> {
        let removed = {
            let mut data = self.0.borrow_mut();
            let start = start.min(data.items.len());
            let end = start + delete_count.min(data.items.len() - start);
            data.items
                .splice(start..end, items.iter().cloned())
                .collect::<Vec<_>>()
        };
        self.mutated("splice", &items);
        removed
    }

    /// Replace the element at `index`, appending when `index == len`.
    pub fn replace(&self, index: usize, value: Value) -> Option<Value> {
        self.splice(index, 1, vec![value]).into_iter().next()
    }

    /// Sort in place.
    ///
    /// The comparator runs on a copy, without the array borrowed; the array
    /// only changes once the sort completes.
    pub fn sort_by<F>(&self, compare: F)
    where
        F: FnMut(&Value, &Value) -> Ordering,
    {
        let mut items = self.to_vec();
        items.sort_by(compare);
        self.0.borrow_mut().items = items;
        self.mutated("sort", &[]);
    }

    pub fn reverse(&self) {
        self.0.borrow_mut().items.reverse();
        self.mutated("reverse", &[]);
    }

    /// Pad with `Null` up to `len` elements, without notifying.
    ///
    /// Returns `false`, leaving the array untouched, when `len` exceeds
    /// [`MAX_LENGTH`] or the allocation cannot be made.
    pub(crate) fn grow_to(&self, len: usize) -> bool {
        let mut data = self.0.borrow_mut();
        let missing = len.saturating_sub(data.items.len());
        if missing == 0 {
            return true;
        }
        if len > MAX_LENGTH || data.items.try_reserve(missing).is_err() {
            return false;
        }
        data.items.resize(len, Value::Null);
        true
    }

    fn mutated(&self, op: &'static str, inserted: &[Value]) {
        let Some(ob) = self.observer() else {
            return;
        };
        for value in inserted {
            observe(value, false);
        }
        trace!(op, inserted = inserted.len(), "observed array mutated");
        ob.dep().notify();
    }

    /// Forbid instrumentation of this array.
    pub fn prevent_extensions(&self) {
        self.0.borrow_mut().extensible = false;
    }

    pub fn is_extensible(&self) -> bool {
        self.0.borrow().extensible
    }

    /// Exclude this array from instrumentation.
    pub fn mark_exempt(&self) {
        self.0.borrow_mut().exempt = true;
    }

    pub fn is_exempt(&self) -> bool {
        self.0.borrow().exempt
    }

    pub fn observer(&self) -> Option<Rc<Observer>> {
        self.0.borrow().observer.clone()
    }

    pub(crate) fn attach_observer(&self, observer: Rc<Observer>) {
        self.0.borrow_mut().observer = Some(observer);
    }

    pub fn ptr_eq(&self, other: &Array) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Default for Array {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Vec<Value>> for Array {
    fn from(items: Vec<Value>) -> Self {
        Self(Rc::new(RefCell::new(ArrayData {
            items,
            observer: None,
            extensible: true,
            exempt: false,
        })))
    }
}

impl<V: Into<Value>> FromIterator<V> for Array {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Self::from(iter.into_iter().map(Into::into).collect::<Vec<_>>())
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.0.borrow();
        f.debug_struct("Array")
            .field("len", &data.items.len())
            .field("observed", &data.observer.is_some())
            .finish()
    }
}
