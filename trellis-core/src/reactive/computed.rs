//! Computed Implementation
//!
//! A Computed is a cached derived value that re-evaluates only after one
//! of the subjects it read has fired.
//!
//! # How Computed Values Work
//!
//! 1. On first access, the computation runs inside its own tracking entry
//!    and the result is cached.
//!
//! 2. When a dependency fires, `update` only marks the value dirty.
//!
//! 3. The next `get` re-evaluates. Because that evaluation pushes its own
//!    entry on the tracking stack, a computed value read from inside an
//!    effect is a nested evaluation; the effect's entry is restored after.
//!
//! 4. After evaluating, `get` re-publishes the computed value's deps to the
//!    enclosing consumer, so the outer consumer subscribes to the same
//!    underlying subjects. Computed values are created before the consumers
//!    reading them, so the id-ordered notification pass dirties them first.

use std::cell::{Cell, RefCell};
use std::fmt::Debug;
use std::rc::{Rc, Weak};

use super::consumer::{Consumer, ConsumerId, CycleGuard, DepTracker};
use super::context::TrackingContext;
use super::dep::Dep;

/// A cached derived value that recomputes lazily when dependencies change.
pub struct Computed<T>
where
    T: Clone + 'static,
{
    id: ConsumerId,
    this: Weak<Computed<T>>,

    /// The computation function.
    compute: Box<dyn Fn() -> T>,

    /// The cached value (None if never computed).
    value: RefCell<Option<T>>,

    dirty: Cell<bool>,

    /// Set while the computation is on the stack.
    evaluating: Cell<bool>,

    deps: RefCell<DepTracker>,

    /// Number of evaluations so far.
    evaluations: Cell<usize>,
}

impl<T> Computed<T>
where
    T: Clone + 'static,
{
    /// Create a new computed value.
    ///
    /// The computation is not run immediately. It runs on first access.
    pub fn new<F>(compute: F) -> Rc<Self>
    where
        F: Fn() -> T + 'static,
    {
        Rc::new_cyclic(|this| Self {
            id: ConsumerId::new(),
            this: this.clone(),
            compute: Box::new(compute),
            value: RefCell::new(None),
            dirty: Cell::new(true),
            evaluating: Cell::new(false),
            deps: RefCell::new(DepTracker::new()),
            evaluations: Cell::new(0),
        })
    }

    fn as_consumer(&self) -> Option<Rc<dyn Consumer>> {
        self.this.upgrade().map(|rc| rc as Rc<dyn Consumer>)
    }

    /// Get the current value, recomputing if necessary.
    pub fn get(&self) -> T {
        if self.dirty.get() || self.value.borrow().is_none() {
            self.evaluate();
        }
        if TrackingContext::is_active() {
            self.depend();
        }
        self.value
            .borrow()
            .clone()
            .unwrap_or_else(|| (self.compute)())
    }

    /// Run the computation and cache the result.
    ///
    /// The dirty flag is cleared before the computation runs, so a dep
    /// firing mid-evaluation leaves the value dirty for the next `get`. A
    /// nested evaluation of the same value is skipped.
    fn evaluate(&self) {
        if self.evaluating.get() {
            return;
        }
        let Some(me) = self.as_consumer() else {
            return;
        };

        self.evaluating.set(true);
        let _evaluating = EvaluatingGuard {
            evaluating: &self.evaluating,
            dirty: &self.dirty,
        };
        self.dirty.set(false);

        let value = {
            let _cycle = CycleGuard::new(&self.deps, &me);
            let _ctx = TrackingContext::enter(Some(Rc::clone(&me)));
            (self.compute)()
        };

        *self.value.borrow_mut() = Some(value);
        self.evaluations.set(self.evaluations.get() + 1);
    }

    /// Register every dep of this value with the active consumer.
    pub fn depend(&self) {
        let deps: Vec<Rc<Dep>> = self.deps.borrow().deps().to_vec();
        for dep in deps {
            dep.depend();
        }
    }

    /// Whether the next `get` will re-evaluate.
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// Number of times the computation has run.
    pub fn evaluations(&self) -> usize {
        self.evaluations.get()
    }

    /// Check if a value has been cached.
    pub fn has_value(&self) -> bool {
        self.value.borrow().is_some()
    }
}

impl<T> Consumer for Computed<T>
where
    T: Clone + 'static,
{
    fn id(&self) -> ConsumerId {
        self.id
    }

    fn add_dep(&self, dep: &Rc<Dep>) {
        let subscribe = self.deps.borrow_mut().add(dep);
        if subscribe {
            if let Some(me) = self.as_consumer() {
                dep.add_sub(me);
            }
        }
    }

    fn update(&self) {
        self.dirty.set(true);
    }
}

impl<T> Debug for Computed<T>
where
    T: Clone + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Computed")
            .field("id", &self.id)
            .field("dirty", &self.is_dirty())
            .field("value", &self.value.borrow())
            .finish()
    }
}

/// Clears the evaluating flag when an evaluation ends. An unwinding
/// evaluation leaves the value dirty.
struct EvaluatingGuard<'a> {
    evaluating: &'a Cell<bool>,
    dirty: &'a Cell<bool>,
}

impl Drop for EvaluatingGuard<'_> {
    fn drop(&mut self) {
        self.evaluating.set(false);
        if std::thread::panicking() {
            self.dirty.set(true);
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
