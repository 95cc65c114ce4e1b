//! Effect Implementation
//!
//! An Effect is a side-effecting computation that runs whenever the
//! observed data it read changes.
//!
//! # How Effects Work
//!
//! 1. When created, the effect runs its function immediately inside a
//!    tracking context, subscribing to every subject it reads.
//!
//! 2. When any of those subjects fires, `update` re-runs the function
//!    synchronously.
//!
//! 3. Each run collects a fresh dependency set; subjects the new run no
//!    longer reads are unsubscribed afterwards.
//!
//! 4. A run that writes data it depends on fires its own subjects. The
//!    nested `update` only marks the effect pending; the outer run finishes
//!    its cleanup and then runs again. An effect that keeps invalidating
//!    itself loops until it stops writing.
//!
//! Batching and deferring re-runs is a scheduler concern and is not done
//! here.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use super::consumer::{Consumer, ConsumerId, CycleGuard, DepTracker};
use super::context::TrackingContext;
use super::dep::Dep;

/// A side-effecting computation that re-runs when its dependencies change.
///
/// # Example
///
/// ```rust,ignore
/// let state = Object::from_iter([("count", Value::from(0))]);
/// observe(&Value::from(state.clone()), false);
///
/// let effect = Effect::new(move || {
///     println!("Count is: {:?}", state.get("count"));
/// });
/// ```
pub struct Effect {
    /// Unique, creation-ordered identifier.
    id: ConsumerId,

    this: Weak<Effect>,

    /// The effect function.
    run: Box<dyn Fn()>,

    deps: RefCell<DepTracker>,

    /// Whether the effect has been disposed.
    disposed: Cell<bool>,

    /// Set while the effect function is on the stack.
    running: Cell<bool>,

    /// A dependency fired during the current run.
    pending: Cell<bool>,

    /// Number of times the effect has run.
    run_count: Cell<usize>,
}

/// Clears the running flag when a run ends, including by panic.
struct RunningGuard<'a>(&'a Cell<bool>);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl Effect {
    /// Create a new effect and run it once to establish its dependencies.
    pub fn new<F>(run: F) -> Rc<Self>
    where
        F: Fn() + 'static,
    {
        let effect = Self::new_lazy(run);
        effect.execute();
        effect
    }

    /// Create a new effect without running it immediately.
    pub fn new_lazy<F>(run: F) -> Rc<Self>
    where
        F: Fn() + 'static,
    {
        Rc::new_cyclic(|this| Self {
            id: ConsumerId::new(),
            this: this.clone(),
            run: Box::new(run),
            deps: RefCell::new(DepTracker::new()),
            disposed: Cell::new(false),
            running: Cell::new(false),
            pending: Cell::new(false),
            run_count: Cell::new(0),
        })
    }

    fn as_consumer(&self) -> Option<Rc<dyn Consumer>> {
        self.this.upgrade().map(|rc| rc as Rc<dyn Consumer>)
    }

    /// Run the effect function inside its own tracking context.
    ///
    /// Called while the effect is already running, it only schedules one
    /// more run after the current one.
    pub fn execute(&self) {
        if self.disposed.get() {
            return;
        }
        if self.running.get() {
            self.pending.set(true);
            return;
        }
        let Some(me) = self.as_consumer() else {
            return;
        };

        self.running.set(true);
        let _running = RunningGuard(&self.running);
        loop {
            self.pending.set(false);
            {
                let _cycle = CycleGuard::new(&self.deps, &me);
                let _ctx = TrackingContext::enter(Some(Rc::clone(&me)));
                (self.run)();
            }
            self.run_count.set(self.run_count.get() + 1);

            if !self.pending.get() || self.disposed.get() {
                break;
            }
        }
    }

    /// Dispose of the effect.
    ///
    /// Unsubscribes from every subject; the effect will not run again.
    pub fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        if let Some(me) = self.as_consumer() {
            self.deps.borrow_mut().clear(&me);
        }
    }

    /// Check if the effect has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    /// Get the number of times the effect has run.
    pub fn run_count(&self) -> usize {
        self.run_count.get()
    }

    /// Get the number of subjects the last run subscribed to.
    pub fn dependency_count(&self) -> usize {
        self.deps.borrow().len()
    }
}

impl Consumer for Effect {
    fn id(&self) -> ConsumerId {
        self.id
    }

    fn add_dep(&self, dep: &Rc<Dep>) {
        if self.disposed.get() {
            return;
        }
        let subscribe = self.deps.borrow_mut().add(dep);
        if subscribe {
            if let Some(me) = self.as_consumer() {
                dep.add_sub(me);
            }
        }
    }

    fn update(&self) {
        self.execute();
    }
}

impl std::fmt::Debug for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.id)
            .field("run_count", &self.run_count())
            .field("dependency_count", &self.dependency_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
