//! Consumer types for the reactive system.
//!
//! A Consumer is any derivation that reads observed data: a render pass,
//! a cached computation, or a side effect. The core only ever talks to a
//! consumer through the [`Consumer`] trait; scheduling and batching of
//! `update` calls belong to whoever implements it.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use smallvec::SmallVec;

use super::dep::{Dep, DepId};

/// Unique, creation-ordered identifier for a consumer.
///
/// Consumers created earlier get smaller ids. [`Dep::notify`] uses this
/// ordering as a stand-in for topological order when nothing else
/// orders the notification pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConsumerId(u64);

impl ConsumerId {
    /// Generate a new unique consumer ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for ConsumerId {
    fn default() -> Self {
        Self::new()
    }
}

/// A derivation that can subscribe to dependency subjects.
pub trait Consumer {
    /// Creation-ordered id, used as the fallback firing order.
    fn id(&self) -> ConsumerId;

    /// Record that the current evaluation read `dep`.
    ///
    /// Called from [`Dep::depend`]. Must be idempotent within one
    /// evaluation cycle: the subject does not deduplicate.
    fn add_dep(&self, dep: &Rc<Dep>);

    /// One of the subjects this consumer subscribed to changed.
    fn update(&self);
}

/// Compare two consumers by identity.
pub(crate) fn same_consumer(a: &Rc<dyn Consumer>, b: &Rc<dyn Consumer>) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

/// Per-cycle dependency bookkeeping shared by the bundled consumers.
///
/// Holds the deps collected by the previous evaluation and the ones being
/// collected by the current one. After an evaluation, [`DepTracker::cleanup`]
/// unsubscribes from every dep the new run no longer read.
#[derive(Default)]
pub struct DepTracker {
    deps: SmallVec<[Rc<Dep>; 8]>,
    dep_ids: HashSet<DepId>,
    new_deps: SmallVec<[Rc<Dep>; 8]>,
    new_dep_ids: HashSet<DepId>,
}

impl DepTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `dep` for the running cycle.
    ///
    /// Returns `true` when `owner` has to be subscribed to `dep`, i.e. the
    /// dep is new to this cycle and was not already subscribed last cycle.
    pub fn add(&mut self, dep: &Rc<Dep>) -> bool {
        let id = dep.id();
        if !self.new_dep_ids.insert(id) {
            return false;
        }
        self.new_deps.push(Rc::clone(dep));
        !self.dep_ids.contains(&id)
    }

    /// Finish a cycle: drop subscriptions the cycle did not renew and make
    /// the collected set current.
    pub fn cleanup(&mut self, owner: &Rc<dyn Consumer>) {
        for dep in &self.deps {
            if !self.new_dep_ids.contains(&dep.id()) {
                dep.remove_sub(owner);
            }
        }
        self.deps = std::mem::take(&mut self.new_deps);
        self.dep_ids = std::mem::take(&mut self.new_dep_ids);
    }

    /// Unsubscribe `owner` from everything, including deps subscribed by
    /// a cycle still in progress.
    pub fn clear(&mut self, owner: &Rc<dyn Consumer>) {
        for dep in self.deps.drain(..) {
            dep.remove_sub(owner);
        }
        for dep in self.new_deps.drain(..) {
            if !self.dep_ids.contains(&dep.id()) {
                dep.remove_sub(owner);
            }
        }
        self.dep_ids.clear();
        self.new_dep_ids.clear();
    }

    /// Deps collected by the last finished cycle.
    pub fn deps(&self) -> &[Rc<Dep>] {
        &self.deps
    }

    pub fn len(&self) -> usize {
        self.deps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deps.is_empty()
    }
}

/// Finishes the tracker's cycle when dropped.
///
/// An evaluation that unwinds still commits the deps it read, so the
/// subscriptions made during the run stay accounted for.
pub(crate) struct CycleGuard<'a> {
    deps: &'a RefCell<DepTracker>,
    owner: &'a Rc<dyn Consumer>,
}

impl<'a> CycleGuard<'a> {
    pub(crate) fn new(deps: &'a RefCell<DepTracker>, owner: &'a Rc<dyn Consumer>) -> Self {
        Self { deps, owner }
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut deps) = self.deps.try_borrow_mut() {
            deps.cleanup(self.owner);
        }
    }
}
