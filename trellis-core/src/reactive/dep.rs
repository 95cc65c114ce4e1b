//! Dependency Subject
//!
//! A [`Dep`] is the notification hub owned by one reactive field or one
//! observed container. Consumers subscribe to it while they evaluate and
//! are told to `update` when it fires.
//!
//! # Ordering
//!
//! `notify` always iterates a snapshot of the subscriber list, because an
//! `update` may re-run a derivation that subscribes to or leaves this same
//! subject. Unless an external scheduler already orders the pass, the
//! snapshot is sorted by consumer id: consumers created earlier run first.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use smallvec::SmallVec;
use tracing::debug;

use super::consumer::{same_consumer, Consumer};
use super::context::TrackingContext;
use crate::config;

/// Unique, creation-ordered identifier for a dependency subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DepId(u64);

impl DepId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// How a notification pass orders its subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOrder {
    /// Ascending consumer id.
    ById,
    /// Subscription order; an external scheduler sorts later.
    AsSubscribed,
}

type Subscribers = SmallVec<[Rc<dyn Consumer>; 4]>;

/// One-to-many notification hub bound to a single field or container.
pub struct Dep {
    id: DepId,
    subs: RefCell<Subscribers>,
}

impl Dep {
    /// Create a new subject with a fresh id.
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            id: DepId::next(),
            subs: RefCell::new(SmallVec::new()),
        })
    }

    pub fn id(&self) -> DepId {
        self.id
    }

    /// Append a subscriber. No deduplication happens here.
    pub fn add_sub(&self, sub: Rc<dyn Consumer>) {
        self.subs.borrow_mut().push(sub);
    }

    /// Remove the first occurrence of `sub`, if any.
    pub fn remove_sub(&self, sub: &Rc<dyn Consumer>) {
        let mut subs = self.subs.borrow_mut();
        if let Some(pos) = subs.iter().position(|s| same_consumer(s, sub)) {
            subs.remove(pos);
        }
    }

    /// Register this subject with the consumer currently being evaluated.
    ///
    /// Does nothing outside a tracking context. The consumer decides
    /// whether it still needs to subscribe.
    pub fn depend(self: &Rc<Self>) {
        if let Some(target) = TrackingContext::current() {
            target.add_dep(self);
        }
    }

    /// Fire every subscriber once, ordered per the global config.
    pub fn notify(&self) {
        let order = if config::config().sort_subscribers {
            NotifyOrder::ById
        } else {
            NotifyOrder::AsSubscribed
        };
        self.notify_in(order);
    }

    /// Fire every subscriber once in the given order.
    pub fn notify_in(&self, order: NotifyOrder) {
        let mut subs: Subscribers = self.subs.borrow().clone();
        if order == NotifyOrder::ById {
            subs.sort_by_key(|s| s.id());
        }
        debug!(dep = self.id.0, subscribers = subs.len(), "notify");
        for sub in subs {
            sub.update();
        }
    }

    /// Get the number of subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subs.borrow().len()
    }
}

impl fmt::Debug for Dep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dep")
            .field("id", &self.id)
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}
