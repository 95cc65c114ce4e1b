//! Tracking Context
//!
//! The tracking context records which consumer is currently evaluating.
//! Reads of observed data consult it to discover dependencies.
//!
//! # Implementation
//!
//! We use a thread-local stack of targets. Entering a context pushes the
//! consumer (or `None`, to suspend tracking) and returns a guard; dropping
//! the guard pops it. The visible target is always the top of the stack,
//! so a derivation whose read triggers another derivation's evaluation
//! gets its own target back once the inner evaluation returns.

use std::cell::RefCell;
use std::rc::Rc;

use super::consumer::{same_consumer, Consumer};

thread_local! {
    static TARGET_STACK: RefCell<Vec<Option<Rc<dyn Consumer>>>> = const { RefCell::new(Vec::new()) };
}

/// Entry point to the tracking context stack.
pub struct TrackingContext;

/// Guard that pops the context when dropped.
///
/// The pop runs on every exit path, including unwinding out of a failed
/// evaluation, so later reads never see a stale target.
#[must_use = "the tracking context is exited as soon as the guard is dropped"]
pub struct TrackingGuard {
    target: Option<Rc<dyn Consumer>>,
}

impl TrackingContext {
    /// Push `target` and make it the active consumer.
    pub fn enter(target: Option<Rc<dyn Consumer>>) -> TrackingGuard {
        TARGET_STACK.with(|stack| stack.borrow_mut().push(target.clone()));
        TrackingGuard { target }
    }

    /// The consumer currently being evaluated, if any.
    pub fn current() -> Option<Rc<dyn Consumer>> {
        TARGET_STACK.with(|stack| stack.borrow().last().cloned().flatten())
    }

    /// Check if a consumer is currently being evaluated.
    pub fn is_active() -> bool {
        TARGET_STACK.with(|stack| matches!(stack.borrow().last(), Some(Some(_))))
    }

    /// Number of entries on the stack, including `None` entries.
    pub fn depth() -> usize {
        TARGET_STACK.with(|stack| stack.borrow().len())
    }
}

impl Drop for TrackingGuard {
    fn drop(&mut self) {
        TARGET_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();

            // Guards must be dropped in reverse order of creation.
            if let Some(entry) = popped {
                debug_assert!(
                    match (&entry, &self.target) {
                        (Some(a), Some(b)) => same_consumer(a, b),
                        (None, None) => true,
                        _ => false,
                    },
                    "TrackingContext mismatch on exit"
                );
            }
        });
    }
}

/// Run `f` with dependency tracking suspended.
pub fn untracked<R>(f: impl FnOnce() -> R) -> R {
    let _ctx = TrackingContext::enter(None);
    f()
}
