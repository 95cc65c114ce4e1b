//! Reactive Primitives
//!
//! This module implements dependency subjects, the tracking context, and
//! the consumer interface the observed data model talks to.
//!
//! # Concepts
//!
//! ## Dependency subjects
//!
//! A [`Dep`] belongs to one reactive field or one observed container. When
//! it is read during an evaluation it hands itself to the evaluating
//! consumer; when it fires it calls `update` on every subscriber.
//!
//! ## Tracking context
//!
//! [`TrackingContext`] holds the consumer currently being evaluated. It is a
//! stack, so one derivation's evaluation may trigger another's.
//!
//! ## Consumers
//!
//! [`Consumer`] is the interface external derivations implement. Two ready
//! made consumers are included: [`Effect`], which re-runs eagerly, and
//! [`Computed`], a lazily cached value.

mod computed;
mod consumer;
mod context;
mod dep;
mod effect;

pub use computed::Computed;
pub use consumer::{Consumer, ConsumerId, DepTracker};
pub use context::{untracked, TrackingContext, TrackingGuard};
pub use dep::{Dep, DepId, NotifyOrder};
pub use effect::Effect;
