//! Trellis Core
//!
//! This crate provides the dependency-tracking substrate for a reactive
//! state-binding framework. It implements:
//!
//! - Dependency subjects and the tracking context (`reactive`)
//! - Observed objects and arrays whose reads register dependencies and
//!   whose writes notify exactly the consumers that read them (`observe`)
//! - The `set`/`del` mutation API for keys added after observation
//!
//! Everything is synchronous and single-threaded. Scheduling, batching and
//! deduplicating notifications belong to the consumers.
//!
//! # Architecture
//!
//! - `reactive`: `Dep`, `TrackingContext`, the `Consumer` trait, and the
//!   bundled `Effect` and `Computed` consumers
//! - `observe`: `Value`, `Object`, `Array`, `Observer`, reactive fields and
//!   the mutation API
//! - `config`: process-wide tunables
//! - `error`: refusal reasons returned by the mutation API
//!
//! # Example
//!
//! ```rust
//! use trellis_core::{observe, set, Effect, Object, Value};
//!
//! let state = Object::from_iter([("count", 0)]);
//! observe(&Value::from(state.clone()), false);
//!
//! let effect = Effect::new({
//!     let state = state.clone();
//!     move || {
//!         state.get("count");
//!     }
//! });
//!
//! state.assign("count", Value::from(5));
//! assert_eq!(effect.run_count(), 2);
//!
//! // Writing the same value again does not notify.
//! set(&Value::from(state), "count", Value::from(5)).unwrap();
//! assert_eq!(effect.run_count(), 2);
//! ```

pub mod config;
pub mod error;
pub mod observe;
pub mod reactive;

pub use config::{config, set_config, Config};
pub use error::{ObserveError, Result};
pub use observe::{
    define_reactive, del, observe, set, toggle_observing, Array, Key, Object, Observer, Value,
};
pub use reactive::{Computed, Consumer, ConsumerId, Dep, Effect, TrackingContext};
