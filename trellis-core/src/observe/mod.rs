//! Observed Data
//!
//! This module instruments structured data so that reading it during a
//! consumer's evaluation records a dependency, and changing it notifies
//! exactly the consumers that read the changed piece.
//!
//! # Model
//!
//! Data lives in [`Value`] trees made of [`Object`] and [`Array`] handles.
//! Instead of rewriting arbitrary host objects, these handles expose the
//! only reads and writes that exist, and do the bookkeeping themselves:
//!
//! - [`observe`] attaches an [`Observer`] to a container once and walks its
//!   contents. Every enumerable object key becomes a [`ReactiveField`].
//! - A field read registers the active consumer with the field's subject,
//!   the child container's structural subject and, for arrays, every
//!   observed element.
//! - A field write fires the field's subject; array mutations fire the
//!   array's structural subject.
//! - [`set`] and [`del`] add and remove keys on observed containers.
//!
//! Anything that cannot be instrumented is skipped silently. Refused
//! mutations come back as [`ObserveError`](crate::ObserveError) and are
//! logged, never panicked on.

mod array;
mod field;
mod mutation;
mod object;
mod observer;
mod value;

pub use array::{Array, MAX_LENGTH};
pub use field::{define_reactive, ReactiveField, WriteHook};
pub use mutation::{del, set, Key};
pub use object::{Attributes, Getter, Object, Setter};
pub use observer::{observe, should_observe, toggle_observing, Observer};
pub use value::Value;
