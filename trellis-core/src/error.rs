//! Error types for observed-data mutation.
//!
//! None of these abort anything: an error means the operation did nothing.
//! Refusals are also reported through `tracing` when diagnostics are on.

use thiserror::Error;
use tracing::warn;

use crate::config;

/// Result type alias for mutation operations
pub type Result<T> = std::result::Result<T, ObserveError>;

#[derive(Error, Debug)]
pub enum ObserveError {
    /// `set`/`del` on something that is not a container.
    #[error("cannot {op} reactive property on null or primitive value: {found}")]
    InvalidTarget { op: &'static str, found: &'static str },

    /// New key on a root container or an exempt container.
    #[error("avoid adding reactive property `{key}` to a root container at runtime, declare it upfront")]
    RootKeyAddition { key: String },

    #[error("avoid deleting property `{key}` on a root container, set it to null instead")]
    RootKeyDeletion { key: String },

    /// A sequence addressed by a name that is not an index.
    #[error("cannot {op} key `{key}` on a sequence, expected an index")]
    NonIndexKey { op: &'static str, key: String },

    /// Index write that would grow a sequence past its length limit.
    #[error("index {index} is out of range for a sequence")]
    IndexOutOfRange { index: usize },

    /// New key on an object that no longer accepts keys.
    #[error("cannot add property `{key}`, object is not extensible")]
    NotExtensible { key: String },

    /// Write to a field that only has a getter.
    #[error("property `{key}` has a getter and no setter, write ignored")]
    ReadOnly { key: String },

    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

/// Emit `err` on the diagnostic channel and hand it back.
pub(crate) fn report(err: ObserveError) -> ObserveError {
    if config::config().diagnostics {
        warn!(error = %err, "observed data mutation refused");
    }
    err
}
