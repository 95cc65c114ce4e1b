//! Runtime configuration.
//!
//! The configuration is process-wide and meant to be set once at startup,
//! before any observed data is touched.

use parking_lot::{const_rwlock, RwLock};
use serde::{Deserialize, Serialize};

use crate::error::ObserveError;

/// Tunables for notification ordering and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Sort each notification snapshot by consumer id.
    ///
    /// Turn off when an external scheduler already orders updates.
    pub sort_subscribers: bool,

    /// Report refused mutations through `tracing`.
    pub diagnostics: bool,
}

impl Config {
    const DEFAULT: Config = Config {
        sort_subscribers: true,
        diagnostics: true,
    };

    /// Parse a configuration from JSON. Missing fields keep their defaults.
    pub fn from_json(input: &str) -> Result<Self, ObserveError> {
        Ok(serde_json::from_str(input)?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::DEFAULT
    }
}

static CONFIG: RwLock<Config> = const_rwlock(Config::DEFAULT);

/// Snapshot of the active configuration.
pub fn config() -> Config {
    CONFIG.read().clone()
}

/// Replace the active configuration.
pub fn set_config(config: Config) {
    *CONFIG.write() = config;
}
