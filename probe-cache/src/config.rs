//! Cache configuration.

use serde::{Deserialize, Serialize};

/// Cache configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Number of entries to preallocate
    pub initial_capacity: usize,
    /// Whether read-only lookups also purge reclaimed entries
    pub purge_on_access: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 64,
            purge_on_access: true,
        }
    }
}

impl CacheConfig {
    /// Sets the preallocated capacity.
    pub fn with_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    /// Leaves purging to `get_or_compute` and explicit `purge` calls.
    pub fn lazy_purge(mut self) -> Self {
        self.purge_on_access = false;
        self
    }
}
