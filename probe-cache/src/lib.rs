//! Weakly-held, per-key-locked cache for PROBE.
//!
//! [`WeakCache`] computes each value at most once per key at a time, never
//! stores failures, and forgets a value as soon as the last [`CacheRef`] to it
//! is dropped. Forgotten entries are purged lazily by the next cache access;
//! no background thread is involved.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod cache;
mod config;
mod entry;

pub use cache::{CacheStats, WeakCache};
pub use config::CacheConfig;
pub use entry::CacheRef;
