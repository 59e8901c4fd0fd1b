//! # PROBE Core
//!
//! Core types, errors, and traits shared by every PROBE crate.
//!
//! This crate provides the foundational building blocks:
//!
//! - **Types**: composite cache keys, access flags, and the dynamic value model
//! - **Errors**: the resolution/invocation error taxonomy
//! - **Constants**: access-flag bit values and per-kind legal masks
//! - **Traits**: the introspection capabilities a runtime binding implements
//!
//! ## Example
//!
//! ```rust
//! use probe_core::{FieldKey, Modifiers};
//!
//! let by_name = FieldKey::new("app.Widget", Some("count"), None, Modifiers::empty());
//! let by_type = FieldKey::new("app.Widget", None, Some("int"), Modifiers::empty());
//! assert_ne!(by_name, by_type);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{AccessDenied, AccessFault, BoxError, LoadError, ProbeError, Result};
pub use traits::*;
pub use types::*;
