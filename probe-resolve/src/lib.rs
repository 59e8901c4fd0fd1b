//! # PROBE Resolve
//!
//! Partial-match member resolution with cached, permission-safe handles.
//!
//! This crate ties the pieces together:
//!
//! - **Resolution**: first-match scans over a structure's declared members
//! - **Handles**: [`FieldAccessor`], [`MethodInvoker`], and
//!   [`ConstructorInitializer`] suppress access checks only while an
//!   operation runs
//! - **Caches**: one [`probe_cache::WeakCache`] per resolution kind
//! - **Facade**: [`Reflector`] validates lookups and routes them through the caches
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use probe_core::{Modifiers, Value};
//! use probe_mirror::{ClassDef, ClassLoader, MethodDef};
//! use probe_resolve::Reflector;
//!
//! let loader = Arc::new(ClassLoader::new("app"));
//! loader
//!     .define(ClassDef::new("app.Calc").method(
//!         MethodDef::new("twice", &["int"], "int", |_, args| {
//!             Ok(Value::Int(args[0].as_int().unwrap_or(0) * 2))
//!         })
//!         .modifiers(Modifiers::PUBLIC | Modifiers::STATIC),
//!     ))
//!     .unwrap();
//!
//! let reflector = Reflector::new(loader);
//! let twice = reflector
//!     .resolve_operation("app.Calc", Some("twice"), Some(&["int"]), None, Modifiers::empty())
//!     .unwrap();
//! assert_eq!(twice.invoke_static(&[Value::Int(21)]).unwrap(), Value::Int(42));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod caches;
pub mod config;
pub mod handle;
pub mod reflector;
pub mod resolve;

pub use caches::{ConstructorCache, FieldCache, MethodCache, ResolutionCache, TypeCache};
pub use config::ReflectorConfig;
pub use handle::{ConstructorInitializer, FieldAccessor, MethodInvoker};
pub use reflector::{Reflector, ReflectorStats, ResolutionContext};

pub use probe_cache::{CacheConfig, CacheRef, CacheStats};
