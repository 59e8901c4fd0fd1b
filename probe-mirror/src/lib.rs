//! # PROBE Mirror
//!
//! In-memory runtime binding for PROBE.
//!
//! Classes are described with [`ClassDef`] and defined in a [`ClassLoader`],
//! which implements [`probe_core::StructureLoader`]. Every member honors the
//! access rules the resolution layer relies on:
//!
//! - **Visibility**: members start accessible only if they are `PUBLIC`
//! - **Elevation**: temporary elevations are counted per member and nest
//! - **Sealing**: sealed members refuse accessibility elevation
//! - **Initialization**: a class initializer runs once, on the first
//!   initializing load
//!
//! ## Example
//!
//! ```rust
//! use probe_core::{Modifiers, Structure, StructureLoader, Value};
//! use probe_mirror::{ClassDef, ClassLoader, FieldDef, MethodDef};
//!
//! let loader = ClassLoader::new("app");
//! loader
//!     .define(
//!         ClassDef::new("app.Widget")
//!             .field(FieldDef::new("count", "int").modifiers(Modifiers::PRIVATE))
//!             .method(
//!                 MethodDef::new("add", &["int", "int"], "int", |_, args| {
//!                     let sum = args[0].as_int().unwrap_or(0) + args[1].as_int().unwrap_or(0);
//!                     Ok(Value::Int(sum))
//!                 })
//!                 .modifiers(Modifiers::PUBLIC),
//!             ),
//!     )
//!     .unwrap();
//!
//! let widget = loader.load("app.Widget", true).unwrap();
//! assert_eq!(widget.declared_methods().len(), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod class;
mod error;
mod loader;
mod member;

pub use class::{ClassDef, Initializer, MirrorClass};
pub use error::DefineError;
pub use loader::{ClassLoader, LoaderStats};
pub use member::{
    default_value, ConstructorBody, ConstructorDef, FieldDef, MethodBody, MethodDef,
    MirrorConstructor, MirrorField, MirrorMethod,
};
