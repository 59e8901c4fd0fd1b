//! Domain types for PROBE.
//!
//! - [`Modifiers`] and [`MemberKind`]: access flags and the member kinds they apply to
//! - [`TypeKey`], [`FieldKey`], [`MethodKey`], [`ConstructorKey`]: composite cache keys
//! - [`Value`] and [`Instance`]: the dynamic values handles read, write, and pass

mod keys;
mod modifiers;
mod value;

pub use keys::*;
pub use modifiers::*;
pub use value::*;
