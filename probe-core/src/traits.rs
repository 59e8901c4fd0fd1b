//! Introspection capabilities for PROBE.
//!
//! These traits are the only thing resolution and handles know about a host
//! runtime. A runtime binding implements them once; caches, resolution
//! algorithms, and handles stay unchanged.

use std::sync::Arc;

use crate::error::{AccessDenied, AccessFault, LoadError};
use crate::types::{LoaderId, Modifiers, Value};

/// Shared reference to a loaded structure.
pub type TypeRef = Arc<dyn Structure>;

// ═══════════════════════════════════════════════════════════════════════════════
// MEMBERS
// ═══════════════════════════════════════════════════════════════════════════════

/// A member whose access checks can be suppressed.
///
/// The member owns two things: a persistent accessibility flag, and a count
/// of operations that currently suppress its checks. Raw operations are
/// permitted while either is set. Acquisitions from any number of callers
/// nest; the last release leaves the member at its persistent setting.
pub trait Accessible: Send + Sync {
    /// Returns the persistent accessibility flag.
    ///
    /// Temporary elevation through [`Accessible::acquire_access`] does not
    /// change it.
    fn is_accessible(&self) -> bool;

    /// Sets the persistent accessibility flag.
    ///
    /// Runtimes may refuse to suppress checks on protected members.
    fn set_accessible(&self, flag: bool) -> Result<(), AccessDenied>;

    /// Suppresses access checks until the matching
    /// [`Accessible::release_access`]. Acquisitions nest.
    ///
    /// Refused under the same rules as `set_accessible(true)`.
    fn acquire_access(&self) -> Result<(), AccessDenied>;

    /// Ends one acquisition.
    fn release_access(&self) -> Result<(), AccessDenied>;
}

/// Common surface of every declared member.
pub trait Member: Accessible {
    /// Simple name of the member.
    fn name(&self) -> &str;

    /// Declared access flags.
    fn modifiers(&self) -> Modifiers;
}

/// A declared attribute.
pub trait FieldInfo: Member {
    /// Declared type name.
    fn field_type(&self) -> &str;

    /// Reads the field. `target` is `None` for static fields.
    fn get(&self, target: Option<&Value>) -> Result<Value, AccessFault>;

    /// Writes the field. `target` is `None` for static fields.
    fn set(&self, target: Option<&Value>, value: Value) -> Result<(), AccessFault>;
}

/// A declared operation.
pub trait MethodInfo: Member {
    /// Declared parameter type names, in order.
    fn parameter_types(&self) -> &[String];

    /// Declared return type name.
    fn return_type(&self) -> &str;

    /// Invokes the operation. `target` is `None` for static methods.
    fn invoke(&self, target: Option<&Value>, args: &[Value]) -> Result<Value, AccessFault>;
}

/// A declared initializer.
pub trait ConstructorInfo: Member {
    /// Declared parameter type names, in order.
    fn parameter_types(&self) -> &[String];

    /// Builds a new instance of the declaring structure.
    fn new_instance(&self, args: &[Value]) -> Result<Value, AccessFault>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// STRUCTURES
// ═══════════════════════════════════════════════════════════════════════════════

/// A loaded type whose declared members can be enumerated.
///
/// Enumeration order is declaration order and must be stable: resolution
/// picks the first match.
pub trait Structure: Send + Sync {
    /// Fully-qualified name.
    fn name(&self) -> &str;

    /// Declared fields in declaration order.
    fn declared_fields(&self) -> Vec<Arc<dyn FieldInfo>>;

    /// Declared methods in declaration order.
    fn declared_methods(&self) -> Vec<Arc<dyn MethodInfo>>;

    /// Declared constructors in declaration order.
    fn declared_constructors(&self) -> Vec<Arc<dyn ConstructorInfo>>;
}

/// Loads structures by fully-qualified name.
pub trait StructureLoader: Send + Sync {
    /// Identity used in cache keys.
    fn id(&self) -> LoaderId;

    /// Loads `name`, running its one-time initializer when `initialize` is set.
    fn load(&self, name: &str, initialize: bool) -> Result<TypeRef, LoadError>;
}

/// Returns a stable identity for a shared member, usable for equality/hash.
///
/// Two `Arc`s to the same member allocation yield the same identity.
pub fn member_identity<T: ?Sized>(member: &Arc<T>) -> usize {
    Arc::as_ptr(member) as *const () as usize
}
