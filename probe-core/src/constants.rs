//! Access-flag constants for PROBE.
//!
//! Bit values follow the JVM class-file encoding so that flag masks read from
//! foreign metadata can be passed through unchanged.

// ═══════════════════════════════════════════════════════════════════════════════
// ACCESS FLAG BITS
// ═══════════════════════════════════════════════════════════════════════════════

/// Visible everywhere.
pub const ACC_PUBLIC: u32 = 0x0001;

/// Visible only inside the declaring structure.
pub const ACC_PRIVATE: u32 = 0x0002;

/// Visible to the declaring structure and its descendants.
pub const ACC_PROTECTED: u32 = 0x0004;

/// Belongs to the structure rather than to an instance.
pub const ACC_STATIC: u32 = 0x0008;

/// Cannot be reassigned or overridden.
pub const ACC_FINAL: u32 = 0x0010;

/// Invocation holds the receiver's monitor.
pub const ACC_SYNCHRONIZED: u32 = 0x0020;

/// Field reads and writes bypass thread-local caching.
pub const ACC_VOLATILE: u32 = 0x0040;

/// Field is skipped by default serialization.
pub const ACC_TRANSIENT: u32 = 0x0080;

/// Implemented outside the managed runtime.
pub const ACC_NATIVE: u32 = 0x0100;

/// Declared without a body.
pub const ACC_ABSTRACT: u32 = 0x0400;

/// Strict floating-point semantics.
pub const ACC_STRICT: u32 = 0x0800;

// ═══════════════════════════════════════════════════════════════════════════════
// PER-KIND LEGAL MASKS
// ═══════════════════════════════════════════════════════════════════════════════

/// Flags a field declaration may carry.
pub const FIELD_MODIFIERS: u32 = ACC_PUBLIC
    | ACC_PROTECTED
    | ACC_PRIVATE
    | ACC_STATIC
    | ACC_FINAL
    | ACC_TRANSIENT
    | ACC_VOLATILE;

/// Flags a method declaration may carry.
pub const METHOD_MODIFIERS: u32 = ACC_PUBLIC
    | ACC_PROTECTED
    | ACC_PRIVATE
    | ACC_ABSTRACT
    | ACC_STATIC
    | ACC_FINAL
    | ACC_SYNCHRONIZED
    | ACC_NATIVE
    | ACC_STRICT;

/// Flags a constructor declaration may carry.
pub const CONSTRUCTOR_MODIFIERS: u32 = ACC_PUBLIC | ACC_PROTECTED | ACC_PRIVATE;

/// Name reported by constructors through [`crate::traits::Member::name`].
pub const CONSTRUCTOR_NAME: &str = "<init>";
