//! Access flags and member kinds.

use std::fmt;

use bitflags::bitflags;

use crate::constants::*;

bitflags! {
    /// Access-flag bitmask of a declared member.
    ///
    /// An empty mask is the "absent" criterion: it matches any member.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u32 {
        /// Visible everywhere
        const PUBLIC = ACC_PUBLIC;
        /// Visible only inside the declaring structure
        const PRIVATE = ACC_PRIVATE;
        /// Visible to the declaring structure and descendants
        const PROTECTED = ACC_PROTECTED;
        /// Belongs to the structure, not an instance
        const STATIC = ACC_STATIC;
        /// Cannot be reassigned or overridden
        const FINAL = ACC_FINAL;
        /// Holds the receiver's monitor while running
        const SYNCHRONIZED = ACC_SYNCHRONIZED;
        /// Bypasses thread-local caching
        const VOLATILE = ACC_VOLATILE;
        /// Skipped by default serialization
        const TRANSIENT = ACC_TRANSIENT;
        /// Implemented outside the runtime
        const NATIVE = ACC_NATIVE;
        /// Declared without a body
        const ABSTRACT = ACC_ABSTRACT;
        /// Strict floating-point semantics
        const STRICT = ACC_STRICT;
    }
}

impl Modifiers {
    /// Returns true if no visibility flag is set (package-private).
    pub fn is_package_private(&self) -> bool {
        !self.intersects(Modifiers::PUBLIC | Modifiers::PROTECTED | Modifiers::PRIVATE)
    }

    /// Returns true if the member belongs to the structure itself.
    pub fn is_static(&self) -> bool {
        self.contains(Modifiers::STATIC)
    }
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("*");
        }
        let names: Vec<&str> = self.iter_names().map(|(name, _)| name).collect();
        f.write_str(&names.join("|"))
    }
}

/// The kinds of member a structure declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    /// An attribute read and written through a [`crate::traits::FieldInfo`]
    Field,
    /// An operation invoked through a [`crate::traits::MethodInfo`]
    Method,
    /// An initializer invoked through a [`crate::traits::ConstructorInfo`]
    Constructor,
}

impl MemberKind {
    /// Flags a declaration of this kind may legally carry.
    pub fn legal_modifiers(&self) -> Modifiers {
        match self {
            MemberKind::Field => Modifiers::from_bits_retain(FIELD_MODIFIERS),
            MemberKind::Method => Modifiers::from_bits_retain(METHOD_MODIFIERS),
            MemberKind::Constructor => Modifiers::from_bits_retain(CONSTRUCTOR_MODIFIERS),
        }
    }

    /// Returns the flags in `modifiers` that are illegal for this kind.
    pub fn illegal_modifiers(&self, modifiers: Modifiers) -> Modifiers {
        modifiers.difference(self.legal_modifiers())
    }

    /// Lower-case label used in diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberKind::Field => "field",
            MemberKind::Method => "method",
            MemberKind::Constructor => "constructor",
        }
    }
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberKind::Field => f.write_str("Field"),
            MemberKind::Method => f.write_str("Method"),
            MemberKind::Constructor => f.write_str("Constructor"),
        }
    }
}
