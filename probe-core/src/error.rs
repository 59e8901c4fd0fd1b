//! Error types for PROBE.
//!
//! [`ProbeError`] is what every resolution and handle operation returns.
//! The smaller types at the bottom of this module describe failures reported
//! by a runtime binding; handles translate them into [`ProbeError`].

use thiserror::Error;

use crate::types::MemberKind;

/// Result type alias using `ProbeError`.
pub type Result<T> = std::result::Result<T, ProbeError>;

/// Boxed error raised from inside a member's own logic.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for all PROBE operations.
#[derive(Debug, Error)]
pub enum ProbeError {
    // ═══════════════════════════════════════════════════════════════════════════
    // LOOKUP ERRORS
    // ═══════════════════════════════════════════════════════════════════════════
    /// The owning structure could not be loaded by name.
    #[error("Structure not found: {name}")]
    StructureNotFound {
        /// Fully-qualified name that was requested
        name: String,
        /// Failure reported by the loader
        #[source]
        source: LoadError,
    },

    /// No member of the requested kind matched the criteria.
    #[error("{kind} not found in {structure} ({criteria})")]
    MemberNotFound {
        /// Display name of the structure that was scanned
        structure: String,
        /// Kind of member that was searched for
        kind: MemberKind,
        /// Rendered search criteria
        criteria: String,
    },

    // ═══════════════════════════════════════════════════════════════════════════
    // ACCESS ERRORS
    // ═══════════════════════════════════════════════════════════════════════════
    /// Accessibility elevation or the operation itself was refused.
    #[error("Security error: {message}")]
    Security {
        /// What was being accessed
        message: String,
        /// Refusal reported by the runtime, if any
        #[source]
        source: Option<AccessDenied>,
    },

    /// The resolved member ran but failed internally.
    #[error("Invocation error: {message}: {source}")]
    Invocation {
        /// What was being invoked
        message: String,
        /// The member's own failure
        #[source]
        source: BoxError,
    },

    // ═══════════════════════════════════════════════════════════════════════════
    // VALIDATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════
    /// Caller-supplied criteria or arguments were inconsistent.
    #[error("Validation error: {0}")]
    Validation(String),
}

impl ProbeError {
    /// Returns true if this error reports a missing structure or member.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ProbeError::StructureNotFound { .. } | ProbeError::MemberNotFound { .. }
        )
    }

    /// Returns true if this is an access-control refusal.
    pub fn is_security_error(&self) -> bool {
        matches!(self, ProbeError::Security { .. })
    }

    /// Returns true if this is a validation error.
    pub fn is_validation_error(&self) -> bool {
        matches!(self, ProbeError::Validation(_))
    }

    /// Returns true if the member itself failed while running.
    pub fn is_invocation_error(&self) -> bool {
        matches!(self, ProbeError::Invocation { .. })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RUNTIME BINDING ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

/// Failure to load a structure by name.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The loader has no definition for the name.
    #[error("no definition for '{0}'")]
    Undefined(String),

    /// The structure exists but its one-time initializer failed.
    #[error("initialization of '{name}' failed: {source}")]
    InitializationFailed {
        /// Structure being initialized
        name: String,
        /// Initializer's failure
        #[source]
        source: BoxError,
    },
}

/// The runtime refused to change or honor a member's accessibility.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("access to '{member}' denied: {reason}")]
pub struct AccessDenied {
    /// Member that was being accessed
    pub member: String,
    /// Why the runtime refused
    pub reason: String,
}

impl AccessDenied {
    /// Creates a new refusal.
    pub fn new(member: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            member: member.into(),
            reason: reason.into(),
        }
    }
}

/// Failure of a raw member operation (get, set, invoke, new instance).
#[derive(Debug, Error)]
pub enum AccessFault {
    /// Refused by access control.
    #[error(transparent)]
    Denied(#[from] AccessDenied),

    /// Target or arguments do not fit the member's declaration.
    #[error("illegal argument: {0}")]
    IllegalArgument(String),

    /// The member's own logic failed.
    #[error("member raised: {0}")]
    Raised(#[source] BoxError),
}
