//! Composite cache keys.
//!
//! Every key names its owning structure by fully-qualified name rather than by
//! reference, so holding a key never keeps a structure alive. Optional criteria
//! take part in equality as "absent": a key with no name is never equal to a key
//! with a name, even though both may resolve to the same member.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::types::{MemberKind, Modifiers};

// ═══════════════════════════════════════════════════════════════════════════════
// LOADER IDENTITY
// ═══════════════════════════════════════════════════════════════════════════════

static NEXT_LOADER_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a structure loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoaderId(u64);

impl LoaderId {
    /// Allocates a fresh identity.
    pub fn next() -> Self {
        Self(NEXT_LOADER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw identifier.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for LoaderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "loader#{}", self.0)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TYPE KEY
// ═══════════════════════════════════════════════════════════════════════════════

/// Identifies a structure lookup: name plus resolution context.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeKey {
    name: String,
    loader: LoaderId,
    initialize: bool,
}

impl TypeKey {
    /// Creates a new type key.
    pub fn new(name: impl Into<String>, loader: LoaderId, initialize: bool) -> Self {
        Self {
            name: name.into(),
            loader,
            initialize,
        }
    }

    /// Fully-qualified structure name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Loader the structure is resolved through.
    pub fn loader(&self) -> LoaderId {
        self.loader
    }

    /// Whether loading also runs the structure's initializer.
    pub fn initialize(&self) -> bool {
        self.initialize
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "type[{} via {}, initialize={}]",
            self.name, self.loader, self.initialize
        )
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FIELD KEY
// ═══════════════════════════════════════════════════════════════════════════════

/// Identifies a field lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldKey {
    structure: String,
    name: Option<String>,
    field_type: Option<String>,
    modifiers: Modifiers,
}

impl FieldKey {
    /// Creates a new field key.
    pub fn new(
        structure: impl Into<String>,
        name: Option<&str>,
        field_type: Option<&str>,
        modifiers: Modifiers,
    ) -> Self {
        Self {
            structure: structure.into(),
            name: name.map(str::to_owned),
            field_type: field_type.map(str::to_owned),
            modifiers,
        }
    }

    /// Name of the declaring structure.
    pub fn structure(&self) -> &str {
        &self.structure
    }

    /// Required field name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Required declared type name, if any.
    pub fn field_type(&self) -> Option<&str> {
        self.field_type.as_deref()
    }

    /// Required exact modifiers; empty means "any".
    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Renders only the search criteria, for diagnostics.
    pub fn criteria(&self) -> String {
        format!(
            "name={}, type={}, modifiers={}",
            or_any(self.name()),
            or_any(self.field_type()),
            self.modifiers
        )
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}: {}]", MemberKind::Field.as_str(), self.structure, self.criteria())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// METHOD KEY
// ═══════════════════════════════════════════════════════════════════════════════

/// Identifies a method lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodKey {
    structure: String,
    name: Option<String>,
    parameter_types: Option<Vec<String>>,
    return_type: Option<String>,
    modifiers: Modifiers,
}

impl MethodKey {
    /// Creates a new method key.
    pub fn new(
        structure: impl Into<String>,
        name: Option<&str>,
        parameter_types: Option<&[&str]>,
        return_type: Option<&str>,
        modifiers: Modifiers,
    ) -> Self {
        Self {
            structure: structure.into(),
            name: name.map(str::to_owned),
            parameter_types: parameter_types.map(to_owned_list),
            return_type: return_type.map(str::to_owned),
            modifiers,
        }
    }

    /// Name of the declaring structure.
    pub fn structure(&self) -> &str {
        &self.structure
    }

    /// Required method name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Required exact parameter list, if any.
    pub fn parameter_types(&self) -> Option<&[String]> {
        self.parameter_types.as_deref()
    }

    /// Required return type name, if any.
    pub fn return_type(&self) -> Option<&str> {
        self.return_type.as_deref()
    }

    /// Required exact modifiers; empty means "any".
    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Renders only the search criteria, for diagnostics.
    pub fn criteria(&self) -> String {
        format!(
            "name={}, parameters={}, returns={}, modifiers={}",
            or_any(self.name()),
            render_list(self.parameter_types()),
            or_any(self.return_type()),
            self.modifiers
        )
    }
}

impl fmt::Display for MethodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}: {}]", MemberKind::Method.as_str(), self.structure, self.criteria())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONSTRUCTOR KEY
// ═══════════════════════════════════════════════════════════════════════════════

/// Identifies a constructor lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConstructorKey {
    structure: String,
    parameter_types: Option<Vec<String>>,
    modifiers: Modifiers,
}

impl ConstructorKey {
    /// Creates a new constructor key.
    pub fn new(
        structure: impl Into<String>,
        parameter_types: Option<&[&str]>,
        modifiers: Modifiers,
    ) -> Self {
        Self {
            structure: structure.into(),
            parameter_types: parameter_types.map(to_owned_list),
            modifiers,
        }
    }

    /// Name of the declaring structure.
    pub fn structure(&self) -> &str {
        &self.structure
    }

    /// Required exact parameter list, if any.
    pub fn parameter_types(&self) -> Option<&[String]> {
        self.parameter_types.as_deref()
    }

    /// Required exact modifiers; empty means "any".
    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Returns true if no criterion is populated.
    pub fn is_unconstrained(&self) -> bool {
        self.parameter_types.is_none() && self.modifiers.is_empty()
    }

    /// Renders only the search criteria, for diagnostics.
    pub fn criteria(&self) -> String {
        format!(
            "parameters={}, modifiers={}",
            render_list(self.parameter_types()),
            self.modifiers
        )
    }
}

impl fmt::Display for ConstructorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}: {}]",
            MemberKind::Constructor.as_str(),
            self.structure,
            self.criteria()
        )
    }
}

fn to_owned_list(types: &[&str]) -> Vec<String> {
    types.iter().map(|t| (*t).to_owned()).collect()
}

fn or_any(criterion: Option<&str>) -> &str {
    criterion.unwrap_or("*")
}

fn render_list(types: Option<&[String]>) -> String {
    match types {
        Some(types) => format!("({})", types.join(", ")),
        None => "*".into(),
    }
}
