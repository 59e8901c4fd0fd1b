//! Cached initializer for a resolved constructor.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use probe_cache::CacheRef;
use probe_core::{member_identity, ConstructorInfo, Member, Modifiers, Result, TypeRef, Value};

use super::access::{AccessScope, AccessState};

/// Creates instances through one resolved constructor with access checks suppressed.
pub struct ConstructorInitializer {
    constructor: Arc<dyn ConstructorInfo>,
    structure: String,
    access: AccessState,
    /// Keeps the declaring structure cached while this handle lives
    owner: Option<CacheRef<TypeRef>>,
}

impl ConstructorInitializer {
    /// Wraps a resolved constructor, capturing its baseline accessibility.
    ///
    /// Fails with a security error if the runtime refuses elevation.
    pub fn new(structure: impl Into<String>, constructor: Arc<dyn ConstructorInfo>) -> Result<Self> {
        let structure = structure.into();
        let access =
            AccessState::capture(&*constructor, || describe(&*constructor, &structure))?;
        Ok(Self {
            constructor,
            structure,
            access,
            owner: None,
        })
    }

    /// Pins `owner` for as long as this handle is alive.
    pub(crate) fn holding(mut self, owner: CacheRef<TypeRef>) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Creates a new instance.
    pub fn construct(&self, args: &[Value]) -> Result<Value> {
        let scope = AccessScope::enter(&*self.constructor, || self.to_string())?;
        self.constructor
            .new_instance(args)
            .map_err(|fault| scope.fault(fault))
    }

    /// Creates a new instance without arguments.
    pub fn construct_default(&self) -> Result<Value> {
        self.construct(&[])
    }

    /// Declared parameter type names.
    pub fn parameter_types(&self) -> &[String] {
        self.constructor.parameter_types()
    }

    /// Constructor name as reported by the runtime.
    pub fn name(&self) -> &str {
        self.constructor.name()
    }

    /// Declared modifiers.
    pub fn modifiers(&self) -> Modifiers {
        self.constructor.modifiers()
    }

    /// Display name of the declaring structure.
    pub fn structure_name(&self) -> &str {
        &self.structure
    }

    /// Declaring structure, when the handle came from a [`crate::Reflector`].
    pub fn structure(&self) -> Option<&TypeRef> {
        self.owner.as_deref()
    }

    /// Whether the constructor was accessible before it was resolved.
    pub fn was_accessible(&self) -> bool {
        self.access.baseline()
    }
}

fn describe(constructor: &dyn ConstructorInfo, structure: &str) -> String {
    format!(
        "constructor '{}({})'",
        structure,
        constructor.parameter_types().join(", ")
    )
}

impl fmt::Display for ConstructorInitializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&describe(&*self.constructor, &self.structure))
    }
}

impl fmt::Debug for ConstructorInitializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorInitializer")
            .field("structure", &self.structure)
            .field("parameter_types", &self.parameter_types())
            .field("was_accessible", &self.was_accessible())
            .finish()
    }
}

impl PartialEq for ConstructorInitializer {
    fn eq(&self, other: &Self) -> bool {
        member_identity(&self.constructor) == member_identity(&other.constructor)
            && self.access.baseline() == other.access.baseline()
            && self.structure == other.structure
    }
}

impl Eq for ConstructorInitializer {}

impl Hash for ConstructorInitializer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        member_identity(&self.constructor).hash(state);
        self.access.baseline().hash(state);
        self.structure.hash(state);
    }
}
