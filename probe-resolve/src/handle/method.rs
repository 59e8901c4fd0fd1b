//! Cached invoker for a resolved method.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use probe_cache::CacheRef;
use probe_core::{member_identity, Member, MethodInfo, Modifiers, Result, TypeRef, Value};

use super::access::{AccessScope, AccessState};

/// Invokes one resolved method with access checks suppressed.
pub struct MethodInvoker {
    method: Arc<dyn MethodInfo>,
    structure: String,
    access: AccessState,
    /// Keeps the declaring structure cached while this handle lives
    owner: Option<CacheRef<TypeRef>>,
}

impl MethodInvoker {
    /// Wraps a resolved method, capturing its baseline accessibility.
    ///
    /// Fails with a security error if the runtime refuses elevation.
    pub fn new(structure: impl Into<String>, method: Arc<dyn MethodInfo>) -> Result<Self> {
        let structure = structure.into();
        let access = AccessState::capture(&*method, || describe(&*method, &structure))?;
        Ok(Self {
            method,
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

    /// Invokes the method on `target`.
    ///
    /// A failure raised by the method itself is returned as an invocation
    /// error whose source is the method's own error.
    pub fn invoke(&self, target: &Value, args: &[Value]) -> Result<Value> {
        self.call(Some(target), args)
    }

    /// Invokes a static method.
    pub fn invoke_static(&self, args: &[Value]) -> Result<Value> {
        self.call(None, args)
    }

    fn call(&self, target: Option<&Value>, args: &[Value]) -> Result<Value> {
        let scope = AccessScope::enter(&*self.method, || self.to_string())?;
        self.method
            .invoke(target, args)
            .map_err(|fault| scope.fault(fault))
    }

    /// Method name.
    pub fn name(&self) -> &str {
        self.method.name()
    }

    /// Declared parameter type names.
    pub fn parameter_types(&self) -> &[String] {
        self.method.parameter_types()
    }

    /// Declared return type name.
    pub fn return_type(&self) -> &str {
        self.method.return_type()
    }

    /// Declared modifiers.
    pub fn modifiers(&self) -> Modifiers {
        self.method.modifiers()
    }

    /// Display name of the declaring structure.
    pub fn structure_name(&self) -> &str {
        &self.structure
    }

    /// Declaring structure, when the handle came from a [`crate::Reflector`].
    pub fn structure(&self) -> Option<&TypeRef> {
        self.owner.as_deref()
    }

    /// Whether the method was accessible before it was resolved.
    pub fn was_accessible(&self) -> bool {
        self.access.baseline()
    }
}

fn describe(method: &dyn MethodInfo, structure: &str) -> String {
    format!(
        "method '{}({})' of {}",
        method.name(),
        method.parameter_types().join(", "),
        structure
    )
}

impl fmt::Display for MethodInvoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&describe(&*self.method, &self.structure))
    }
}

impl fmt::Debug for MethodInvoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodInvoker")
            .field("structure", &self.structure)
            .field("name", &self.name())
            .field("parameter_types", &self.parameter_types())
            .field("was_accessible", &self.was_accessible())
            .finish()
    }
}

impl PartialEq for MethodInvoker {
    fn eq(&self, other: &Self) -> bool {
        member_identity(&self.method) == member_identity(&other.method)
            && self.access.baseline() == other.access.baseline()
            && self.structure == other.structure
    }
}

impl Eq for MethodInvoker {}

impl Hash for MethodInvoker {
    fn hash<H: Hasher>(&self, state: &mut H) {
        member_identity(&self.method).hash(state);
        self.access.baseline().hash(state);
        self.structure.hash(state);
    }
}
