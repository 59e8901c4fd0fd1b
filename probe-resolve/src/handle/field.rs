//! Cached accessor for a resolved field.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use probe_cache::CacheRef;
use probe_core::{member_identity, FieldInfo, Member, Modifiers, Result, TypeRef, Value};

use super::access::{AccessScope, AccessState};

/// Reads and writes one resolved field with access checks suppressed.
///
/// The field is elevated only while an operation runs; between operations
/// it keeps the accessibility it had when it was resolved.
pub struct FieldAccessor {
    field: Arc<dyn FieldInfo>,
    structure: String,
    access: AccessState,
    /// Keeps the declaring structure cached while this handle lives
    owner: Option<CacheRef<TypeRef>>,
}

impl FieldAccessor {
    /// Wraps a resolved field, capturing its baseline accessibility.
    ///
    /// Fails with a security error if the runtime refuses elevation.
    pub fn new(structure: impl Into<String>, field: Arc<dyn FieldInfo>) -> Result<Self> {
        let structure = structure.into();
        let access = AccessState::capture(&*field, || describe(&*field, &structure))?;
        Ok(Self {
            field,
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

    /// Reads the field of `target`.
    pub fn read(&self, target: &Value) -> Result<Value> {
        self.get(Some(target))
    }

    /// Reads a static field.
    pub fn read_static(&self) -> Result<Value> {
        self.get(None)
    }

    /// Writes `value` into the field of `target`.
    pub fn write(&self, target: &Value, value: impl Into<Value>) -> Result<()> {
        self.set(Some(target), value.into())
    }

    /// Writes a static field.
    pub fn write_static(&self, value: impl Into<Value>) -> Result<()> {
        self.set(None, value.into())
    }

    /// Clears the field of `target` to `null`.
    pub fn unset(&self, target: &Value) -> Result<()> {
        self.set(Some(target), Value::Null)
    }

    fn get(&self, target: Option<&Value>) -> Result<Value> {
        let scope = AccessScope::enter(&*self.field, || self.to_string())?;
        self.field.get(target).map_err(|fault| scope.fault(fault))
    }

    fn set(&self, target: Option<&Value>, value: Value) -> Result<()> {
        let scope = AccessScope::enter(&*self.field, || self.to_string())?;
        self.field.set(target, value).map_err(|fault| scope.fault(fault))
    }

    /// Field name.
    pub fn name(&self) -> &str {
        self.field.name()
    }

    /// Declared type name.
    pub fn field_type(&self) -> &str {
        self.field.field_type()
    }

    /// Declared modifiers.
    pub fn modifiers(&self) -> Modifiers {
        self.field.modifiers()
    }

    /// Display name of the declaring structure.
    pub fn structure_name(&self) -> &str {
        &self.structure
    }

    /// Declaring structure, when the handle came from a [`crate::Reflector`].
    pub fn structure(&self) -> Option<&TypeRef> {
        self.owner.as_deref()
    }

    /// Whether the field was accessible before it was resolved.
    pub fn was_accessible(&self) -> bool {
        self.access.baseline()
    }
}

fn describe(field: &dyn FieldInfo, structure: &str) -> String {
    format!("field '{}' of {}", field.name(), structure)
}

impl fmt::Display for FieldAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&describe(&*self.field, &self.structure))
    }
}

impl fmt::Debug for FieldAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldAccessor")
            .field("structure", &self.structure)
            .field("name", &self.name())
            .field("field_type", &self.field_type())
            .field("was_accessible", &self.was_accessible())
            .finish()
    }
}

impl PartialEq for FieldAccessor {
    fn eq(&self, other: &Self) -> bool {
        member_identity(&self.field) == member_identity(&other.field)
            && self.access.baseline() == other.access.baseline()
            && self.structure == other.structure
    }
}

impl Eq for FieldAccessor {}

impl Hash for FieldAccessor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        member_identity(&self.field).hash(state);
        self.access.baseline().hash(state);
        self.structure.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use probe_core::{Accessible, Instance, Structure};
    use probe_mirror::{ClassDef, FieldDef, MirrorClass};

    use super::*;

    fn class() -> MirrorClass {
        ClassDef::new("app.Widget")
            .field(FieldDef::new("count", "int").modifiers(Modifiers::PRIVATE))
            .field(FieldDef::new("label", "string").modifiers(Modifiers::PUBLIC))
            .field(
                FieldDef::new("created", "long")
                    .modifiers(Modifiers::PRIVATE | Modifiers::STATIC)
                    .initial(1i64),
            )
            .build()
    }

    fn accessor(class: &MirrorClass, index: usize) -> (Arc<dyn FieldInfo>, FieldAccessor) {
        let field = class.declared_fields().remove(index);
        let handle = FieldAccessor::new(class.name(), Arc::clone(&field)).unwrap();
        (field, handle)
    }

    fn widget() -> Value {
        Value::Object(Arc::new(Instance::with_slots("app.Widget", [("count", Value::Int(0))])))
    }

    #[test]
    fn test_private_field_round_trip_restores_access() {
        let class = class();
        let (field, count) = accessor(&class, 0);
        assert!(!count.was_accessible());
        assert!(!field.is_accessible());

        let target = widget();
        count.write(&target, 5).unwrap();
        assert!(!field.is_accessible());
        assert_eq!(count.read(&target).unwrap(), Value::Int(5));
        assert!(!field.is_accessible());
    }

    #[test]
    fn test_failed_operation_restores_access() {
        let class = class();
        let (field, count) = accessor(&class, 0);
        let err = count.write(&widget(), "five").unwrap_err();
        assert!(err.is_validation_error());
        assert!(!field.is_accessible());
    }

    #[test]
    fn test_public_field_stays_accessible() {
        let class = class();
        let (field, label) = accessor(&class, 1);
        assert!(label.was_accessible());
        label.unset(&widget()).unwrap();
        assert!(field.is_accessible());
    }

    #[test]
    fn test_static_access() {
        let class = class();
        let (_, created) = accessor(&class, 2);
        assert_eq!(created.read_static().unwrap(), Value::Long(1));
        created.write_static(2i64).unwrap();
        assert_eq!(created.read_static().unwrap(), Value::Long(2));
    }

    #[test]
    fn test_equality_follows_member_identity() {
        let class = class();
        let (field, first) = accessor(&class, 0);
        let second = FieldAccessor::new("app.Widget", field).unwrap();
        let (_, other) = accessor(&class, 1);
        assert_eq!(first, second);
        assert_ne!(first, other);
        assert_eq!(first.to_string(), "field 'count' of app.Widget");
    }
}
