//! Dynamic values moved across member handles.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

/// Shared reference to a dynamically-typed object.
pub type ObjectRef = Arc<Instance>;

/// A value read from a field, passed as an argument, or returned by a member.
#[derive(Clone, Debug, Default)]
pub enum Value {
    /// No value
    #[default]
    Null,
    /// `bool`
    Bool(bool),
    /// 32-bit signed integer (`int`)
    Int(i32),
    /// 64-bit signed integer (`long`)
    Long(i64),
    /// 64-bit float (`double`)
    Float(f64),
    /// Owned string (`string`)
    Str(String),
    /// Reference to an object instance
    Object(ObjectRef),
}

impl Value {
    /// Name of the runtime type this value carries.
    ///
    /// Objects report their structure name; primitives report the names used
    /// in member declarations (`int`, `long`, ...).
    pub fn type_name(&self) -> &str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Float(_) => "double",
            Value::Str(_) => "string",
            Value::Object(obj) => obj.structure(),
        }
    }

    /// Returns true if this is [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the `bool` payload, if any.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the `int` payload, if any.
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the `long` payload, widening `int`.
    pub fn as_long(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(i64::from(*i)),
            Value::Long(l) => Some(*l),
            _ => None,
        }
    }

    /// Returns the `double` payload, if any.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string payload, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the object payload, if any.
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Returns true if this value may be stored in a slot declared as `declared`.
    ///
    /// `null` fits every reference type but no primitive.
    pub fn fits(&self, declared: &str) -> bool {
        match self {
            Value::Null => !is_primitive(declared),
            other => other.type_name() == declared,
        }
    }
}

/// Returns true for the primitive type names [`Value`] uses.
pub fn is_primitive(type_name: &str) -> bool {
    matches!(type_name, "bool" | "int" | "long" | "double")
}

/// Object references compare by identity; everything else by payload.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Long(l) => write!(f, "{l}L"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Object(obj) => write!(f, "{}@{:p}", obj.structure(), Arc::as_ptr(obj)),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Long(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<ObjectRef> for Value {
    fn from(value: ObjectRef) -> Self {
        Value::Object(value)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// INSTANCE
// ═══════════════════════════════════════════════════════════════════════════════

/// A dynamically-typed object: its structure name plus named slots.
///
/// Slots are the raw storage behind instance fields. They are not subject to
/// access control; runtime bindings enforce accessibility before touching them.
#[derive(Debug)]
pub struct Instance {
    structure: String,
    slots: RwLock<HashMap<String, Value>>,
}

impl Instance {
    /// Creates an instance with no slots.
    pub fn new(structure: impl Into<String>) -> Self {
        Self {
            structure: structure.into(),
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// Creates an instance with the given initial slots.
    pub fn with_slots<I, S>(structure: impl Into<String>, slots: I) -> Self
    where
        I: IntoIterator<Item = (S, Value)>,
        S: Into<String>,
    {
        Self {
            structure: structure.into(),
            slots: RwLock::new(slots.into_iter().map(|(k, v)| (k.into(), v)).collect()),
        }
    }

    /// Name of the structure this object is an instance of.
    pub fn structure(&self) -> &str {
        &self.structure
    }

    /// Reads a slot.
    pub fn slot(&self, name: &str) -> Option<Value> {
        self.slots.read().get(name).cloned()
    }

    /// Returns true if the slot exists.
    pub fn has_slot(&self, name: &str) -> bool {
        self.slots.read().contains_key(name)
    }

    /// Writes a slot, returning the previous value.
    pub fn set_slot(&self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.slots.write().insert(name.into(), value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names() {
        assert_eq!(Value::from(5).type_name(), "int");
        assert_eq!(Value::from(5i64).type_name(), "long");
        assert_eq!(Value::from("x").type_name(), "string");
        let obj = Arc::new(Instance::new("app.Widget"));
        assert_eq!(Value::from(obj).type_name(), "app.Widget");
    }

    #[test]
    fn test_fits() {
        assert!(Value::Int(1).fits("int"));
        assert!(!Value::Int(1).fits("long"));
        assert!(Value::Null.fits("string"));
        assert!(!Value::Null.fits("int"));
    }

    #[test]
    fn test_object_equality_is_identity() {
        let a = Arc::new(Instance::new("app.Widget"));
        let b = Arc::new(Instance::new("app.Widget"));
        assert_eq!(Value::Object(a.clone()), Value::Object(a.clone()));
        assert_ne!(Value::Object(a), Value::Object(b));
    }

    #[test]
    fn test_instance_slots() {
        let obj = Instance::with_slots("app.Widget", [("count", Value::Int(0))]);
        assert!(obj.has_slot("count"));
        assert_eq!(obj.set_slot("count", Value::Int(7)), Some(Value::Int(0)));
        assert_eq!(obj.slot("count"), Some(Value::Int(7)));
        assert_eq!(obj.slot("missing"), None);
    }
}
