//! Member definitions and their runtime counterparts.
//!
//! A `*Def` is the declarative description handed to [`crate::ClassDef`].
//! Building a class turns each definition into a `Mirror*` member that
//! implements the matching `probe_core` capability trait.

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use probe_core::{
    AccessDenied, AccessFault, Accessible, BoxError, ConstructorInfo, FieldInfo, Instance, Member,
    MethodInfo, Modifiers, ObjectRef, Value, CONSTRUCTOR_NAME,
};

/// Body of a method: receives the target (`None` for static methods) and arguments.
pub type MethodBody =
    Arc<dyn Fn(Option<&ObjectRef>, &[Value]) -> Result<Value, BoxError> + Send + Sync>;

/// Body of a constructor: fills in a freshly allocated instance.
pub type ConstructorBody = Arc<dyn Fn(&Instance, &[Value]) -> Result<(), BoxError> + Send + Sync>;

/// Zero value a slot of the given type starts with.
pub fn default_value(type_name: &str) -> Value {
    match type_name {
        "bool" => Value::Bool(false),
        "int" => Value::Int(0),
        "long" => Value::Long(0),
        "double" => Value::Float(0.0),
        _ => Value::Null,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DEFINITIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Declaration of a field.
#[derive(Clone, Debug)]
pub struct FieldDef {
    pub(crate) name: String,
    pub(crate) field_type: String,
    pub(crate) modifiers: Modifiers,
    pub(crate) sealed: bool,
    pub(crate) initial: Value,
}

impl FieldDef {
    /// Declares a package-private instance field starting at its type's zero value.
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        let field_type = field_type.into();
        Self {
            name: name.into(),
            initial: default_value(&field_type),
            field_type,
            modifiers: Modifiers::empty(),
            sealed: false,
        }
    }

    /// Sets the declared access flags.
    pub fn modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Sets the value new instances (or the static slot) start with.
    pub fn initial(mut self, value: impl Into<Value>) -> Self {
        self.initial = value.into();
        self
    }

    /// Marks the field as refusing accessibility elevation.
    pub fn sealed(mut self) -> Self {
        self.sealed = true;
        self
    }
}

/// Declaration of a method.
#[derive(Clone)]
pub struct MethodDef {
    pub(crate) name: String,
    pub(crate) parameter_types: Vec<String>,
    pub(crate) return_type: String,
    pub(crate) modifiers: Modifiers,
    pub(crate) sealed: bool,
    pub(crate) body: MethodBody,
}

impl MethodDef {
    /// Declares a package-private instance method.
    pub fn new<F>(name: impl Into<String>, parameter_types: &[&str], return_type: &str, body: F) -> Self
    where
        F: Fn(Option<&ObjectRef>, &[Value]) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            parameter_types: parameter_types.iter().map(|t| (*t).to_owned()).collect(),
            return_type: return_type.to_owned(),
            modifiers: Modifiers::empty(),
            sealed: false,
            body: Arc::new(body),
        }
    }

    /// Sets the declared access flags.
    pub fn modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Marks the method as refusing accessibility elevation.
    pub fn sealed(mut self) -> Self {
        self.sealed = true;
        self
    }
}

impl fmt::Debug for MethodDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDef")
            .field("name", &self.name)
            .field("parameter_types", &self.parameter_types)
            .field("return_type", &self.return_type)
            .field("modifiers", &self.modifiers)
            .finish_non_exhaustive()
    }
}

/// Declaration of a constructor.
#[derive(Clone)]
pub struct ConstructorDef {
    pub(crate) parameter_types: Vec<String>,
    pub(crate) modifiers: Modifiers,
    pub(crate) sealed: bool,
    pub(crate) body: ConstructorBody,
}

impl ConstructorDef {
    /// Declares a package-private constructor.
    pub fn new<F>(parameter_types: &[&str], body: F) -> Self
    where
        F: Fn(&Instance, &[Value]) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Self {
            parameter_types: parameter_types.iter().map(|t| (*t).to_owned()).collect(),
            modifiers: Modifiers::empty(),
            sealed: false,
            body: Arc::new(body),
        }
    }

    /// Public no-argument constructor that leaves every slot at its initial value.
    pub fn implicit() -> Self {
        Self::new(&[], |_, _| Ok(())).modifiers(Modifiers::PUBLIC)
    }

    /// Sets the declared access flags.
    pub fn modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Marks the constructor as refusing accessibility elevation.
    pub fn sealed(mut self) -> Self {
        self.sealed = true;
        self
    }
}

impl fmt::Debug for ConstructorDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorDef")
            .field("parameter_types", &self.parameter_types)
            .field("modifiers", &self.modifiers)
            .finish_non_exhaustive()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ACCESS CONTROL
// ═══════════════════════════════════════════════════════════════════════════════

/// Accessibility state shared by every mirror member.
///
/// Starts accessible iff the member is `PUBLIC`. A sealed member never moves
/// from inaccessible to accessible, persistently or temporarily.
#[derive(Debug)]
struct AccessGate {
    qualified_name: String,
    state: Mutex<GateState>,
    sealed: bool,
}

#[derive(Debug)]
struct GateState {
    accessible: bool,
    /// Outstanding `acquire_access` calls
    holds: usize,
}

impl AccessGate {
    fn new(qualified_name: String, modifiers: Modifiers, sealed: bool) -> Self {
        Self {
            qualified_name,
            state: Mutex::new(GateState {
                accessible: modifiers.contains(Modifiers::PUBLIC),
                holds: 0,
            }),
            sealed,
        }
    }

    fn is_open(&self) -> bool {
        self.state.lock().accessible
    }

    fn refuse_if_sealed(&self, state: &GateState) -> Result<(), AccessDenied> {
        if self.sealed && !state.accessible {
            return Err(AccessDenied::new(
                &self.qualified_name,
                "member is sealed against reflective access",
            ));
        }
        Ok(())
    }

    fn set(&self, flag: bool) -> Result<(), AccessDenied> {
        let mut state = self.state.lock();
        if flag {
            self.refuse_if_sealed(&state)?;
        }
        state.accessible = flag;
        Ok(())
    }

    fn acquire(&self) -> Result<(), AccessDenied> {
        let mut state = self.state.lock();
        self.refuse_if_sealed(&state)?;
        state.holds += 1;
        Ok(())
    }

    fn release(&self) -> Result<(), AccessDenied> {
        let mut state = self.state.lock();
        match state.holds.checked_sub(1) {
            Some(holds) => {
                state.holds = holds;
                Ok(())
            }
            None => Err(AccessDenied::new(
                &self.qualified_name,
                "release without a matching acquire",
            )),
        }
    }

    fn check(&self) -> Result<(), AccessFault> {
        let state = self.state.lock();
        if state.accessible || state.holds > 0 {
            Ok(())
        } else {
            Err(AccessDenied::new(&self.qualified_name, "member is not accessible").into())
        }
    }
}

/// Resolves the receiver of an instance member.
fn receiver<'a>(
    member: &str,
    structure: &str,
    target: Option<&'a Value>,
) -> Result<&'a ObjectRef, AccessFault> {
    match target {
        Some(Value::Object(obj)) if obj.structure() == structure => Ok(obj),
        Some(other) => Err(AccessFault::IllegalArgument(format!(
            "{member} cannot be applied to a value of type {}",
            other.type_name()
        ))),
        None => Err(AccessFault::IllegalArgument(format!(
            "{member} requires a target instance"
        ))),
    }
}

fn check_arguments(member: &str, parameter_types: &[String], args: &[Value]) -> Result<(), AccessFault> {
    if parameter_types.len() != args.len() {
        return Err(AccessFault::IllegalArgument(format!(
            "{member} expects {} argument(s), got {}",
            parameter_types.len(),
            args.len()
        )));
    }
    for (index, (declared, arg)) in parameter_types.iter().zip(args).enumerate() {
        if !arg.fits(declared) {
            return Err(AccessFault::IllegalArgument(format!(
                "argument {index} of {member}: expected {declared}, got {}",
                arg.type_name()
            )));
        }
    }
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// FIELD
// ═══════════════════════════════════════════════════════════════════════════════

/// Runtime field of a [`crate::MirrorClass`].
#[derive(Debug)]
pub struct MirrorField {
    structure: String,
    def: FieldDef,
    gate: AccessGate,
    /// Storage for static fields; instance fields live in [`Instance`] slots.
    static_slot: Option<RwLock<Value>>,
}

impl MirrorField {
    pub(crate) fn new(structure: &str, def: FieldDef) -> Self {
        let gate = AccessGate::new(format!("{structure}.{}", def.name), def.modifiers, def.sealed);
        let static_slot = def
            .modifiers
            .is_static()
            .then(|| RwLock::new(def.initial.clone()));
        Self {
            structure: structure.to_owned(),
            def,
            gate,
            static_slot,
        }
    }

    /// Name and starting value of the slot every new instance carries.
    pub(crate) fn instance_slot(&self) -> Option<(String, Value)> {
        match self.static_slot {
            Some(_) => None,
            None => Some((self.def.name.clone(), self.def.initial.clone())),
        }
    }

    /// Reads a static slot without access checks.
    pub(crate) fn static_value(&self) -> Option<Value> {
        self.static_slot.as_ref().map(|slot| slot.read().clone())
    }

    /// Writes a static slot without access checks.
    pub(crate) fn store_static(&self, value: Value) -> bool {
        match &self.static_slot {
            Some(slot) => {
                *slot.write() = value;
                true
            }
            None => false,
        }
    }

    fn qualified_name(&self) -> &str {
        &self.gate.qualified_name
    }
}

impl Accessible for MirrorField {
    fn is_accessible(&self) -> bool {
        self.gate.is_open()
    }

    fn set_accessible(&self, flag: bool) -> Result<(), AccessDenied> {
        self.gate.set(flag)
    }

    fn acquire_access(&self) -> Result<(), AccessDenied> {
        self.gate.acquire()
    }

    fn release_access(&self) -> Result<(), AccessDenied> {
        self.gate.release()
    }
}

impl Member for MirrorField {
    fn name(&self) -> &str {
        &self.def.name
    }

    fn modifiers(&self) -> Modifiers {
        self.def.modifiers
    }
}

impl FieldInfo for MirrorField {
    fn field_type(&self) -> &str {
        &self.def.field_type
    }

    fn get(&self, target: Option<&Value>) -> Result<Value, AccessFault> {
        self.gate.check()?;
        if let Some(slot) = &self.static_slot {
            return Ok(slot.read().clone());
        }
        let obj = receiver(self.qualified_name(), &self.structure, target)?;
        Ok(obj
            .slot(&self.def.name)
            .unwrap_or_else(|| default_value(&self.def.field_type)))
    }

    fn set(&self, target: Option<&Value>, value: Value) -> Result<(), AccessFault> {
        self.gate.check()?;
        if !value.fits(&self.def.field_type) {
            return Err(AccessFault::IllegalArgument(format!(
                "cannot assign {} to {} of type {}",
                value.type_name(),
                self.qualified_name(),
                self.def.field_type
            )));
        }
        match &self.static_slot {
            Some(_) if self.def.modifiers.contains(Modifiers::FINAL) => Err(AccessDenied::new(
                self.qualified_name(),
                "static final field cannot be reassigned",
            )
            .into()),
            Some(slot) => {
                *slot.write() = value;
                Ok(())
            }
            None => {
                let obj = receiver(self.qualified_name(), &self.structure, target)?;
                obj.set_slot(self.def.name.as_str(), value);
                Ok(())
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// METHOD
// ═══════════════════════════════════════════════════════════════════════════════

/// Runtime method of a [`crate::MirrorClass`].
#[derive(Debug)]
pub struct MirrorMethod {
    structure: String,
    def: MethodDef,
    gate: AccessGate,
}

impl MirrorMethod {
    pub(crate) fn new(structure: &str, def: MethodDef) -> Self {
        let gate = AccessGate::new(format!("{structure}.{}", def.name), def.modifiers, def.sealed);
        Self {
            structure: structure.to_owned(),
            def,
            gate,
        }
    }
}

impl Accessible for MirrorMethod {
    fn is_accessible(&self) -> bool {
        self.gate.is_open()
    }

    fn set_accessible(&self, flag: bool) -> Result<(), AccessDenied> {
        self.gate.set(flag)
    }

    fn acquire_access(&self) -> Result<(), AccessDenied> {
        self.gate.acquire()
    }

    fn release_access(&self) -> Result<(), AccessDenied> {
        self.gate.release()
    }
}

impl Member for MirrorMethod {
    fn name(&self) -> &str {
        &self.def.name
    }

    fn modifiers(&self) -> Modifiers {
        self.def.modifiers
    }
}

impl MethodInfo for MirrorMethod {
    fn parameter_types(&self) -> &[String] {
        &self.def.parameter_types
    }

    fn return_type(&self) -> &str {
        &self.def.return_type
    }

    fn invoke(&self, target: Option<&Value>, args: &[Value]) -> Result<Value, AccessFault> {
        self.gate.check()?;
        let member = self.gate.qualified_name.as_str();
        let this = if self.def.modifiers.is_static() {
            None
        } else {
            Some(receiver(member, &self.structure, target)?)
        };
        check_arguments(member, &self.def.parameter_types, args)?;
        (self.def.body)(this, args).map_err(AccessFault::Raised)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONSTRUCTOR
// ═══════════════════════════════════════════════════════════════════════════════

/// Runtime constructor of a [`crate::MirrorClass`].
#[derive(Debug)]
pub struct MirrorConstructor {
    structure: String,
    def: ConstructorDef,
    gate: AccessGate,
    /// Slots every new instance starts with.
    template: Vec<(String, Value)>,
}

impl MirrorConstructor {
    pub(crate) fn new(structure: &str, def: ConstructorDef, template: Vec<(String, Value)>) -> Self {
        let gate = AccessGate::new(
            format!("{structure}.{CONSTRUCTOR_NAME}"),
            def.modifiers,
            def.sealed,
        );
        Self {
            structure: structure.to_owned(),
            def,
            gate,
            template,
        }
    }
}

impl Accessible for MirrorConstructor {
    fn is_accessible(&self) -> bool {
        self.gate.is_open()
    }

    fn set_accessible(&self, flag: bool) -> Result<(), AccessDenied> {
        self.gate.set(flag)
    }

    fn acquire_access(&self) -> Result<(), AccessDenied> {
        self.gate.acquire()
    }

    fn release_access(&self) -> Result<(), AccessDenied> {
        self.gate.release()
    }
}

impl Member for MirrorConstructor {
    fn name(&self) -> &str {
        CONSTRUCTOR_NAME
    }

    fn modifiers(&self) -> Modifiers {
        self.def.modifiers
    }
}

impl ConstructorInfo for MirrorConstructor {
    fn parameter_types(&self) -> &[String] {
        &self.def.parameter_types
    }

    fn new_instance(&self, args: &[Value]) -> Result<Value, AccessFault> {
        self.gate.check()?;
        check_arguments(&self.gate.qualified_name, &self.def.parameter_types, args)?;
        let instance = Instance::with_slots(self.structure.as_str(), self.template.iter().cloned());
        (self.def.body)(&instance, args).map_err(AccessFault::Raised)?;
        Ok(Value::Object(Arc::new(instance)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter_field(modifiers: Modifiers) -> MirrorField {
        MirrorField::new("app.Widget", FieldDef::new("count", "int").modifiers(modifiers))
    }

    fn widget() -> Value {
        Value::Object(Arc::new(Instance::with_slots(
            "app.Widget",
            [("count", Value::Int(3))],
        )))
    }

    #[test]
    fn test_public_members_start_accessible() {
        assert!(counter_field(Modifiers::PUBLIC).is_accessible());
        assert!(!counter_field(Modifiers::PRIVATE).is_accessible());
    }

    #[test]
    fn test_inaccessible_field_is_denied() {
        let field = counter_field(Modifiers::PRIVATE);
        let err = field.get(Some(&widget())).unwrap_err();
        assert!(matches!(err, AccessFault::Denied(_)));

        field.set_accessible(true).unwrap();
        assert_eq!(field.get(Some(&widget())).unwrap(), Value::Int(3));
    }

    #[test]
    fn test_sealed_member_refuses_elevation() {
        let field = MirrorField::new(
            "app.Widget",
            FieldDef::new("secret", "string").modifiers(Modifiers::PRIVATE).sealed(),
        );
        let err = field.set_accessible(true).unwrap_err();
        assert_eq!(err.member, "app.Widget.secret");
        assert!(!field.is_accessible());
        assert!(field.set_accessible(false).is_ok());
    }

    #[test]
    fn test_acquisitions_nest_and_leave_persistent_flag() {
        let field = counter_field(Modifiers::PRIVATE);
        field.acquire_access().unwrap();
        field.acquire_access().unwrap();
        assert!(!field.is_accessible());
        assert!(field.get(Some(&widget())).is_ok());

        field.release_access().unwrap();
        assert!(field.get(Some(&widget())).is_ok());
        field.release_access().unwrap();
        assert!(matches!(
            field.get(Some(&widget())),
            Err(AccessFault::Denied(_))
        ));
        assert!(field.release_access().is_err());
    }

    #[test]
    fn test_persistent_change_during_acquisition() {
        let field = counter_field(Modifiers::PRIVATE);
        field.acquire_access().unwrap();
        field.set_accessible(true).unwrap();
        field.release_access().unwrap();
        assert!(field.is_accessible());
        assert!(field.get(Some(&widget())).is_ok());
    }

    #[test]
    fn test_sealed_member_refuses_acquisition() {
        let field = MirrorField::new(
            "app.Widget",
            FieldDef::new("secret", "string").modifiers(Modifiers::PRIVATE).sealed(),
        );
        assert!(field.acquire_access().is_err());
        assert!(field.release_access().is_err());
    }

    #[test]
    fn test_field_rejects_wrong_target_and_type() {
        let field = counter_field(Modifiers::PUBLIC);
        assert!(matches!(
            field.get(None),
            Err(AccessFault::IllegalArgument(_))
        ));
        let other = Value::Object(Arc::new(Instance::new("app.Gadget")));
        assert!(matches!(
            field.get(Some(&other)),
            Err(AccessFault::IllegalArgument(_))
        ));
        assert!(matches!(
            field.set(Some(&widget()), Value::from("seven")),
            Err(AccessFault::IllegalArgument(_))
        ));
    }

    #[test]
    fn test_static_field_ignores_target() {
        let field = MirrorField::new(
            "app.Widget",
            FieldDef::new("created", "long")
                .modifiers(Modifiers::PUBLIC | Modifiers::STATIC)
                .initial(5i64),
        );
        assert!(field.instance_slot().is_none());
        assert_eq!(field.get(None).unwrap(), Value::Long(5));
        field.set(None, Value::Long(6)).unwrap();
        assert_eq!(field.static_value(), Some(Value::Long(6)));
    }

    #[test]
    fn test_static_final_field_is_read_only() {
        let field = MirrorField::new(
            "app.Widget",
            FieldDef::new("LIMIT", "int")
                .modifiers(Modifiers::PUBLIC | Modifiers::STATIC | Modifiers::FINAL)
                .initial(10),
        );
        assert!(matches!(
            field.set(None, Value::Int(11)),
            Err(AccessFault::Denied(_))
        ));
        assert_eq!(field.get(None).unwrap(), Value::Int(10));
    }

    #[test]
    fn test_method_checks_arguments_and_wraps_failures() {
        let method = MirrorMethod::new(
            "app.Widget",
            MethodDef::new("div", &["int", "int"], "int", |_, args| {
                let (a, b) = (args[0].as_int().unwrap_or(0), args[1].as_int().unwrap_or(0));
                a.checked_div(b).map(Value::Int).ok_or_else(|| "division by zero".into())
            })
            .modifiers(Modifiers::PUBLIC),
        );
        let target = widget();
        assert_eq!(
            method.invoke(Some(&target), &[Value::Int(6), Value::Int(3)]).unwrap(),
            Value::Int(2)
        );
        assert!(matches!(
            method.invoke(Some(&target), &[Value::Int(6)]),
            Err(AccessFault::IllegalArgument(_))
        ));
        let err = method
            .invoke(Some(&target), &[Value::Int(6), Value::Int(0)])
            .unwrap_err();
        match err {
            AccessFault::Raised(cause) => assert_eq!(cause.to_string(), "division by zero"),
            other => panic!("unexpected fault: {other:?}"),
        }
    }

    #[test]
    fn test_constructor_fills_template_then_runs_body() {
        let ctor = MirrorConstructor::new(
            "app.Widget",
            ConstructorDef::new(&["int"], |obj, args| {
                obj.set_slot("count", args[0].clone());
                Ok(())
            })
            .modifiers(Modifiers::PUBLIC),
            vec![
                ("count".to_owned(), Value::Int(0)),
                ("label".to_owned(), Value::Null),
            ],
        );
        assert_eq!(ctor.name(), CONSTRUCTOR_NAME);
        let created = ctor.new_instance(&[Value::Int(9)]).unwrap();
        let obj = created.as_object().unwrap();
        assert_eq!(obj.structure(), "app.Widget");
        assert_eq!(obj.slot("count"), Some(Value::Int(9)));
        assert_eq!(obj.slot("label"), Some(Value::Null));
    }
}
