//! Class definitions and the structures built from them.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use probe_core::{
    BoxError, ConstructorInfo, FieldInfo, LoadError, Member, MethodInfo, Structure, Value,
};

use crate::member::{
    ConstructorDef, FieldDef, MethodDef, MirrorConstructor, MirrorField, MirrorMethod,
};

/// One-time class initializer. Receives the class so it can seed static fields.
pub type Initializer = Box<dyn FnOnce(&MirrorClass) -> Result<(), BoxError> + Send>;

/// Declarative description of a class.
///
/// ```rust
/// use probe_core::Modifiers;
/// use probe_mirror::{ClassDef, FieldDef};
///
/// let class = ClassDef::new("app.Widget")
///     .field(FieldDef::new("count", "int").modifiers(Modifiers::PRIVATE))
///     .build();
/// assert_eq!(class.name(), "app.Widget");
/// ```
pub struct ClassDef {
    name: String,
    fields: Vec<FieldDef>,
    methods: Vec<MethodDef>,
    constructors: Vec<ConstructorDef>,
    initializer: Option<Initializer>,
}

impl ClassDef {
    /// Starts an empty class definition.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            methods: Vec::new(),
            constructors: Vec::new(),
            initializer: None,
        }
    }

    /// Fully-qualified name being defined.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declares a field. Declaration order is preserved.
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Declares a method. Declaration order is preserved.
    pub fn method(mut self, method: MethodDef) -> Self {
        self.methods.push(method);
        self
    }

    /// Declares a constructor. Declaration order is preserved.
    pub fn constructor(mut self, constructor: ConstructorDef) -> Self {
        self.constructors.push(constructor);
        self
    }

    /// Sets the initializer run on the first initializing load.
    pub fn initializer<F>(mut self, init: F) -> Self
    where
        F: FnOnce(&MirrorClass) -> Result<(), BoxError> + Send + 'static,
    {
        self.initializer = Some(Box::new(init));
        self
    }

    /// Builds the runtime class.
    ///
    /// A class declaring no constructor receives [`ConstructorDef::implicit`].
    pub fn build(self) -> MirrorClass {
        let fields: Vec<Arc<MirrorField>> = self
            .fields
            .into_iter()
            .map(|def| Arc::new(MirrorField::new(&self.name, def)))
            .collect();
        let template: Vec<(String, Value)> =
            fields.iter().filter_map(|f| f.instance_slot()).collect();

        let mut constructors = self.constructors;
        if constructors.is_empty() {
            constructors.push(ConstructorDef::implicit());
        }
        let constructors = constructors
            .into_iter()
            .map(|def| Arc::new(MirrorConstructor::new(&self.name, def, template.clone())))
            .collect();

        let methods = self
            .methods
            .into_iter()
            .map(|def| Arc::new(MirrorMethod::new(&self.name, def)))
            .collect();

        let init = match self.initializer {
            Some(init) => InitState::Pending(init),
            None => InitState::Done,
        };

        MirrorClass {
            name: self.name,
            fields,
            methods,
            constructors,
            init: Mutex::new(init),
        }
    }
}

impl fmt::Debug for ClassDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDef")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("methods", &self.methods)
            .field("constructors", &self.constructors)
            .field("initializer", &self.initializer.is_some())
            .finish()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RUNTIME CLASS
// ═══════════════════════════════════════════════════════════════════════════════

enum InitState {
    Pending(Initializer),
    Done,
    Failed(String),
}

/// A defined class, usable as a [`Structure`].
pub struct MirrorClass {
    name: String,
    fields: Vec<Arc<MirrorField>>,
    methods: Vec<Arc<MirrorMethod>>,
    constructors: Vec<Arc<MirrorConstructor>>,
    init: Mutex<InitState>,
}

impl MirrorClass {
    /// Fully-qualified name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true once the initializer has completed (or if there is none).
    ///
    /// Blocks while the initializer runs, so it must not be called from it.
    pub fn is_initialized(&self) -> bool {
        matches!(*self.init.lock(), InitState::Done)
    }

    /// Reads a static field directly, bypassing access control.
    pub fn static_value(&self, field: &str) -> Option<Value> {
        self.field_named(field).and_then(|f| f.static_value())
    }

    /// Writes a static field directly, bypassing access control.
    ///
    /// Returns false if no static field has that name.
    pub fn set_static(&self, field: &str, value: impl Into<Value>) -> bool {
        self.field_named(field)
            .map_or(false, |f| f.store_static(value.into()))
    }

    fn field_named(&self, name: &str) -> Option<&Arc<MirrorField>> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Runs the initializer if it has not run yet.
    ///
    /// Concurrent callers wait for the running initializer. An initializer
    /// that fails or panics leaves the class permanently unusable for
    /// initializing loads.
    pub(crate) fn ensure_initialized(&self) -> Result<(), LoadError> {
        let mut state = self.init.lock();
        // Stays in place if the initializer unwinds.
        let interrupted = InitState::Failed("initializer panicked".to_owned());
        match std::mem::replace(&mut *state, interrupted) {
            InitState::Done => {
                *state = InitState::Done;
                Ok(())
            }
            InitState::Pending(init) => {
                debug!(class = %self.name, "running class initializer");
                match init(self) {
                    Ok(()) => {
                        *state = InitState::Done;
                        Ok(())
                    }
                    Err(source) => {
                        *state = InitState::Failed(source.to_string());
                        Err(LoadError::InitializationFailed {
                            name: self.name.clone(),
                            source,
                        })
                    }
                }
            }
            InitState::Failed(message) => {
                let source: BoxError = format!("earlier initialization failed: {message}").into();
                *state = InitState::Failed(message);
                Err(LoadError::InitializationFailed {
                    name: self.name.clone(),
                    source,
                })
            }
        }
    }
}

impl Structure for MirrorClass {
    fn name(&self) -> &str {
        &self.name
    }

    fn declared_fields(&self) -> Vec<Arc<dyn FieldInfo>> {
        self.fields
            .iter()
            .map(|f| Arc::clone(f) as Arc<dyn FieldInfo>)
            .collect()
    }

    fn declared_methods(&self) -> Vec<Arc<dyn MethodInfo>> {
        self.methods
            .iter()
            .map(|m| Arc::clone(m) as Arc<dyn MethodInfo>)
            .collect()
    }

    fn declared_constructors(&self) -> Vec<Arc<dyn ConstructorInfo>> {
        self.constructors
            .iter()
            .map(|c| Arc::clone(c) as Arc<dyn ConstructorInfo>)
            .collect()
    }
}

impl fmt::Debug for MirrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MirrorClass")
            .field("name", &self.name)
            .field("fields", &self.fields.len())
            .field("methods", &self.methods.len())
            .field("constructors", &self.constructors.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use probe_core::Modifiers;

    use super::*;

    #[test]
    fn test_declaration_order_is_kept() {
        let class = ClassDef::new("app.Widget")
            .field(FieldDef::new("b", "int"))
            .field(FieldDef::new("a", "int"))
            .method(MethodDef::new("z", &[], "void", |_, _| Ok(Value::Null)))
            .method(MethodDef::new("y", &[], "void", |_, _| Ok(Value::Null)))
            .build();
        let fields: Vec<String> = class
            .declared_fields()
            .iter()
            .map(|f| f.name().to_owned())
            .collect();
        assert_eq!(fields, ["b", "a"]);
        let methods: Vec<String> = class
            .declared_methods()
            .iter()
            .map(|m| m.name().to_owned())
            .collect();
        assert_eq!(methods, ["z", "y"]);
    }

    #[test]
    fn test_implicit_constructor() {
        let class = ClassDef::new("app.Widget")
            .field(FieldDef::new("count", "int").initial(4))
            .build();
        let ctors = class.declared_constructors();
        assert_eq!(ctors.len(), 1);
        assert!(ctors[0].modifiers().contains(Modifiers::PUBLIC));
        let obj = ctors[0].new_instance(&[]).unwrap();
        assert_eq!(obj.as_object().unwrap().slot("count"), Some(Value::Int(4)));
    }

    #[test]
    fn test_enumeration_returns_same_members() {
        let class = ClassDef::new("app.Widget")
            .field(FieldDef::new("count", "int"))
            .build();
        let first = class.declared_fields();
        let second = class.declared_fields();
        assert!(Arc::ptr_eq(&first[0], &second[0]));
    }

    #[test]
    fn test_initializer_runs_once_and_seeds_statics() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let class = ClassDef::new("app.Registry")
            .field(FieldDef::new("started", "bool").modifiers(Modifiers::STATIC))
            .initializer(move |class| {
                counter.fetch_add(1, Ordering::SeqCst);
                class.set_static("started", true);
                Ok(())
            })
            .build();

        assert!(!class.is_initialized());
        assert_eq!(class.static_value("started"), Some(Value::Bool(false)));
        class.ensure_initialized().unwrap();
        class.ensure_initialized().unwrap();
        assert!(class.is_initialized());
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(class.static_value("started"), Some(Value::Bool(true)));
    }

    #[test]
    fn test_failed_initializer_is_sticky() {
        let class = ClassDef::new("app.Broken")
            .initializer(|_| Err("missing resource".into()))
            .build();
        let first = class.ensure_initialized().unwrap_err();
        assert!(first.to_string().contains("missing resource"));
        let second = class.ensure_initialized().unwrap_err();
        assert!(second.to_string().contains("earlier initialization failed"));
        assert!(!class.is_initialized());
    }

    #[test]
    fn test_panicking_initializer_is_sticky() {
        use std::panic::{self, AssertUnwindSafe};

        let class = ClassDef::new("app.Fragile")
            .initializer(|_| panic!("initializer blew up"))
            .build();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| class.ensure_initialized()));
        assert!(outcome.is_err());

        assert!(!class.is_initialized());
        let err = class.ensure_initialized().unwrap_err();
        assert!(err.to_string().contains("earlier initialization failed"));
        assert!(matches!(
            err,
            LoadError::InitializationFailed { ref source, .. } if source.to_string().contains("panicked")
        ));
    }
}
