//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use probe_core::{LoadError, LoaderId, Modifiers, StructureLoader, TypeRef, Value};
use probe_mirror::{ClassDef, ClassLoader, ConstructorDef, FieldDef, MethodDef};
use probe_resolve::Reflector;
use tracing_subscriber::EnvFilter;

/// Installs a test-friendly subscriber once; `RUST_LOG` controls verbosity.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// `app.Widget`: one constructor, a private counter, and assorted members.
pub fn widget() -> ClassDef {
    ClassDef::new("app.Widget")
        .field(FieldDef::new("count", "int").modifiers(Modifiers::PRIVATE))
        .field(FieldDef::new("label", "string").modifiers(Modifiers::PUBLIC))
        .field(
            FieldDef::new("secret", "string")
                .modifiers(Modifiers::PRIVATE)
                .sealed(),
        )
        .field(
            FieldDef::new("created", "long")
                .modifiers(Modifiers::PRIVATE | Modifiers::STATIC),
        )
        .method(
            MethodDef::new("add", &["int", "int"], "int", |_, args| {
                let a = args[0].as_int().unwrap_or(0);
                let b = args[1].as_int().unwrap_or(0);
                Ok(Value::Int(a + b))
            })
            .modifiers(Modifiers::PUBLIC),
        )
        .method(
            MethodDef::new("bump", &[], "int", |this, _| {
                let obj = this.ok_or("bump needs a widget")?;
                let next = obj.slot("count").and_then(|v| v.as_int()).unwrap_or(0) + 1;
                obj.set_slot("count", Value::Int(next));
                Ok(Value::Int(next))
            })
            .modifiers(Modifiers::PRIVATE),
        )
        .method(
            MethodDef::new("explode", &[], "void", |_, _| Err("widget exploded".into()))
                .modifiers(Modifiers::PRIVATE),
        )
        .constructor(ConstructorDef::new(&[], |_, _| Ok(())).modifiers(Modifiers::PUBLIC))
}

/// `geo.Point`: two `int` fields declared `x` then `y`.
pub fn point() -> ClassDef {
    ClassDef::new("geo.Point")
        .field(FieldDef::new("x", "int").modifiers(Modifiers::PRIVATE))
        .field(FieldDef::new("y", "int").modifiers(Modifiers::PRIVATE))
        .constructor(
            ConstructorDef::new(&["int", "int"], |obj, args| {
                obj.set_slot("x", args[0].clone());
                obj.set_slot("y", args[1].clone());
                Ok(())
            })
            .modifiers(Modifiers::PUBLIC),
        )
        .constructor(ConstructorDef::new(&[], |_, _| Ok(())).modifiers(Modifiers::PRIVATE))
}

/// Loader holding [`widget`] and [`point`].
pub fn loader() -> Arc<ClassLoader> {
    let loader = Arc::new(ClassLoader::new("fixtures"));
    loader.define(widget()).expect("define widget");
    loader.define(point()).expect("define point");
    loader
}

/// Reflector over [`loader`].
pub fn reflector() -> (Arc<ClassLoader>, Reflector) {
    init_tracing();
    let loader = loader();
    let reflector = Reflector::new(loader.clone());
    (loader, reflector)
}

/// Loader wrapper that counts how often the runtime is actually asked.
pub struct CountingLoader {
    inner: Arc<ClassLoader>,
    loads: AtomicUsize,
}

impl CountingLoader {
    pub fn new(inner: Arc<ClassLoader>) -> Self {
        Self {
            inner,
            loads: AtomicUsize::new(0),
        }
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl StructureLoader for CountingLoader {
    fn id(&self) -> LoaderId {
        self.inner.id()
    }

    fn load(&self, name: &str, initialize: bool) -> Result<TypeRef, LoadError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.inner.load(name, initialize)
    }
}
