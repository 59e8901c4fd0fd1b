//! In-memory class loader.
//!
//! Thread-safe class storage suitable for tests, benchmarks, and embedding
//! PROBE without a host runtime.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::{debug, instrument};

use probe_core::{LoadError, LoaderId, StructureLoader, TypeRef};

use crate::class::{ClassDef, MirrorClass};
use crate::error::DefineError;

/// Loader statistics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoaderStats {
    /// Classes defined directly by this loader
    pub defined: u64,
    /// Successful loads answered by this loader or its parents
    pub loads: u64,
    /// Loads that failed (undefined name or failed initializer)
    pub failed_loads: u64,
}

/// In-memory class loader.
///
/// Classes are looked up parent-first: a name defined by an ancestor always
/// resolves to the ancestor's class.
///
/// # Thread Safety
///
/// All operations are thread-safe and can be called concurrently.
#[derive(Debug)]
pub struct ClassLoader {
    id: LoaderId,
    name: String,
    parent: Option<Arc<ClassLoader>>,
    /// Primary storage: name → class
    classes: DashMap<String, Arc<MirrorClass>>,
    stats: RwLock<LoaderStats>,
}

impl ClassLoader {
    /// Creates a new root loader with no classes.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: LoaderId::next(),
            name: name.into(),
            parent: None,
            classes: DashMap::new(),
            stats: RwLock::new(LoaderStats::default()),
        }
    }

    /// Creates a loader that delegates to `parent` first.
    pub fn with_parent(name: impl Into<String>, parent: Arc<ClassLoader>) -> Self {
        Self {
            parent: Some(parent),
            ..Self::new(name)
        }
    }

    /// Display name of this loader.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent loader, if any.
    pub fn parent(&self) -> Option<&Arc<ClassLoader>> {
        self.parent.as_ref()
    }

    /// Defines a class in this loader.
    ///
    /// Names are unique per loader; redefinition is rejected.
    #[instrument(skip(self, def), fields(loader = %self.id, class = def.name()))]
    pub fn define(&self, def: ClassDef) -> Result<Arc<MirrorClass>, DefineError> {
        if def.name().trim().is_empty() {
            return Err(DefineError::BlankName);
        }
        match self.classes.entry(def.name().to_owned()) {
            Entry::Occupied(existing) => Err(DefineError::Duplicate {
                name: existing.key().clone(),
                loader: self.id,
            }),
            Entry::Vacant(slot) => {
                let class = Arc::new(def.build());
                slot.insert(Arc::clone(&class));
                self.stats.write().defined += 1;
                debug!("Defined class");
                Ok(class)
            }
        }
    }

    /// Returns a class defined directly by this loader.
    pub fn defined(&self, name: &str) -> Option<Arc<MirrorClass>> {
        self.classes.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Finds a class by name, asking the parent chain first.
    pub fn find(&self, name: &str) -> Option<Arc<MirrorClass>> {
        self.parent
            .as_ref()
            .and_then(|parent| parent.find(name))
            .or_else(|| self.defined(name))
    }

    /// Names of the classes defined directly by this loader, sorted.
    pub fn class_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.classes.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Returns the number of classes defined directly by this loader.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Returns true if this loader defines no classes.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Returns the current statistics.
    pub fn stats(&self) -> LoaderStats {
        self.stats.read().clone()
    }
}

impl StructureLoader for ClassLoader {
    fn id(&self) -> LoaderId {
        self.id
    }

    /// Loads a class, running its initializer first when `initialize` is set.
    #[instrument(skip(self), fields(loader = %self.id))]
    fn load(&self, name: &str, initialize: bool) -> Result<TypeRef, LoadError> {
        let outcome = match self.find(name) {
            Some(class) if initialize => class.ensure_initialized().map(|()| class),
            Some(class) => Ok(class),
            None => Err(LoadError::Undefined(name.to_owned())),
        };

        let mut stats = self.stats.write();
        match outcome {
            Ok(class) => {
                stats.loads += 1;
                debug!("Loaded class");
                Ok(class as TypeRef)
            }
            Err(err) => {
                stats.failed_loads += 1;
                debug!(error = %err, "Load failed");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    use probe_core::{Modifiers, Structure, Value};

    use super::*;
    use crate::member::FieldDef;

    #[test]
    fn test_define_and_load() {
        let loader = ClassLoader::new("app");
        loader.define(ClassDef::new("app.Widget")).unwrap();

        let loaded = loader.load("app.Widget", false).unwrap();
        assert_eq!(loaded.name(), "app.Widget");
        assert_eq!(loader.len(), 1);
        assert_eq!(loader.stats().loads, 1);
    }

    #[test]
    fn test_undefined_name() {
        let loader = ClassLoader::new("app");
        let err = loader.load("app.Missing", true).err().unwrap();
        assert!(matches!(err, LoadError::Undefined(ref name) if name == "app.Missing"));
        assert_eq!(loader.stats().failed_loads, 1);
    }

    #[test]
    fn test_duplicate_definition_rejected() {
        let loader = ClassLoader::new("app");
        loader.define(ClassDef::new("app.Widget")).unwrap();
        let err = loader.define(ClassDef::new("app.Widget")).unwrap_err();
        assert!(matches!(err, DefineError::Duplicate { .. }));
        assert!(matches!(
            loader.define(ClassDef::new("  ")),
            Err(DefineError::BlankName)
        ));
    }

    #[test]
    fn test_loaders_have_distinct_ids() {
        let a = ClassLoader::new("a");
        let b = ClassLoader::new("b");
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_parent_first_delegation() {
        let parent = Arc::new(ClassLoader::new("platform"));
        let shared = parent.define(ClassDef::new("lang.Text")).unwrap();
        let child = ClassLoader::with_parent("app", Arc::clone(&parent));
        let local = child.define(ClassDef::new("lang.Text")).unwrap();

        let found = child.find("lang.Text").unwrap();
        assert!(Arc::ptr_eq(&found, &shared));
        assert!(!Arc::ptr_eq(&found, &local));
        assert!(child.defined("lang.Text").is_some());
        assert_eq!(child.parent().map(|p| p.name()), Some("platform"));
    }

    #[test]
    fn test_initializer_runs_only_on_initializing_load() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let loader = ClassLoader::new("app");
        let class = loader
            .define(
                ClassDef::new("app.Config")
                    .field(FieldDef::new("ready", "bool").modifiers(Modifiers::STATIC))
                    .initializer(move |class| {
                        counter.fetch_add(1, Ordering::SeqCst);
                        class.set_static("ready", true);
                        Ok(())
                    }),
            )
            .unwrap();

        loader.load("app.Config", false).unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        loader.load("app.Config", true).unwrap();
        loader.load("app.Config", true).unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(class.static_value("ready"), Some(Value::Bool(true)));
    }

    #[test]
    fn test_failed_initializer_fails_load() {
        let loader = ClassLoader::new("app");
        loader
            .define(ClassDef::new("app.Broken").initializer(|_| Err("no config".into())))
            .unwrap();
        assert!(loader.load("app.Broken", false).is_ok());
        let err = loader.load("app.Broken", true).err().unwrap();
        assert!(matches!(err, LoadError::InitializationFailed { .. }));
    }

    #[test]
    fn test_panicking_initializer_fails_later_loads() {
        use std::panic::{self, AssertUnwindSafe};

        let loader = ClassLoader::new("app");
        loader
            .define(ClassDef::new("app.Fragile").initializer(|_| panic!("no config")))
            .unwrap();
        let first = panic::catch_unwind(AssertUnwindSafe(|| loader.load("app.Fragile", true)));
        assert!(first.is_err());

        let err = loader.load("app.Fragile", true).err().unwrap();
        assert!(matches!(err, LoadError::InitializationFailed { .. }));
        assert!(loader.load("app.Fragile", false).is_ok());
    }

    #[test]
    fn test_concurrent_define() {
        let loader = ClassLoader::new("app");
        thread::scope(|s| {
            for i in 0..32 {
                let loader = &loader;
                s.spawn(move || loader.define(ClassDef::new(format!("app.C{i}"))).unwrap());
            }
        });
        assert_eq!(loader.len(), 32);
        assert_eq!(loader.stats().defined, 32);
        assert_eq!(loader.class_names().len(), 32);
    }
}
