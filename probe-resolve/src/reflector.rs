//! The resolution facade.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, instrument};

use probe_cache::{CacheRef, CacheStats};
use probe_core::{
    ConstructorKey, FieldKey, MemberKind, MethodKey, Modifiers, ProbeError, Result, Structure,
    StructureLoader, TypeKey, TypeRef,
};

use crate::caches::{ConstructorCache, FieldCache, MethodCache, TypeCache};
use crate::config::ReflectorConfig;
use crate::handle::{ConstructorInitializer, FieldAccessor, MethodInvoker};
use crate::resolve;

// ═══════════════════════════════════════════════════════════════════════════════
// RESOLUTION CONTEXT
// ═══════════════════════════════════════════════════════════════════════════════

/// Where and how a structure is loaded.
#[derive(Clone)]
pub struct ResolutionContext {
    loader: Arc<dyn StructureLoader>,
    initialize: bool,
}

impl ResolutionContext {
    /// Creates a context for `loader`.
    pub fn new(loader: Arc<dyn StructureLoader>, initialize: bool) -> Self {
        Self { loader, initialize }
    }

    /// Loader used to find structures.
    pub fn loader(&self) -> &Arc<dyn StructureLoader> {
        &self.loader
    }

    /// Whether loads run the structure's initializer.
    pub fn initialize(&self) -> bool {
        self.initialize
    }

    /// Same loader, different initialization policy.
    pub fn with_initialize(mut self, initialize: bool) -> Self {
        self.initialize = initialize;
        self
    }
}

impl fmt::Debug for ResolutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolutionContext")
            .field("loader", &self.loader.id())
            .field("initialize", &self.initialize)
            .finish()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// REFLECTOR
// ═══════════════════════════════════════════════════════════════════════════════

/// Statistics of every cache owned by a [`Reflector`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReflectorStats {
    /// Loaded structures
    pub types: CacheStats,
    /// Field accessors
    pub fields: CacheStats,
    /// Method invokers
    pub methods: CacheStats,
    /// Constructor initializers
    pub constructors: CacheStats,
}

/// Validates lookups, resolves members, and caches the resulting handles.
///
/// A `Reflector` owns one cache per resolution kind. Handles are returned as
/// [`CacheRef`]s: a handle stays cached exactly as long as some caller holds
/// it, so dropping every reference lets the next access purge it. Each
/// member handle holds its declaring structure, which therefore stays in the
/// type cache while any handle for one of its members is alive.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
///
/// use probe_core::{Modifiers, Value};
/// use probe_mirror::{ClassDef, ClassLoader, FieldDef};
/// use probe_resolve::Reflector;
///
/// let loader = Arc::new(ClassLoader::new("app"));
/// loader
///     .define(ClassDef::new("app.Widget").field(FieldDef::new("count", "int").modifiers(Modifiers::PRIVATE)))
///     .unwrap();
///
/// let reflector = Reflector::new(loader);
/// let ctor = reflector.resolve_constructor("app.Widget", None, Modifiers::empty()).unwrap();
/// let count = reflector.resolve_attribute("app.Widget", Some("count"), None, Modifiers::empty()).unwrap();
///
/// let widget = ctor.construct_default().unwrap();
/// count.write(&widget, 5).unwrap();
/// assert_eq!(count.read(&widget).unwrap(), Value::Int(5));
/// ```
pub struct Reflector {
    context: ResolutionContext,
    types: TypeCache,
    fields: FieldCache,
    methods: MethodCache,
    constructors: ConstructorCache,
}

impl Reflector {
    /// Creates a reflector over `loader` with default configuration.
    pub fn new(loader: Arc<dyn StructureLoader>) -> Self {
        Self::with_config(loader, ReflectorConfig::default())
    }

    /// Creates a reflector with custom configuration.
    pub fn with_config(loader: Arc<dyn StructureLoader>, config: ReflectorConfig) -> Self {
        Self::with_caches(
            ResolutionContext::new(loader, config.initialize_types),
            TypeCache::new("types", config.types),
            FieldCache::new("fields", config.fields),
            MethodCache::new("methods", config.methods),
            ConstructorCache::new("constructors", config.constructors),
        )
    }

    /// Creates a reflector from explicitly constructed caches.
    pub fn with_caches(
        context: ResolutionContext,
        types: TypeCache,
        fields: FieldCache,
        methods: MethodCache,
        constructors: ConstructorCache,
    ) -> Self {
        Self {
            context,
            types,
            fields,
            methods,
            constructors,
        }
    }

    /// Default context used by member resolution and [`Reflector::resolve_type`].
    pub fn context(&self) -> &ResolutionContext {
        &self.context
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // TYPES
    // ═══════════════════════════════════════════════════════════════════════════

    /// Loads a structure through the default context.
    pub fn resolve_type(&self, name: &str) -> Result<CacheRef<TypeRef>> {
        self.resolve_type_with(name, &self.context)
    }

    /// Loads a structure through `context`.
    ///
    /// Results are cached per (name, loader, initialization policy).
    #[instrument(skip(self, context), fields(loader = %context.loader().id(), initialize = context.initialize()))]
    pub fn resolve_type_with(&self, name: &str, context: &ResolutionContext) -> Result<CacheRef<TypeRef>> {
        require_name("structure", name)?;
        let key = TypeKey::new(name, context.loader().id(), context.initialize());
        self.types.get_or_resolve(key, |key| {
            debug!(%key, "Loading structure");
            resolve::load_type(&**context.loader(), key.name(), key.initialize())
        })
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // MEMBERS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Resolves a field of `structure`.
    ///
    /// At least one criterion is required. Absent criteria match any field;
    /// the first declared field matching every present criterion is used.
    #[instrument(skip(self))]
    pub fn resolve_attribute(
        &self,
        structure: &str,
        name: Option<&str>,
        field_type: Option<&str>,
        modifiers: Modifiers,
    ) -> Result<CacheRef<FieldAccessor>> {
        require_name("structure", structure)?;
        require_optional_name("field", name)?;
        require_optional_name("field type", field_type)?;
        require_legal(MemberKind::Field, modifiers)?;
        if name.is_none() && field_type.is_none() && modifiers.is_empty() {
            return Err(no_criteria(MemberKind::Field));
        }

        let key = FieldKey::new(structure, name, field_type, modifiers);
        self.fields.get_or_resolve(key, |key| {
            let ty = self.resolve_type(key.structure())?;
            let field = resolve::find_field(structure_of(&ty), key)?;
            let handle = FieldAccessor::new(ty.name(), field)?;
            Ok(handle.holding(ty))
        })
    }

    /// Resolves a method of `structure`.
    ///
    /// At least one criterion is required. `parameter_types` must match the
    /// declared list exactly, element by element.
    #[instrument(skip(self))]
    pub fn resolve_operation(
        &self,
        structure: &str,
        name: Option<&str>,
        parameter_types: Option<&[&str]>,
        return_type: Option<&str>,
        modifiers: Modifiers,
    ) -> Result<CacheRef<MethodInvoker>> {
        require_name("structure", structure)?;
        require_optional_name("method", name)?;
        require_type_list(parameter_types)?;
        require_optional_name("return type", return_type)?;
        require_legal(MemberKind::Method, modifiers)?;
        if name.is_none() && parameter_types.is_none() && return_type.is_none() && modifiers.is_empty() {
            return Err(no_criteria(MemberKind::Method));
        }

        let key = MethodKey::new(structure, name, parameter_types, return_type, modifiers);
        self.methods.get_or_resolve(key, |key| {
            let ty = self.resolve_type(key.structure())?;
            let method = resolve::find_method(structure_of(&ty), key)?;
            let handle = MethodInvoker::new(ty.name(), method)?;
            Ok(handle.holding(ty))
        })
    }

    /// Resolves a constructor of `structure`.
    ///
    /// Criteria are optional: with none, a structure's sole constructor (or
    /// its first declared one) is used.
    #[instrument(skip(self))]
    pub fn resolve_constructor(
        &self,
        structure: &str,
        parameter_types: Option<&[&str]>,
        modifiers: Modifiers,
    ) -> Result<CacheRef<ConstructorInitializer>> {
        require_name("structure", structure)?;
        require_type_list(parameter_types)?;
        require_legal(MemberKind::Constructor, modifiers)?;

        let key = ConstructorKey::new(structure, parameter_types, modifiers);
        self.constructors.get_or_resolve(key, |key| {
            let ty = self.resolve_type(key.structure())?;
            let ctor = resolve::find_constructor(structure_of(&ty), key)?;
            let handle = ConstructorInitializer::new(ty.name(), ctor)?;
            Ok(handle.holding(ty))
        })
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // MAINTENANCE
    // ═══════════════════════════════════════════════════════════════════════════

    /// Purges every cache, returning the number of entries removed.
    pub fn purge(&self) -> usize {
        self.types.purge() + self.fields.purge() + self.methods.purge() + self.constructors.purge()
    }

    /// Forgets every cached entry. Outstanding handles remain usable.
    pub fn clear(&self) {
        self.types.clear();
        self.fields.clear();
        self.methods.clear();
        self.constructors.clear();
    }

    /// Returns statistics for every cache.
    pub fn stats(&self) -> ReflectorStats {
        ReflectorStats {
            types: self.types.stats(),
            fields: self.fields.stats(),
            methods: self.methods.stats(),
            constructors: self.constructors.stats(),
        }
    }
}

impl fmt::Debug for Reflector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reflector")
            .field("context", &self.context)
            .field("types", &self.types)
            .field("fields", &self.fields)
            .field("methods", &self.methods)
            .field("constructors", &self.constructors)
            .finish()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// VALIDATION
// ═══════════════════════════════════════════════════════════════════════════════

fn structure_of(ty: &CacheRef<TypeRef>) -> &dyn Structure {
    &***ty
}

fn require_name(what: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ProbeError::Validation(format!("{what} name cannot be blank")));
    }
    Ok(())
}

fn require_optional_name(what: &str, value: Option<&str>) -> Result<()> {
    match value {
        Some(v) if v.trim().is_empty() => Err(ProbeError::Validation(format!(
            "{what} name cannot be blank when given"
        ))),
        _ => Ok(()),
    }
}

fn require_type_list(types: Option<&[&str]>) -> Result<()> {
    match types {
        Some(list) if list.iter().any(|t| t.trim().is_empty()) => Err(ProbeError::Validation(
            "parameter type names cannot be blank".into(),
        )),
        _ => Ok(()),
    }
}

fn require_legal(kind: MemberKind, modifiers: Modifiers) -> Result<()> {
    let illegal = kind.illegal_modifiers(modifiers);
    if illegal.is_empty() {
        Ok(())
    } else {
        Err(ProbeError::Validation(format!(
            "modifiers {illegal} are not valid for a {}",
            kind.as_str()
        )))
    }
}

fn no_criteria(kind: MemberKind) -> ProbeError {
    ProbeError::Validation(format!(
        "{} lookup needs at least one criterion (name, type, or modifiers)",
        kind.as_str()
    ))
}
