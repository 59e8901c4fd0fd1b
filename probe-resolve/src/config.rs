//! Reflector configuration.

use serde::{Deserialize, Serialize};

use probe_cache::CacheConfig;

/// Default for [`ReflectorConfig::initialize_types`].
pub const DEFAULT_INITIALIZE_TYPES: bool = true;

/// Configuration of a [`crate::Reflector`]: one cache configuration per kind
/// plus the default initialization policy for type loads.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReflectorConfig {
    /// Loaded structures
    pub types: CacheConfig,
    /// Field accessors
    pub fields: CacheConfig,
    /// Method invokers
    pub methods: CacheConfig,
    /// Constructor initializers
    pub constructors: CacheConfig,
    /// Whether type loads run class initializers by default
    pub initialize_types: bool,
}

impl Default for ReflectorConfig {
    fn default() -> Self {
        Self {
            types: CacheConfig::default(),
            fields: CacheConfig::default(),
            methods: CacheConfig::default(),
            constructors: CacheConfig::default(),
            initialize_types: DEFAULT_INITIALIZE_TYPES,
        }
    }
}

impl ReflectorConfig {
    /// Builds a configuration from the environment.
    ///
    /// - `PROBE_CACHE_CAPACITY`: initial capacity of every cache
    /// - `PROBE_INITIALIZE_TYPES`: `false` or `0` disables initializing loads
    ///
    /// Unset or unparsable variables keep their defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(capacity) = std::env::var("PROBE_CACHE_CAPACITY")
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
        {
            config = config.with_capacity(capacity);
        }
        config.initialize_types = std::env::var("PROBE_INITIALIZE_TYPES")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(DEFAULT_INITIALIZE_TYPES);
        config
    }

    /// Sets the initial capacity of every cache.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.types = self.types.with_capacity(capacity);
        self.fields = self.fields.with_capacity(capacity);
        self.methods = self.methods.with_capacity(capacity);
        self.constructors = self.constructors.with_capacity(capacity);
        self
    }

    /// Loads types without running their initializers by default.
    pub fn lazy_types(mut self) -> Self {
        self.initialize_types = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ReflectorConfig::default();
        assert!(config.initialize_types);
        assert_eq!(config.fields, CacheConfig::default());
    }

    #[test]
    fn test_partial_json() {
        let config: ReflectorConfig = serde_json::from_str(
            r#"{"initialize_types": false, "methods": {"initial_capacity": 8}}"#,
        )
        .unwrap();
        assert!(!config.initialize_types);
        assert_eq!(config.methods.initial_capacity, 8);
        assert!(config.methods.purge_on_access);
        assert_eq!(config.types, CacheConfig::default());
    }

    #[test]
    fn test_builders() {
        let config = ReflectorConfig::default().with_capacity(4).lazy_types();
        assert_eq!(config.constructors.initial_capacity, 4);
        assert!(!config.initialize_types);
    }
}
