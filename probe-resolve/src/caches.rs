//! One weak cache per resolution kind.

use std::fmt;
use std::hash::Hash;

use tracing::trace;

use probe_cache::{CacheConfig, CacheRef, CacheStats, WeakCache};
use probe_core::{ConstructorKey, FieldKey, MethodKey, Result, TypeKey, TypeRef};

use crate::handle::{ConstructorInitializer, FieldAccessor, MethodInvoker};

/// Cache of loaded structures.
pub type TypeCache = ResolutionCache<TypeKey, TypeRef>;

/// Cache of resolved field accessors.
pub type FieldCache = ResolutionCache<FieldKey, FieldAccessor>;

/// Cache of resolved method invokers.
pub type MethodCache = ResolutionCache<MethodKey, MethodInvoker>;

/// Cache of resolved constructor initializers.
pub type ConstructorCache = ResolutionCache<ConstructorKey, ConstructorInitializer>;

/// A [`WeakCache`] whose computations fail with [`probe_core::ProbeError`].
pub struct ResolutionCache<K, V> {
    label: &'static str,
    inner: WeakCache<K, V>,
}

impl<K, V> ResolutionCache<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    /// Creates an empty cache. `label` names it in logs.
    pub fn new(label: &'static str, config: CacheConfig) -> Self {
        Self {
            label,
            inner: WeakCache::with_config(config),
        }
    }

    /// Returns the cached value for `key`, resolving it on a miss.
    ///
    /// Failed resolutions are not cached.
    pub fn get_or_resolve<F>(&self, key: K, resolve: F) -> Result<CacheRef<V>>
    where
        F: FnOnce(&K) -> Result<V>,
    {
        let lookup = key.clone();
        let resolved = self.inner.get_or_compute(key, move || resolve(&lookup));
        if let Err(err) = &resolved {
            trace!(cache = self.label, error = %err, "Resolution failed");
        }
        resolved
    }

    /// Returns the cached value for `key` without resolving.
    pub fn get(&self, key: &K) -> Option<CacheRef<V>> {
        self.inner.get(key)
    }

    /// Purges entries whose values have been dropped.
    pub fn purge(&self) -> usize {
        self.inner.purge()
    }

    /// Number of entries, including ones not yet purged.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns true if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Forgets every entry.
    pub fn clear(&self) {
        self.inner.clear();
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.inner.stats()
    }

    /// Name used in logs.
    pub fn label(&self) -> &'static str {
        self.label
    }
}

impl<K, V> fmt::Debug for ResolutionCache<K, V>
where
    K: Eq + Hash,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolutionCache")
            .field("label", &self.label)
            .field("inner", &self.inner)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use probe_core::{Modifiers, ProbeError};

    use super::*;

    fn key(name: &str) -> FieldKey {
        FieldKey::new("app.Widget", Some(name), None, Modifiers::empty())
    }

    #[test]
    fn test_resolution_error_is_not_cached() {
        let cache: ResolutionCache<FieldKey, String> =
            ResolutionCache::new("fields", CacheConfig::default());
        let calls = AtomicUsize::new(0);

        let err = cache
            .get_or_resolve(key("count"), |k| {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ProbeError::Validation(format!("no {k}")))
            })
            .unwrap_err();
        assert!(err.is_validation_error());
        assert!(cache.is_empty());

        let value = cache
            .get_or_resolve(key("count"), |k| {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(k.name().unwrap_or_default().to_owned())
            })
            .unwrap();
        assert_eq!(*value, "count");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(cache.get(&key("count")).is_some());
    }

    #[test]
    fn test_dropped_value_is_purged() {
        let cache: ResolutionCache<FieldKey, String> =
            ResolutionCache::new("fields", CacheConfig::default());
        let value = cache
            .get_or_resolve(key("count"), |_| Ok("count".to_owned()))
            .unwrap();
        assert_eq!(cache.len(), 1);
        drop(value);
        assert_eq!(cache.purge(), 1);
        assert!(cache.is_empty());
        assert_eq!(cache.label(), "fields");
    }
}
