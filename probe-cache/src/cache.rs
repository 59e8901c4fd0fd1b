//! Per-key-locked cache of weakly-held values.

use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::config::CacheConfig;
use crate::entry::{CacheRef, Reclaim, ReclaimQueue, WeakEntry};

/// Exclusivity marker for one key's computation.
type LockToken = Arc<Mutex<()>>;

/// Concurrent cache that holds its values weakly.
///
/// Values are computed on demand by [`WeakCache::get_or_compute`] and handed
/// out as [`CacheRef`]s. The cache keeps only a weak reference plus the key;
/// once every `CacheRef` to a value is dropped, the slot is purged by the next
/// cache access.
///
/// # Thread Safety
///
/// At most one computation runs per key at a time. Computations for different
/// keys never wait on each other. A computation must not request its own key
/// from the same cache.
pub struct WeakCache<K, V> {
    entries: DashMap<K, WeakEntry<K, V>>,
    locks: DashMap<K, LockToken>,
    reclaimed: Arc<ReclaimQueue<K>>,
    generation: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    config: CacheConfig,
}

impl<K, V> WeakCache<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    /// Creates a new cache with default configuration.
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    /// Creates a cache with custom configuration.
    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            entries: DashMap::with_capacity(config.initial_capacity),
            locks: DashMap::new(),
            reclaimed: Arc::new(ReclaimQueue::new()),
            generation: AtomicU64::new(1),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            config,
        }
    }

    /// Returns the live value for `key`, computing and storing it on a miss.
    ///
    /// The per-key lock is held from the lookup through the store, so
    /// concurrent callers for the same key wait for the first computation and
    /// then observe its result. A failed computation stores nothing and its
    /// error is returned unchanged.
    pub fn get_or_compute<E, F>(&self, key: K, compute: F) -> Result<CacheRef<V>, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        self.with_key_lock(&key, || {
            self.purge_reclaimed();

            if let Some(value) = self.lookup(&key) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                trace!(?key, "cache hit");
                return Ok(value);
            }
            self.misses.fetch_add(1, Ordering::Relaxed);
            trace!(?key, "cache miss");

            let value = compute()?;
            let generation = self.generation.fetch_add(1, Ordering::Relaxed);
            let cached = CacheRef::tracked(value, self.reclaim_hook(key.clone(), generation));
            self.entries
                .insert(key.clone(), WeakEntry::new(key.clone(), &cached, generation));

            debug!(?key, generation, "cached computed value");
            Ok(cached)
        })
    }

    /// Returns the live value for `key` without computing.
    pub fn get(&self, key: &K) -> Option<CacheRef<V>> {
        if self.config.purge_on_access {
            self.purge_reclaimed();
        }
        let found = self.entries.get(key).and_then(|entry| entry.upgrade());
        match found {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };
        found
    }

    /// Purges every slot whose value has been dropped.
    ///
    /// Returns the number of slots removed.
    pub fn purge(&self) -> usize {
        self.purge_reclaimed()
    }

    /// Returns the number of slots, including ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache has no slots.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forgets every slot. Outstanding `CacheRef`s remain usable.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Returns cache statistics.
    pub fn stats(&self) -> CacheStats {
        let live = self.entries.iter().filter(|e| e.value().is_live()).count();
        let total = self.entries.len();
        CacheStats {
            total_entries: total,
            live_entries: live,
            pending_reclaims: self.reclaimed.len(),
            pending_locks: self.locks.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }

    /// Runs `f` while holding the lock token for `key`.
    ///
    /// The token is retired (removed by identity) before its lock is
    /// released, on every exit path. A caller that was already waiting on a
    /// retired token notices on wake-up and retries with the current one.
    fn with_key_lock<R>(&self, key: &K, f: impl FnOnce() -> R) -> R {
        let mut f = Some(f);
        loop {
            let token: LockToken = self
                .locks
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value()
                .clone();
            let _held = token.lock();
            if !self.is_current_token(key, &token) {
                continue;
            }
            let _retire = RetireToken {
                locks: &self.locks,
                key,
                token: &token,
            };
            if let Some(f) = f.take() {
                return f();
            }
        }
    }

    fn is_current_token(&self, key: &K, token: &LockToken) -> bool {
        self.locks
            .get(key)
            .map_or(false, |current| Arc::ptr_eq(current.value(), token))
    }

    /// Returns the live value under `key`, removing the slot if it is stale.
    fn lookup(&self, key: &K) -> Option<CacheRef<V>> {
        let stale_generation = {
            let entry = self.entries.get(key)?;
            match entry.upgrade() {
                Some(value) => return Some(value),
                None => entry.generation(),
            }
        };
        if self
            .entries
            .remove_if(key, |_, entry| entry.generation() == stale_generation)
            .is_some()
        {
            self.evictions.fetch_add(1, Ordering::Relaxed);
            trace!(?key, generation = stale_generation, "removed stale slot");
        }
        None
    }

    /// Drains the reclaim queue, removing only the exact slots it names.
    fn purge_reclaimed(&self) -> usize {
        let mut purged = 0;
        for Reclaim { key, generation } in self.reclaimed.drain() {
            if self
                .entries
                .remove_if(&key, |_, entry| entry.generation() == generation)
                .is_some()
            {
                purged += 1;
            }
        }
        if purged > 0 {
            self.evictions.fetch_add(purged as u64, Ordering::Relaxed);
            debug!(purged, "purged reclaimed slots");
        }
        purged
    }

    fn reclaim_hook(&self, key: K, generation: u64) -> Box<dyn FnOnce() + Send + Sync> {
        let queue = Arc::downgrade(&self.reclaimed);
        Box::new(move || {
            if let Some(queue) = queue.upgrade() {
                queue.push(Reclaim { key, generation });
            }
        })
    }
}

impl<K, V> Default for WeakCache<K, V>
where
    K: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for WeakCache<K, V>
where
    K: Eq + Hash,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakCache")
            .field("entries", &self.entries.len())
            .field("pending_locks", &self.locks.len())
            .field("config", &self.config)
            .finish()
    }
}

/// Removes a lock token from the table if it is still the registered one.
struct RetireToken<'a, K: Eq + Hash> {
    locks: &'a DashMap<K, LockToken>,
    key: &'a K,
    token: &'a LockToken,
}

impl<K: Eq + Hash> Drop for RetireToken<'_, K> {
    fn drop(&mut self) {
        self.locks
            .remove_if(self.key, |_, current| Arc::ptr_eq(current, self.token));
    }
}

/// Cache statistics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Total slots (including ones whose value is gone)
    pub total_entries: usize,
    /// Slots whose value is still held somewhere
    pub live_entries: usize,
    /// Reclaim notices not yet drained
    pub pending_reclaims: usize,
    /// Lock tokens currently registered
    pub pending_locks: usize,
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that found nothing live
    pub misses: u64,
    /// Slots removed after their value was dropped
    pub evictions: u64,
}
