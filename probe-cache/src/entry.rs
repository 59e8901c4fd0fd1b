//! Weak entries, shared values, and the reclaim queue that links them.

use std::collections::VecDeque;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

type ReclaimHook = Box<dyn FnOnce() + Send + Sync>;

/// Heap cell shared by every [`CacheRef`] to one value.
struct Referent<V> {
    value: V,
    on_reclaim: Option<ReclaimHook>,
}

impl<V> Drop for Referent<V> {
    fn drop(&mut self) {
        if let Some(hook) = self.on_reclaim.take() {
            hook();
        }
    }
}

/// Shared handle to a cached value.
///
/// Cloning is cheap. The cache itself holds only a weak reference, so once
/// every `CacheRef` to a value is dropped the cache forgets it.
pub struct CacheRef<V> {
    inner: Arc<Referent<V>>,
}

impl<V> CacheRef<V> {
    /// Wraps a value that is not tracked by any cache.
    pub fn detached(value: V) -> Self {
        Self {
            inner: Arc::new(Referent {
                value,
                on_reclaim: None,
            }),
        }
    }

    pub(crate) fn tracked(value: V, on_reclaim: ReclaimHook) -> Self {
        Self {
            inner: Arc::new(Referent {
                value,
                on_reclaim: Some(on_reclaim),
            }),
        }
    }

    /// Returns true if both refer to the same cached value.
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        Arc::ptr_eq(&this.inner, &other.inner)
    }

    /// Number of live `CacheRef`s to this value.
    pub fn ref_count(this: &Self) -> usize {
        Arc::strong_count(&this.inner)
    }

    fn downgrade(this: &Self) -> Weak<Referent<V>> {
        Arc::downgrade(&this.inner)
    }
}

impl<V> Clone for CacheRef<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> Deref for CacheRef<V> {
    type Target = V;

    fn deref(&self) -> &V {
        &self.inner.value
    }
}

impl<V: fmt::Debug> fmt::Debug for CacheRef<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CacheRef").field(&self.inner.value).finish()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// WEAK ENTRY
// ═══════════════════════════════════════════════════════════════════════════════

/// A map slot: strong key, weak value, and the generation that stored it.
///
/// Equality and hash use only the key, so a slot stays identifiable after
/// its value is gone.
pub(crate) struct WeakEntry<K, V> {
    key: K,
    value: Weak<Referent<V>>,
    generation: u64,
}

impl<K, V> WeakEntry<K, V> {
    pub(crate) fn new(key: K, value: &CacheRef<V>, generation: u64) -> Self {
        Self {
            key,
            value: CacheRef::downgrade(value),
            generation,
        }
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns the value if some `CacheRef` still holds it.
    pub(crate) fn upgrade(&self) -> Option<CacheRef<V>> {
        self.value.upgrade().map(|inner| CacheRef { inner })
    }

    pub(crate) fn is_live(&self) -> bool {
        self.value.strong_count() > 0
    }
}

impl<K: PartialEq, V> PartialEq for WeakEntry<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<K: Eq, V> Eq for WeakEntry<K, V> {}

impl<K: Hash, V> Hash for WeakEntry<K, V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RECLAIM QUEUE
// ═══════════════════════════════════════════════════════════════════════════════

/// Notice that the value stored under `key` at `generation` was dropped.
pub(crate) struct Reclaim<K> {
    pub(crate) key: K,
    pub(crate) generation: u64,
}

/// Notices pushed by dropped values, drained by the next cache access.
pub(crate) struct ReclaimQueue<K> {
    notices: Mutex<VecDeque<Reclaim<K>>>,
}

impl<K> ReclaimQueue<K> {
    pub(crate) fn new() -> Self {
        Self {
            notices: Mutex::new(VecDeque::new()),
        }
    }

    pub(crate) fn push(&self, notice: Reclaim<K>) {
        self.notices.lock().push_back(notice);
    }

    /// Takes every pending notice, leaving the queue empty.
    pub(crate) fn drain(&self) -> Vec<Reclaim<K>> {
        self.notices.lock().drain(..).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.notices.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::hash_map::DefaultHasher;

    use super::*;

    fn hash_of<T: Hash>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_reclaim_hook_runs_on_last_drop() {
        let queue = Arc::new(ReclaimQueue::new());
        let notify = Arc::clone(&queue);
        let value = CacheRef::tracked(
            7u32,
            Box::new(move || {
                notify.push(Reclaim {
                    key: "seven",
                    generation: 3,
                })
            }),
        );
        let copy = value.clone();
        drop(value);
        assert_eq!(queue.len(), 0);
        drop(copy);
        let notices = queue.drain();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].key, "seven");
        assert_eq!(notices[0].generation, 3);
    }

    #[test]
    fn test_entry_identity_survives_value() {
        let value = CacheRef::detached(String::from("handle"));
        let live = WeakEntry::new("k", &value, 1);
        assert!(live.is_live());
        assert_eq!(live.upgrade().as_deref().map(String::as_str), Some("handle"));

        drop(value);
        assert!(!live.is_live());
        assert!(live.upgrade().is_none());

        let other = WeakEntry::new("k", &CacheRef::detached(String::new()), 2);
        assert!(live == other);
        assert_eq!(hash_of(&live), hash_of(&other));
        assert_eq!(live.key, "k");
    }

    #[test]
    fn test_ptr_eq() {
        let a = CacheRef::detached(1);
        let b = a.clone();
        let c = CacheRef::detached(1);
        assert!(CacheRef::ptr_eq(&a, &b));
        assert!(!CacheRef::ptr_eq(&a, &c));
        assert_eq!(CacheRef::ref_count(&a), 2);
    }
}
