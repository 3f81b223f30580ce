//! In-process memo cache keyed by exact input.
//!
//! Entries live for the lifetime of the cache unless a TTL is configured;
//! there is no size bound, so growth is proportional to the number of
//! distinct keys requested. Only successful results are stored. Population
//! is not single-flight: two concurrent misses on the same key both run the
//! loader and the last insert wins.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug, trace};

#[derive(Debug)]
struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

/// Memoizing map, `Send + Sync` when `K` and `V` are `Send`.
#[derive(Debug)]
pub struct MemoCache<K, V> {
    name: &'static str,
    ttl: Option<Duration>,
    entries: Mutex<HashMap<K, Entry<V>>>,
}

impl<K, V> MemoCache<K, V>
where
    K: Eq + Hash + Clone + Debug,
    V: Clone,
{
    /// Eviction-free cache. `name` tags log events.
    pub fn new(name: &'static str) -> Self {
        Self::with_ttl(name, None)
    }

    /// Cache whose entries expire `ttl` after insertion.
    pub fn with_ttl(name: &'static str, ttl: Option<Duration>) -> Self {
        Self {
            name,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, Entry<V>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_fresh(&self, entry: &Entry<V>) -> bool {
        self.ttl
            .map_or(true, |ttl| entry.inserted_at.elapsed() <= ttl)
    }

    /// Cached value for `key`, dropping it first if it has expired.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if self.is_fresh(entry) => {
                trace!(cache = self.name, ?key, "hit");
                Some(entry.value.clone())
            }
            Some(_) => {
                debug!(cache = self.name, ?key, "expired");
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: K, value: V) {
        self.lock().insert(
            key,
            Entry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Return the cached value, or run `load` and cache its `Ok` result.
    ///
    /// The lock is not held while `load` runs.
    pub fn get_or_try_insert_with<E>(
        &self,
        key: &K,
        load: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some(v) = self.get(key) {
            return Ok(v);
        }
        debug!(cache = self.name, ?key, "miss");
        let value = load()?;
        self.insert(key.clone(), value.clone());
        Ok(value)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.lock().remove(key).map(|e| e.value)
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let mut entries = self.lock();
        debug!(cache = self.name, entries = entries.len(), "cleared");
        entries.clear();
    }

    /// Number of stored entries, including any not yet observed as expired.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn loads_once_per_key() {
        let cache: MemoCache<String, u32> = MemoCache::new("test");
        let calls = Cell::new(0);
        let load = || {
            calls.set(calls.get() + 1);
            Ok::<_, ()>(7)
        };
        assert_eq!(cache.get_or_try_insert_with(&"a".to_string(), load), Ok(7));
        assert_eq!(cache.get_or_try_insert_with(&"a".to_string(), load), Ok(7));
        assert_eq!(calls.get(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn errors_are_not_cached() {
        let cache: MemoCache<u8, u8> = MemoCache::new("test");
        assert_eq!(cache.get_or_try_insert_with(&1, || Err("down")), Err("down"));
        assert!(cache.is_empty());
        assert_eq!(cache.get_or_try_insert_with(&1, || Ok::<_, &str>(3)), Ok(3));
    }

    #[test]
    fn distinct_keys_are_distinct_entries() {
        let cache: MemoCache<(String, u8), u8> = MemoCache::new("test");
        cache.insert(("AAPL".into(), 1), 10);
        cache.insert(("AAPL".into(), 2), 20);
        assert_eq!(cache.get(&("AAPL".into(), 1)), Some(10));
        assert_eq!(cache.get(&("AAPL".into(), 2)), Some(20));
    }

    #[test]
    fn clear_empties() {
        let cache: MemoCache<u8, u8> = MemoCache::new("test");
        cache.insert(1, 1);
        cache.insert(2, 2);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get(&1), None);
    }

    #[test]
    fn ttl_expires_entries() {
        let cache: MemoCache<u8, u8> = MemoCache::with_ttl("test", Some(Duration::from_millis(10)));
        cache.insert(1, 1);
        assert!(cache.contains(&1));
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(cache.get(&1), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn remove_returns_value() {
        let cache: MemoCache<u8, &str> = MemoCache::new("test");
        cache.insert(1, "x");
        assert_eq!(cache.remove(&1), Some("x"));
        assert_eq!(cache.remove(&1), None);
    }
}
