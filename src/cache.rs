//! Read-through entity cache.
//!
//! One cache per cached entity type (patients, doctors, inventory).
//!
//! Key properties:
//! - Lives only as long as the process; no TTL, no size bound
//! - A store write and the matching cache update happen under one lock,
//!   so foreground writers and background readers never interleave
//! - A failed store call never touches the cache
//! - Readers outside the lock only ever see a cloned snapshot

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Entity that can be stored in an `EntityCache`.
pub trait Cached: Clone {
    /// Store-assigned row id.
    fn cache_key(&self) -> i64;
}

// ═══════════════════════════════════════════════════════════
// EntityCache
// ═══════════════════════════════════════════════════════════

pub struct EntityCache<T> {
    name: &'static str,
    entries: Mutex<HashMap<i64, T>>,
}

impl<T: Cached> EntityCache<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Entries are plain values; a panic mid-update cannot leave one half-written.
    fn lock(&self) -> MutexGuard<'_, HashMap<i64, T>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Read path ────────────────────────────────────────

    /// Return the cached value, or load it from the store and remember it.
    ///
    /// `Ok(None)` means the store has no such row; nothing is cached then.
    pub fn get_or_load<E, F>(&self, id: i64, load: F) -> Result<Option<T>, E>
    where
        F: FnOnce() -> Result<Option<T>, E>,
    {
        let mut entries = self.lock();
        if let Some(hit) = entries.get(&id) {
            tracing::trace!(cache = self.name, id, "cache hit");
            return Ok(Some(hit.clone()));
        }

        let loaded = load()?;
        if let Some(entity) = &loaded {
            entries.insert(id, entity.clone());
        }
        Ok(loaded)
    }

    /// Load the full set from the store and replace the cache contents with it.
    ///
    /// Entries for rows that no longer exist are dropped as a side effect.
    pub fn refresh_all<E, F>(&self, load: F) -> Result<Vec<T>, E>
    where
        F: FnOnce() -> Result<Vec<T>, E>,
    {
        let mut entries = self.lock();
        let all = load()?;
        *entries = all.iter().map(|e| (e.cache_key(), e.clone())).collect();
        tracing::debug!(cache = self.name, count = all.len(), "cache refreshed");
        Ok(all)
    }

    // ── Write path ───────────────────────────────────────

    /// Run a store write; on success cache the value it returns.
    pub fn write_then_put<E, F>(&self, write: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let mut entries = self.lock();
        let stored = write()?;
        entries.insert(stored.cache_key(), stored.clone());
        Ok(stored)
    }

    /// Run a store write; on success drop `id` from the cache.
    pub fn write_then_invalidate<R, E, F>(&self, id: i64, write: F) -> Result<R, E>
    where
        F: FnOnce() -> Result<R, E>,
    {
        let mut entries = self.lock();
        let result = write()?;
        entries.remove(&id);
        Ok(result)
    }

    // ── Snapshots ────────────────────────────────────────

    /// Point-in-time copy of every cached value.
    pub fn snapshot(&self) -> Vec<T> {
        self.lock().values().cloned().collect()
    }

    /// Cached values matching `predicate`. Never touches the store.
    pub fn search<P>(&self, predicate: P) -> Vec<T>
    where
        P: Fn(&T) -> bool,
    {
        self.lock()
            .values()
            .filter(|e| predicate(e))
            .cloned()
            .collect()
    }

    pub fn contains(&self, id: i64) -> bool {
        self.lock().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: i64,
        label: String,
    }

    impl Cached for Item {
        fn cache_key(&self) -> i64 {
            self.id
        }
    }

    fn item(id: i64, label: &str) -> Item {
        Item {
            id,
            label: label.into(),
        }
    }

    #[test]
    fn miss_loads_once_then_hits() {
        let cache = EntityCache::new("items");
        let loads = Cell::new(0);

        for _ in 0..3 {
            let got = cache
                .get_or_load::<(), _>(7, || {
                    loads.set(loads.get() + 1);
                    Ok(Some(item(7, "gauze")))
                })
                .unwrap();
            assert_eq!(got, Some(item(7, "gauze")));
        }
        assert_eq!(loads.get(), 1, "Only the first read should reach the store");
    }

    #[test]
    fn not_found_is_not_cached() {
        let cache: EntityCache<Item> = EntityCache::new("items");
        let loads = Cell::new(0);
        for _ in 0..2 {
            let got = cache
                .get_or_load::<(), _>(1, || {
                    loads.set(loads.get() + 1);
                    Ok(None)
                })
                .unwrap();
            assert!(got.is_none());
        }
        assert_eq!(loads.get(), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn load_failure_propagates_and_leaves_cache_untouched() {
        let cache = EntityCache::new("items");
        cache.write_then_put::<(), _>(|| Ok(item(1, "a"))).unwrap();

        let result = cache.get_or_load(2, || Err("store down"));
        assert_eq!(result, Err("store down"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn refresh_all_replaces_contents() {
        let cache = EntityCache::new("items");
        cache.write_then_put::<(), _>(|| Ok(item(1, "stale"))).unwrap();
        cache.write_then_put::<(), _>(|| Ok(item(2, "deleted elsewhere"))).unwrap();

        let all = cache
            .refresh_all::<(), _>(|| Ok(vec![item(1, "fresh"), item(3, "new")]))
            .unwrap();

        assert_eq!(all.len(), 2);
        assert!(!cache.contains(2), "Stale entry must be dropped");
        let hit = cache
            .get_or_load::<(), _>(1, || panic!("should be cached"))
            .unwrap();
        assert_eq!(hit.unwrap().label, "fresh");
    }

    #[test]
    fn refresh_failure_keeps_previous_contents() {
        let cache = EntityCache::new("items");
        cache.write_then_put::<(), _>(|| Ok(item(1, "kept"))).unwrap();
        let result = cache.refresh_all(|| Err("timeout"));
        assert!(result.is_err());
        assert!(cache.contains(1));
    }

    #[test]
    fn failed_write_does_not_populate() {
        let cache: EntityCache<Item> = EntityCache::new("items");
        let result = cache.write_then_put(|| Err("constraint"));
        assert!(result.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn invalidate_only_after_successful_write() {
        let cache = EntityCache::new("items");
        cache.write_then_put::<(), _>(|| Ok(item(5, "x"))).unwrap();

        let failed: Result<(), &str> = cache.write_then_invalidate(5, || Err("rollback"));
        assert!(failed.is_err());
        assert!(cache.contains(5));

        cache.write_then_invalidate::<_, (), _>(5, || Ok(())).unwrap();
        assert!(!cache.contains(5));
    }

    #[test]
    fn search_filters_cached_values() {
        let cache = EntityCache::new("items");
        cache.write_then_put::<(), _>(|| Ok(item(1, "saline"))).unwrap();
        cache.write_then_put::<(), _>(|| Ok(item(2, "syringe"))).unwrap();
        cache.write_then_put::<(), _>(|| Ok(item(3, "gauze"))).unwrap();

        let mut hits = cache.search(|i| i.label.starts_with('s'));
        hits.sort_by_key(|i| i.id);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, 1);
    }

    #[test]
    fn snapshot_is_consistent_under_concurrent_writers() {
        let cache = Arc::new(EntityCache::new("items"));
        let mut handles = vec![];

        for t in 0..4i64 {
            let cache = Arc::clone(&cache);
            handles.push(thread::spawn(move || {
                for i in 0..50i64 {
                    let id = t * 100 + i;
                    cache.write_then_put::<(), _>(|| Ok(item(id, "w"))).unwrap();
                    if i % 2 == 0 {
                        cache.write_then_invalidate::<_, (), _>(id, || Ok(())).unwrap();
                    }
                }
            }));
        }

        let reader = {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for _ in 0..50 {
                    let snap = cache.snapshot();
                    assert!(snap.len() <= 200);
                }
            })
        };

        for handle in handles {
            handle.join().unwrap();
        }
        reader.join().unwrap();
        assert_eq!(cache.len(), 100);
    }
}
