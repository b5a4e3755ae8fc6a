//! In-memory model cache.

use std::collections::HashMap;
use std::hash::Hash;

/// Key-value mirror of stored entities, keyed by entity identity.
///
/// Not synchronized; the caching saver serializes access to it.
pub trait CacheAdapter<T> {
    /// Insert or replace the cached copy of `model`.
    fn store_model_in_cache(&mut self, model: &T);

    /// Drop the cached copy of `model`, if any.
    fn remove_model_from_cache(&mut self, model: &T);
}

/// A [`CacheAdapter`] backed by a `HashMap`, keyed by a caching-id function.
pub struct MapCache<K, T> {
    entries: HashMap<K, T>,
    caching_id: fn(&T) -> K,
}

impl<K: Eq + Hash, T: Clone> MapCache<K, T> {
    /// Create an empty cache that keys entities with `caching_id`.
    pub fn new(caching_id: fn(&T) -> K) -> Self {
        Self {
            entries: HashMap::new(),
            caching_id,
        }
    }

    pub fn get(&self, key: &K) -> Option<&T> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterate over cached entities in arbitrary order.
    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.values()
    }
}

impl<K: Eq + Hash, T: Clone> CacheAdapter<T> for MapCache<K, T> {
    fn store_model_in_cache(&mut self, model: &T) {
        self.entries.insert((self.caching_id)(model), model.clone());
    }

    fn remove_model_from_cache(&mut self, model: &T) {
        self.entries.remove(&(self.caching_id)(model));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Item {
        id: i64,
        name: &'static str,
    }

    fn item_id(item: &Item) -> i64 {
        item.id
    }

    #[test]
    fn test_store_replaces_same_identity() {
        let mut cache = MapCache::new(item_id);
        cache.store_model_in_cache(&Item { id: 1, name: "a" });
        cache.store_model_in_cache(&Item { id: 1, name: "b" });

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&1).unwrap().name, "b");
    }

    #[test]
    fn test_remove_only_matching_identity() {
        let mut cache = MapCache::new(item_id);
        cache.store_model_in_cache(&Item { id: 1, name: "a" });
        cache.store_model_in_cache(&Item { id: 2, name: "b" });

        cache.remove_model_from_cache(&Item { id: 2, name: "ignored" });

        assert!(cache.contains(&1));
        assert!(!cache.contains(&2));
    }

    #[test]
    fn test_remove_missing_is_noop() {
        let mut cache: MapCache<i64, Item> = MapCache::new(item_id);
        cache.remove_model_from_cache(&Item { id: 9, name: "x" });
        assert!(cache.is_empty());
    }
}
