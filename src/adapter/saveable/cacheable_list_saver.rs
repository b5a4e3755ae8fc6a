//! Batch saver that keeps a model cache in step with the store.

use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;

use super::list_saver::{ListModelSaver, ListSaver};
use crate::adapter::{CacheAdapter, ModelAdapter};
use crate::storage::{DatabaseWrapper, StoreError};

/// Wraps a [`ListModelSaver`] and mirrors each successful write into a cache.
///
/// Save, insert and update store the entity; delete removes it. The cache is
/// touched right after the entity's own write, before the next entity runs,
/// and only when that write met its success condition. The returned count is
/// always the number of cache mutations. If a batch fails partway, the
/// mutations already made stay in the cache, matching the rows already
/// written.
///
/// The cache lock is held for the entire batch call, then the inner saver's
/// lock. Cache reads through [`cache`](Self::cache) wait for running batches.
pub struct CacheableListModelSaver<T, A, C> {
    list_saver: Arc<ListModelSaver<T, A>>,
    cache: Mutex<C>,
}

impl<T, A, C> CacheableListModelSaver<T, A, C>
where
    A: ModelAdapter<T>,
    C: CacheAdapter<T>,
{
    pub fn new(list_saver: Arc<ListModelSaver<T, A>>, cache: C) -> Self {
        Self {
            list_saver,
            cache: Mutex::new(cache),
        }
    }

    /// The wrapped, non-caching saver.
    pub fn list_saver(&self) -> &Arc<ListModelSaver<T, A>> {
        &self.list_saver
    }

    /// Lock and borrow the cache.
    pub fn cache(&self) -> MutexGuard<'_, C> {
        self.cache.lock()
    }
}

impl<T, A, C> ListSaver<T> for CacheableListModelSaver<T, A, C>
where
    A: ModelAdapter<T>,
    C: CacheAdapter<T>,
{
    fn save_all(&self, models: &mut [T], wrapper: &DatabaseWrapper<'_>) -> Result<u64, StoreError> {
        let mut cache = self.cache.lock();
        self.list_saver
            .save_all_with(models, wrapper, |model| cache.store_model_in_cache(model))
    }

    fn insert_all(
        &self,
        models: &mut [T],
        wrapper: &DatabaseWrapper<'_>,
    ) -> Result<u64, StoreError> {
        let mut cache = self.cache.lock();
        self.list_saver
            .insert_all_with(models, wrapper, |model| cache.store_model_in_cache(model))
    }

    fn update_all(
        &self,
        models: &mut [T],
        wrapper: &DatabaseWrapper<'_>,
    ) -> Result<u64, StoreError> {
        let mut cache = self.cache.lock();
        self.list_saver
            .update_all_with(models, wrapper, |model| cache.store_model_in_cache(model))
    }

    fn delete_all(
        &self,
        models: &mut [T],
        wrapper: &DatabaseWrapper<'_>,
    ) -> Result<u64, StoreError> {
        let mut cache = self.cache.lock();
        self.list_saver
            .delete_all_with(models, wrapper, |model| cache.remove_model_from_cache(model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::saveable::test_support::{note_conn, note_id, Note, NoteAdapter};
    use crate::adapter::MapCache;

    type NoteSaver = CacheableListModelSaver<Note, NoteAdapter, MapCache<i64, Note>>;

    fn saver(adapter: NoteAdapter) -> NoteSaver {
        CacheableListModelSaver::new(ListModelSaver::shared(adapter), MapCache::new(note_id))
    }

    #[test]
    fn test_update_stores_new_state() {
        let conn = note_conn();
        let wrapper = DatabaseWrapper::new(&conn);
        let saver = saver(NoteAdapter::new());
        let mut notes = vec![Note::new("before")];
        saver.insert_all(&mut notes, &wrapper).unwrap();

        notes[0].title = "after".into();
        assert_eq!(saver.update_all(&mut notes, &wrapper).unwrap(), 1);

        let cache = saver.cache();
        assert_eq!(cache.get(&notes[0].id).unwrap().title, "after");
    }

    #[test]
    fn test_update_of_missing_row_leaves_cache_alone() {
        let conn = note_conn();
        let wrapper = DatabaseWrapper::new(&conn);
        let saver = saver(NoteAdapter::new());
        let mut notes = vec![Note::with_id(5, "nowhere")];

        assert_eq!(saver.update_all(&mut notes, &wrapper).unwrap(), 0);
        assert!(saver.cache().is_empty());
    }

    #[test]
    fn test_insert_with_zero_id_is_not_cached() {
        let conn = note_conn();
        let wrapper = DatabaseWrapper::new(&conn);
        let saver = saver(NoteAdapter::ignoring_conflicts());
        let mut first = vec![Note::with_id(3, "original")];
        assert_eq!(saver.insert_all(&mut first, &wrapper).unwrap(), 1);
        saver.cache().clear();

        let mut dup = vec![Note::with_id(3, "duplicate")];
        assert_eq!(saver.insert_all(&mut dup, &wrapper).unwrap(), 0);
        assert!(saver.cache().is_empty());
    }

    #[test]
    fn test_count_matches_cache_mutations() {
        let conn = note_conn();
        let wrapper = DatabaseWrapper::new(&conn);
        let saver = saver(NoteAdapter::new());
        let mut notes = vec![Note::new("a"), Note::new("b"), Note::new("c")];

        let count = saver.save_all(&mut notes, &wrapper).unwrap();
        assert_eq!(count as usize, saver.cache().len());
    }

    #[test]
    fn test_inner_saver_is_usable_without_cache() {
        let conn = note_conn();
        let wrapper = DatabaseWrapper::new(&conn);
        let saver = saver(NoteAdapter::new());
        let mut notes = vec![Note::new("uncached")];

        assert_eq!(saver.list_saver().insert_all(&mut notes, &wrapper).unwrap(), 1);
        assert!(saver.cache().is_empty());
    }
}
