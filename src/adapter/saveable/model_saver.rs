//! Single-entity persistence.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::adapter::ModelAdapter;
use crate::storage::{DatabaseStatement, DatabaseWrapper, StoreError};

/// Executes one entity's save/insert/update/delete against compiled statements.
///
/// The statement-taking methods let a caller compile once and reuse the
/// statements for many entities. The `*_one` methods compile their own
/// statements and release them before returning.
pub struct ModelSaver<T, A> {
    adapter: Arc<A>,
    _model: PhantomData<fn(&mut T)>,
}

impl<T, A: ModelAdapter<T>> ModelSaver<T, A> {
    pub fn new(adapter: A) -> Self {
        Self::from_arc(Arc::new(adapter))
    }

    pub fn from_arc(adapter: Arc<A>) -> Self {
        Self {
            adapter,
            _model: PhantomData,
        }
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    /// Update the row if it exists and the update touches it, else insert.
    ///
    /// Returns true if either the update affected a row or the insert
    /// produced a row id > 0.
    pub fn save(
        &self,
        model: &mut T,
        insert: &mut DatabaseStatement<'_>,
        update: &mut DatabaseStatement<'_>,
        wrapper: &DatabaseWrapper<'_>,
    ) -> Result<bool, StoreError> {
        if self.adapter.exists(model, wrapper)? && self.update(model, update)? {
            return Ok(true);
        }
        Ok(self.insert(model, insert)? > 0)
    }

    /// Insert the entity, returning the generated row id (0 if none).
    ///
    /// A positive id is written back through the adapter.
    pub fn insert(
        &self,
        model: &mut T,
        insert: &mut DatabaseStatement<'_>,
    ) -> Result<i64, StoreError> {
        self.adapter.bind_to_insert_statement(insert, model)?;
        let id = insert.execute_insert()?;
        if id > 0 {
            self.adapter.update_auto_increment(model, id);
        }
        Ok(id)
    }

    /// Update the entity's row; true if at least one row was affected.
    pub fn update(
        &self,
        model: &T,
        update: &mut DatabaseStatement<'_>,
    ) -> Result<bool, StoreError> {
        self.adapter.bind_to_update_statement(update, model)?;
        Ok(update.execute_update_delete()? > 0)
    }

    /// Delete the entity's row; true if at least one row was affected.
    ///
    /// The entity keeps its id so it can still be identified (for example
    /// removed from a cache); call [`reset_id`](Self::reset_id) afterwards.
    pub fn delete(
        &self,
        model: &T,
        delete: &mut DatabaseStatement<'_>,
    ) -> Result<bool, StoreError> {
        self.adapter.bind_to_delete_statement(delete, model)?;
        Ok(delete.execute_update_delete()? > 0)
    }

    /// Mark a deleted entity as not stored by zeroing its auto-increment id.
    pub fn reset_id(&self, model: &mut T) {
        self.adapter.update_auto_increment(model, 0);
    }

    pub fn save_one(&self, model: &mut T, wrapper: &DatabaseWrapper<'_>) -> Result<bool, StoreError> {
        let mut insert = self.adapter.get_insert_statement(wrapper)?;
        let mut update = self.adapter.get_update_statement(wrapper)?;
        self.save(model, &mut insert, &mut update, wrapper)
    }

    pub fn insert_one(&self, model: &mut T, wrapper: &DatabaseWrapper<'_>) -> Result<i64, StoreError> {
        let mut insert = self.adapter.get_insert_statement(wrapper)?;
        self.insert(model, &mut insert)
    }

    pub fn update_one(&self, model: &T, wrapper: &DatabaseWrapper<'_>) -> Result<bool, StoreError> {
        let mut update = self.adapter.get_update_statement(wrapper)?;
        self.update(model, &mut update)
    }

    /// Delete the entity and, on success, reset its id.
    pub fn delete_one(&self, model: &mut T, wrapper: &DatabaseWrapper<'_>) -> Result<bool, StoreError> {
        let mut delete = self.adapter.get_delete_statement(wrapper)?;
        let deleted = self.delete(model, &mut delete)?;
        if deleted {
            self.reset_id(model);
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::saveable::test_support::{note_conn, Note, NoteAdapter};

    #[test]
    fn test_insert_writes_back_id() {
        let conn = note_conn();
        let wrapper = DatabaseWrapper::new(&conn);
        let saver: ModelSaver<Note, _> = ModelSaver::new(NoteAdapter::new());

        let mut note = Note::new("first");
        assert_eq!(saver.insert_one(&mut note, &wrapper).unwrap(), 1);
        assert_eq!(note.id, 1);
    }

    #[test]
    fn test_save_inserts_then_updates() {
        let conn = note_conn();
        let wrapper = DatabaseWrapper::new(&conn);
        let saver: ModelSaver<Note, _> = ModelSaver::new(NoteAdapter::new());

        let mut note = Note::new("draft");
        assert!(saver.save_one(&mut note, &wrapper).unwrap());
        let id = note.id;

        note.title = "final".into();
        assert!(saver.save_one(&mut note, &wrapper).unwrap());
        assert_eq!(note.id, id);

        let (count, title): (i64, String) = conn
            .query_row("SELECT COUNT(*), MAX(title) FROM notes", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(title, "final");
    }

    #[test]
    fn test_update_missing_row_is_false() {
        let conn = note_conn();
        let wrapper = DatabaseWrapper::new(&conn);
        let saver: ModelSaver<Note, _> = ModelSaver::new(NoteAdapter::new());

        let note = Note::with_id(42, "ghost");
        assert!(!saver.update_one(&note, &wrapper).unwrap());
    }

    #[test]
    fn test_delete_resets_id() {
        let conn = note_conn();
        let wrapper = DatabaseWrapper::new(&conn);
        let saver: ModelSaver<Note, _> = ModelSaver::new(NoteAdapter::new());

        let mut note = Note::new("gone soon");
        saver.insert_one(&mut note, &wrapper).unwrap();
        assert!(saver.delete_one(&mut note, &wrapper).unwrap());
        assert_eq!(note.id, 0);
        assert!(!saver.delete_one(&mut note, &wrapper).unwrap());
    }

    #[test]
    fn test_one_shot_statements_are_released() {
        let conn = note_conn();
        let wrapper = DatabaseWrapper::new(&conn);
        let saver: ModelSaver<Note, _> = ModelSaver::new(NoteAdapter::new());

        let mut bad = Note::new("");
        assert!(saver.save_one(&mut bad, &wrapper).is_err());
        assert_eq!(wrapper.stats().compiled(), 2);
        assert_eq!(wrapper.stats().open(), 0);
    }
}
