//! Per-entity adapters and savers.
//!
//! A [`ModelAdapter`] knows how one entity type maps onto its table: the SQL
//! for each write operation and how to bind an entity's values to it. The
//! savers in [`saveable`] drive adapters over single entities and whole
//! collections; [`cache`] holds the in-memory mirror kept by the caching
//! saver.

pub mod cache;
pub mod saveable;

pub use cache::{CacheAdapter, MapCache};

use crate::storage::{DatabaseStatement, DatabaseWrapper, StoreError};

/// Maps one entity type onto its table.
///
/// Implementors are stateless; every statement they compile is bound to the
/// wrapper it was compiled against. Bind methods must bind every parameter of
/// their statement, since statements are reused across entities.
pub trait ModelAdapter<T>: Send + Sync {
    /// Table name, used for logging and metrics.
    fn table_name(&self) -> &str;

    /// SQL for inserting one entity.
    fn insert_sql(&self) -> &str;

    /// SQL for updating one entity by primary key.
    fn update_sql(&self) -> &str;

    /// SQL for deleting one entity by primary key.
    fn delete_sql(&self) -> &str;

    fn bind_to_insert_statement(
        &self,
        stmt: &mut DatabaseStatement<'_>,
        model: &T,
    ) -> Result<(), StoreError>;

    fn bind_to_update_statement(
        &self,
        stmt: &mut DatabaseStatement<'_>,
        model: &T,
    ) -> Result<(), StoreError>;

    fn bind_to_delete_statement(
        &self,
        stmt: &mut DatabaseStatement<'_>,
        model: &T,
    ) -> Result<(), StoreError>;

    /// Whether a row for `model` is already stored.
    fn exists(&self, model: &T, wrapper: &DatabaseWrapper<'_>) -> Result<bool, StoreError>;

    /// Write a generated row id back into the entity.
    ///
    /// Called with the new id after a successful insert and with 0 after a
    /// successful delete. Entities without an auto-increment key ignore it.
    fn update_auto_increment(&self, _model: &mut T, _id: i64) {}

    fn get_insert_statement<'c>(
        &self,
        wrapper: &DatabaseWrapper<'c>,
    ) -> Result<DatabaseStatement<'c>, StoreError> {
        wrapper.compile_statement(self.insert_sql())
    }

    fn get_update_statement<'c>(
        &self,
        wrapper: &DatabaseWrapper<'c>,
    ) -> Result<DatabaseStatement<'c>, StoreError> {
        wrapper.compile_statement(self.update_sql())
    }

    fn get_delete_statement<'c>(
        &self,
        wrapper: &DatabaseWrapper<'c>,
    ) -> Result<DatabaseStatement<'c>, StoreError> {
        wrapper.compile_statement(self.delete_sql())
    }
}
