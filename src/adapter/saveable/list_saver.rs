//! Batch persistence over collections.
//!
//! Each batch call compiles the statements its operation needs once, runs
//! every entity through them in order, and releases them on every exit path.
//! Statements are owned by the call frame, so an error from any entity drops
//! (finalizes) them before the error reaches the caller.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use super::model_saver::ModelSaver;
use crate::adapter::ModelAdapter;
use crate::observability::metrics::record_batch;
use crate::storage::{DatabaseWrapper, StoreError};

/// Batch operation kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Save,
    Insert,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Save => "save",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Applies one operation kind to every entity of a collection.
///
/// Every method returns the number of entities whose operation succeeded:
///
/// | Operation | Success |
/// |-----------|---------|
/// | save      | update affected a row, or insert produced an id > 0 |
/// | insert    | generated row id > 0 |
/// | update    | at least one row affected |
/// | delete    | at least one row affected |
///
/// An empty collection returns 0 without compiling anything. Effects on
/// entities processed before an error are kept; wrap the call in a
/// transaction to make a batch atomic.
pub trait ListSaver<T> {
    fn save_all(&self, models: &mut [T], wrapper: &DatabaseWrapper<'_>) -> Result<u64, StoreError>;

    fn insert_all(&self, models: &mut [T], wrapper: &DatabaseWrapper<'_>)
        -> Result<u64, StoreError>;

    fn update_all(&self, models: &mut [T], wrapper: &DatabaseWrapper<'_>)
        -> Result<u64, StoreError>;

    fn delete_all(&self, models: &mut [T], wrapper: &DatabaseWrapper<'_>)
        -> Result<u64, StoreError>;
}

/// Batch saver for one entity type.
///
/// Batch calls on one instance are serialized by an internal lock held for
/// the whole call, so the statements compiled for a call are never shared
/// with another. The `*_with` callbacks run while that lock is held and must
/// not call back into the same saver.
pub struct ListModelSaver<T, A> {
    model_saver: ModelSaver<T, A>,
    lock: Mutex<()>,
}

impl<T, A: ModelAdapter<T>> ListModelSaver<T, A> {
    pub fn new(model_saver: ModelSaver<T, A>) -> Self {
        Self {
            model_saver,
            lock: Mutex::new(()),
        }
    }

    /// Convenience constructor for sharing with a caching saver.
    pub fn shared(adapter: A) -> Arc<Self> {
        Arc::new(Self::new(ModelSaver::new(adapter)))
    }

    pub fn model_saver(&self) -> &ModelSaver<T, A> {
        &self.model_saver
    }

    /// Save every entity, calling `on_success` for each one that succeeded.
    pub fn save_all_with<C>(
        &self,
        models: &mut [T],
        wrapper: &DatabaseWrapper<'_>,
        mut on_success: C,
    ) -> Result<u64, StoreError>
    where
        C: FnMut(&T),
    {
        let _guard = self.lock.lock();
        if models.is_empty() {
            return Ok(0);
        }

        let adapter = self.model_saver.adapter();
        let mut insert = adapter.get_insert_statement(wrapper)?;
        let mut update = adapter.get_update_statement(wrapper)?;
        let notify = |model: &mut T| on_success(&*model);
        let result = self.apply_and_count(Operation::Save, models, notify, |model| {
            self.model_saver.save(model, &mut insert, &mut update, wrapper)
        });
        insert.close();
        update.close();
        result
    }

    /// Insert every entity, calling `on_success` for each generated id > 0.
    pub fn insert_all_with<C>(
        &self,
        models: &mut [T],
        wrapper: &DatabaseWrapper<'_>,
        mut on_success: C,
    ) -> Result<u64, StoreError>
    where
        C: FnMut(&T),
    {
        let _guard = self.lock.lock();
        if models.is_empty() {
            return Ok(0);
        }

        let mut insert = self.model_saver.adapter().get_insert_statement(wrapper)?;
        let notify = |model: &mut T| on_success(&*model);
        let result = self.apply_and_count(Operation::Insert, models, notify, |model| {
            Ok(self.model_saver.insert(model, &mut insert)? > 0)
        });
        insert.close();
        result
    }

    /// Update every entity, calling `on_success` for each affected row.
    pub fn update_all_with<C>(
        &self,
        models: &mut [T],
        wrapper: &DatabaseWrapper<'_>,
        mut on_success: C,
    ) -> Result<u64, StoreError>
    where
        C: FnMut(&T),
    {
        let _guard = self.lock.lock();
        if models.is_empty() {
            return Ok(0);
        }

        let mut update = self.model_saver.adapter().get_update_statement(wrapper)?;
        let notify = |model: &mut T| on_success(&*model);
        let result = self.apply_and_count(Operation::Update, models, notify, |model| {
            self.model_saver.update(model, &mut update)
        });
        update.close();
        result
    }

    /// Delete every entity, calling `on_success` for each affected row.
    ///
    /// `on_success` sees the entity with its id intact; the id is reset to 0
    /// right after.
    pub fn delete_all_with<C>(
        &self,
        models: &mut [T],
        wrapper: &DatabaseWrapper<'_>,
        mut on_success: C,
    ) -> Result<u64, StoreError>
    where
        C: FnMut(&T),
    {
        let _guard = self.lock.lock();
        if models.is_empty() {
            return Ok(0);
        }

        let mut delete = self.model_saver.adapter().get_delete_statement(wrapper)?;
        let on_deleted = |model: &mut T| {
            on_success(&*model);
            self.model_saver.reset_id(model);
        };
        let result = self.apply_and_count(Operation::Delete, models, on_deleted, |model| {
            self.model_saver.delete(model, &mut delete)
        });
        delete.close();
        result
    }

    fn apply_and_count<C, F>(
        &self,
        operation: Operation,
        models: &mut [T],
        mut on_success: C,
        mut apply: F,
    ) -> Result<u64, StoreError>
    where
        C: FnMut(&mut T),
        F: FnMut(&mut T) -> Result<bool, StoreError>,
    {
        let table = self.model_saver.adapter().table_name();
        let start = Instant::now();
        let mut count = 0u64;

        for (index, model) in models.iter_mut().enumerate() {
            match apply(model) {
                Ok(true) => {
                    on_success(model);
                    count += 1;
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(
                        table,
                        %operation,
                        index,
                        succeeded = count,
                        error = %e,
                        "Batch aborted"
                    );
                    record_batch(table, operation.as_str(), count, start.elapsed().as_secs_f64());
                    return Err(e);
                }
            }
        }

        tracing::debug!(
            table,
            %operation,
            total = models.len(),
            succeeded = count,
            "Batch applied"
        );
        record_batch(table, operation.as_str(), count, start.elapsed().as_secs_f64());
        Ok(count)
    }
}

impl<T, A: ModelAdapter<T>> ListSaver<T> for ListModelSaver<T, A> {
    fn save_all(&self, models: &mut [T], wrapper: &DatabaseWrapper<'_>) -> Result<u64, StoreError> {
        self.save_all_with(models, wrapper, |_| {})
    }

    fn insert_all(
        &self,
        models: &mut [T],
        wrapper: &DatabaseWrapper<'_>,
    ) -> Result<u64, StoreError> {
        self.insert_all_with(models, wrapper, |_| {})
    }

    fn update_all(
        &self,
        models: &mut [T],
        wrapper: &DatabaseWrapper<'_>,
    ) -> Result<u64, StoreError> {
        self.update_all_with(models, wrapper, |_| {})
    }

    fn delete_all(
        &self,
        models: &mut [T],
        wrapper: &DatabaseWrapper<'_>,
    ) -> Result<u64, StoreError> {
        self.delete_all_with(models, wrapper, |_| {})
    }
}
