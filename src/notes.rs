//! A `notes` table and its hand-written adapter.
//!
//! Used by the `modelflow` binary and as a reference for writing adapters.

use rusqlite::Connection;
use serde::Serialize;

use crate::adapter::{MapCache, ModelAdapter};
use crate::storage::{DatabaseStatement, DatabaseWrapper, StoreError};

/// A note. `id` is 0 until the note has been inserted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Note {
    pub id: i64,
    pub title: String,
}

impl Note {
    pub fn new(title: &str) -> Self {
        Self::with_id(0, title)
    }

    pub fn with_id(id: i64, title: &str) -> Self {
        Self {
            id,
            title: title.to_string(),
        }
    }
}

/// Caching id for notes.
pub fn note_id(note: &Note) -> i64 {
    note.id
}

/// Cache of notes keyed by id.
pub type NoteCache = MapCache<i64, Note>;

/// Create the `notes` table if it does not exist.
pub fn create_table(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS notes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL CHECK (title <> '')
        );
        "#,
    )
}

/// Load every note, ordered by id.
pub fn load_all(conn: &Connection) -> Result<Vec<Note>, StoreError> {
    let mut stmt = conn.prepare("SELECT id, title FROM notes ORDER BY id ASC")?;
    let notes = stmt
        .query_map([], |row| {
            Ok(Note {
                id: row.get(0)?,
                title: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(notes)
}

/// Load one note by id.
pub fn find(conn: &Connection, id: i64) -> Result<Option<Note>, StoreError> {
    let mut stmt = conn.prepare("SELECT id, title FROM notes WHERE id = ?1")?;
    let mut rows = stmt.query_map([id], |row| {
        Ok(Note {
            id: row.get(0)?,
            title: row.get(1)?,
        })
    })?;
    Ok(rows.next().transpose()?)
}

/// Count stored notes.
pub fn count(conn: &Connection) -> Result<i64, StoreError> {
    Ok(conn.query_row("SELECT COUNT(*) FROM notes", [], |row| row.get(0))?)
}

/// [`ModelAdapter`] for [`Note`].
#[derive(Debug, Clone)]
pub struct NoteAdapter {
    insert_sql: &'static str,
}

impl NoteAdapter {
    pub fn new() -> Self {
        Self {
            insert_sql: "INSERT INTO notes (id, title) VALUES (?1, ?2)",
        }
    }

    /// Inserts that hit an existing id report 0 instead of failing.
    pub fn ignoring_conflicts() -> Self {
        Self {
            insert_sql: "INSERT OR IGNORE INTO notes (id, title) VALUES (?1, ?2)",
        }
    }
}

impl Default for NoteAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelAdapter<Note> for NoteAdapter {
    fn table_name(&self) -> &str {
        "notes"
    }

    fn insert_sql(&self) -> &str {
        self.insert_sql
    }

    fn update_sql(&self) -> &str {
        "UPDATE notes SET title = ?1 WHERE id = ?2"
    }

    fn delete_sql(&self) -> &str {
        "DELETE FROM notes WHERE id = ?1"
    }

    fn bind_to_insert_statement(
        &self,
        stmt: &mut DatabaseStatement<'_>,
        model: &Note,
    ) -> Result<(), StoreError> {
        // 0 means "not inserted yet"; NULL lets SQLite assign the id
        if model.id > 0 {
            stmt.bind(1, model.id)?;
        } else {
            stmt.bind_null(1)?;
        }
        stmt.bind(2, model.title.as_str())
    }

    fn bind_to_update_statement(
        &self,
        stmt: &mut DatabaseStatement<'_>,
        model: &Note,
    ) -> Result<(), StoreError> {
        stmt.bind(1, model.title.as_str())?;
        stmt.bind(2, model.id)
    }

    fn bind_to_delete_statement(
        &self,
        stmt: &mut DatabaseStatement<'_>,
        model: &Note,
    ) -> Result<(), StoreError> {
        stmt.bind(1, model.id)
    }

    fn exists(&self, model: &Note, wrapper: &DatabaseWrapper<'_>) -> Result<bool, StoreError> {
        if model.id <= 0 {
            return Ok(false);
        }
        let found: bool = wrapper.connection().query_row(
            "SELECT EXISTS(SELECT 1 FROM notes WHERE id = ?1)",
            [model.id],
            |row| row.get(0),
        )?;
        Ok(found)
    }

    fn update_auto_increment(&self, model: &mut Note, id: i64) {
        model.id = id;
    }
}
