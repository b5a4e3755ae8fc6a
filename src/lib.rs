//! modelflow: batched, cache-aware model persistence over SQLite.
//!
//! Collections of entities are written through per-type adapters with
//! statements compiled once per batch and always released, while an
//! in-memory cache tracks exactly the entities whose writes succeeded.
//! Database work can also be handed to a dedicated transaction thread and
//! observed through single-result subscriptions.
//!
//! # Modules
//!
//! - [`adapter`]: Model adapters, caches, and entity/batch savers
//! - [`config`]: CLI and environment configuration
//! - [`notes`]: Sample `notes` table and adapter
//! - [`observability`]: Metrics and tracing setup
//! - [`storage`]: Connection pool, connection handles, compiled statements
//! - [`transaction`]: Async transaction executor and subscription adapters
//!
//! # Example
//!
//! ```no_run
//! use modelflow::adapter::saveable::{CacheableListModelSaver, ListModelSaver, ListSaver};
//! use modelflow::notes::{self, Note, NoteAdapter, NoteCache};
//! use modelflow::storage::DatabaseWrapper;
//!
//! let conn = rusqlite::Connection::open_in_memory()?;
//! notes::create_table(&conn)?;
//!
//! let saver = CacheableListModelSaver::new(
//!     ListModelSaver::<Note, _>::shared(NoteAdapter::new()),
//!     NoteCache::new(notes::note_id),
//! );
//! let mut batch = vec![Note::new("a"), Note::new("b")];
//! let saved = saver.save_all(&mut batch, &DatabaseWrapper::new(&conn))?;
//! assert_eq!(saved, 2);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Lint configuration
#![warn(clippy::all)]
#![allow(
    clippy::module_name_repetitions,    // adapter::cache::CacheAdapter is fine
    clippy::must_use_candidate,         // Not all functions need #[must_use]
    clippy::missing_errors_doc,         // Error docs can be verbose
    clippy::missing_panics_doc,         // Panic docs can be verbose
    clippy::needless_raw_string_hashes, // r#""# is fine for SQL
    clippy::new_without_default         // Savers are built from parts
)]

pub mod adapter;
pub mod config;
pub mod notes;
pub mod observability;
pub mod storage;
pub mod transaction;
