//! SQLite storage layer for modelflow.
//!
//! Provides:
//! - Connection pragmas applied to every pooled connection
//! - Pooled connection access via r2d2
//! - Connection handles and compiled statements with guaranteed release

pub mod database;
pub mod schema;
pub mod wrapper;

pub use database::Database;
pub use wrapper::{DatabaseStatement, DatabaseWrapper, StatementStats, StoreError};
