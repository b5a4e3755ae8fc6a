//! Connection pragmas.
//!
//! Table definitions belong to the application; this module only configures
//! connections so that a writer thread and pooled readers can share a file.

use rusqlite::Connection;
use std::time::Duration;

/// Busy timeout applied to every connection.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Apply the pragmas every modelflow connection runs with.
///
/// - WAL journal so readers do not block the transaction executor
/// - `synchronous=NORMAL`, durable across application crashes under WAL
/// - foreign keys enforced
pub fn apply_pragmas(conn: &Connection) -> rusqlite::Result<()> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    // journal_mode reports the resulting mode as a row
    let _mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    Ok(())
}
