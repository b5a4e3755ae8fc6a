//! modelflow: batched, cache-aware writes and async transactions over SQLite.
//!
//! # Usage
//!
//! ```bash
//! modelflow --db ./data/notes.db add "first note" "second note"
//! modelflow --db ./data/notes.db --output json list
//! modelflow --db ./data/notes.db remove 1 2
//! ```
//!
//! Environment variables can also be used:
//! - `MODELFLOW_DB`: Path to the SQLite database
//! - `RUST_LOG`: Log level (trace, debug, info, warn, error)

mod commands;

use anyhow::{Context, Result};
use modelflow::config::{Command, Config};
use modelflow::notes;
use modelflow::observability::metrics::init_metrics;
use modelflow::observability::tracing::init_tracing;
use modelflow::storage::Database;
use modelflow::transaction::TransactionExecutor;
use std::fs;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse configuration from CLI arguments and environment
    let config = Config::parse_args();

    init_tracing(&config.log_level, config.log_json);
    init_metrics();

    if let Some(dir) = config.db.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }

    let db = Database::open(&config.db, config.pool_size).context("failed to open database")?;
    notes::create_table(&*db.get()?).context("failed to create notes table")?;

    let executor = TransactionExecutor::spawn(db, config.queue_size)?;
    let queue = executor.queue();
    let app = commands::App::new(queue.clone(), config.output);

    let outcome = match config.command.unwrap_or(Command::List) {
        Command::Add { titles } => app.add(titles).await,
        Command::List => app.list().await,
        Command::Count => app.count().await,
        Command::Rename { id, title } => app.rename(id, title).await,
        Command::Remove { ids } => app.remove(ids).await,
        Command::Show { id } => app.show(id).await,
    };

    // Let queued work finish before exiting, even if the command failed
    queue.shutdown().await?;
    executor.join()?;

    outcome
}
