//! Note commands, each run as one async transaction.

use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;

use modelflow::adapter::saveable::{CacheableListModelSaver, ListModelSaver, ListSaver};
use modelflow::config::OutputFormat;
use modelflow::notes::{self, Note, NoteAdapter, NoteCache};
use modelflow::storage::{DatabaseWrapper, StoreError};
use modelflow::transaction::TransactionQueue;

type NoteSaver = CacheableListModelSaver<Note, NoteAdapter, NoteCache>;

#[derive(Serialize)]
struct NotesOutput {
    notes: Vec<Note>,
    total: usize,
}

#[derive(Serialize)]
struct ChangeOutput {
    operation: &'static str,
    requested: usize,
    changed: u64,
    cached: usize,
}

pub struct App {
    queue: TransactionQueue,
    saver: Arc<NoteSaver>,
    format: OutputFormat,
}

impl App {
    pub fn new(queue: TransactionQueue, format: OutputFormat) -> Self {
        let saver = CacheableListModelSaver::new(
            ListModelSaver::shared(NoteAdapter::new()),
            NoteCache::new(notes::note_id),
        );
        Self {
            queue,
            saver: Arc::new(saver),
            format,
        }
    }

    pub async fn add(&self, titles: Vec<String>) -> Result<()> {
        let saver = Arc::clone(&self.saver);
        let added = self
            .queue
            .begin_transaction_async(move |wrapper| {
                let mut batch: Vec<Note> = titles.iter().map(|t| Note::new(t)).collect();
                saver.insert_all(&mut batch, wrapper)?;
                Ok(batch)
            })
            .as_single()
            .await?;

        match self.format {
            OutputFormat::Text => {
                for note in &added {
                    println!("Added #{}: {}", note.id, note.title);
                }
            }
            OutputFormat::Json => self.print_notes(added)?,
        }
        Ok(())
    }

    pub async fn list(&self) -> Result<()> {
        let all = self
            .queue
            .begin_transaction_async(|wrapper| notes::load_all(wrapper.connection()))
            .as_single()
            .await?;
        self.print_notes(all)
    }

    pub async fn count(&self) -> Result<()> {
        let total = self
            .queue
            .begin_transaction_async(|wrapper| notes::count(wrapper.connection()))
            .as_single()
            .await?;

        match self.format {
            OutputFormat::Text => println!("{total}"),
            OutputFormat::Json => println!("{}", serde_json::json!({ "total": total })),
        }
        Ok(())
    }

    pub async fn show(&self, id: i64) -> Result<()> {
        let found = self
            .queue
            .begin_transaction_async(move |wrapper| notes::find(wrapper.connection(), id))
            .as_maybe()
            .await?;

        match (self.format, found) {
            (OutputFormat::Text, Some(note)) => println!("#{}: {}", note.id, note.title),
            (OutputFormat::Text, None) => println!("No note #{id}."),
            (OutputFormat::Json, found) => println!("{}", serde_json::to_string_pretty(&found)?),
        }
        Ok(())
    }

    pub async fn rename(&self, id: i64, title: String) -> Result<()> {
        let mut batch = vec![Note::with_id(id, &title)];
        self.change("update", 1, move |saver, wrapper| {
            saver.update_all(&mut batch, wrapper)
        })
        .await
    }

    pub async fn remove(&self, ids: Vec<i64>) -> Result<()> {
        let requested = ids.len();
        let mut batch: Vec<Note> = ids.into_iter().map(|id| Note::with_id(id, "")).collect();
        self.change("delete", requested, move |saver, wrapper| {
            saver.delete_all(&mut batch, wrapper)
        })
        .await
    }

    async fn change<F>(&self, operation: &'static str, requested: usize, apply: F) -> Result<()>
    where
        F: FnOnce(&NoteSaver, &DatabaseWrapper<'_>) -> Result<u64, StoreError> + Send + 'static,
    {
        let saver = Arc::clone(&self.saver);
        let changed = self
            .queue
            .begin_transaction_async(move |wrapper| apply(&saver, wrapper))
            .as_single()
            .await?;

        let output = ChangeOutput {
            operation,
            requested,
            changed,
            cached: self.saver.cache().len(),
        };
        match self.format {
            OutputFormat::Text => {
                println!(
                    "{}: {} of {} note(s) changed",
                    output.operation, output.changed, output.requested
                );
            }
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
        }
        Ok(())
    }

    fn print_notes(&self, notes: Vec<Note>) -> Result<()> {
        let output = NotesOutput {
            total: notes.len(),
            notes,
        };

        match self.format {
            OutputFormat::Text => {
                if output.notes.is_empty() {
                    println!("No notes found.");
                } else {
                    println!("{:>8}  {}", "ID", "TITLE");
                    println!("{}", "-".repeat(48));
                    for note in &output.notes {
                        println!("{:>8}  {}", note.id, note.title);
                    }
                    println!();
                    println!("Total: {} note(s)", output.total);
                }
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
        }
        Ok(())
    }
}
