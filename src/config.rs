//! Configuration for the modelflow command-line tool.
//!
//! Supports:
//! - CLI arguments via clap
//! - Environment variable overrides
//! - Sensible defaults for quick start

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// modelflow: batched, cache-aware writes and async transactions over SQLite.
#[derive(Parser, Debug, Clone)]
#[command(name = "modelflow")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Config {
    /// Path to the SQLite database file
    #[arg(short, long, env = "MODELFLOW_DB", default_value = "./data/modelflow.db")]
    pub db: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "warn")]
    pub log_level: String,

    /// Write logs as JSON lines
    #[arg(long, env = "MODELFLOW_LOG_JSON")]
    pub log_json: bool,

    /// Size of the connection pool
    #[arg(long, env = "MODELFLOW_POOL_SIZE", default_value_t = 4)]
    pub pool_size: u32,

    /// Capacity of the async transaction queue
    #[arg(long, env = "MODELFLOW_QUEUE_SIZE", default_value_t = 256)]
    pub queue_size: usize,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Add one note per title
    Add {
        /// Note titles
        #[arg(required = true)]
        titles: Vec<String>,
    },
    /// List all notes
    List,
    /// Count notes
    Count,
    /// Change the title of a note
    Rename {
        /// Note id
        id: i64,
        /// New title
        title: String,
    },
    /// Remove notes by id
    Remove {
        /// Note ids
        #[arg(required = true)]
        ids: Vec<i64>,
    },
    /// Show a note by id
    Show {
        /// Note id
        id: i64,
    },
}

impl Config {
    /// Parse configuration from CLI arguments and environment.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Create a default configuration for testing.
    #[cfg(test)]
    pub fn test_config(db: PathBuf) -> Self {
        Self {
            db,
            log_level: "debug".into(),
            log_json: false,
            pool_size: 2,
            queue_size: 16,
            output: OutputFormat::Text,
            command: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db: PathBuf::from("./data/modelflow.db"),
            log_level: "warn".into(),
            log_json: false,
            pool_size: 4,
            queue_size: 256,
            output: OutputFormat::Text,
            command: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.pool_size, 4);
        assert_eq!(config.queue_size, 256);
        assert!(config.command.is_none());
    }

    #[test]
    fn test_parse_subcommand() {
        let config = Config::try_parse_from(["modelflow", "--db", "x.db", "add", "a", "b"]).unwrap();
        assert_eq!(config.db, PathBuf::from("x.db"));
        match config.command {
            Some(Command::Add { titles }) => assert_eq!(titles, vec!["a", "b"]),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_json_output() {
        let config = Config::try_parse_from(["modelflow", "-o", "json", "count"]).unwrap();
        assert_eq!(config.output, OutputFormat::Json);
    }

    #[test]
    fn test_parse_log_json_flag() {
        let config = Config::try_parse_from(["modelflow", "--log-json", "list"]).unwrap();
        assert!(config.log_json);
        assert!(matches!(config.command, Some(Command::List)));
    }

    #[test]
    fn test_test_config_is_small() {
        let config = Config::test_config(PathBuf::from("t.db"));
        assert_eq!(config.queue_size, 16);
    }
}
