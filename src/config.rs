//! Shell configuration and command line arguments

use clap::Parser;
use std::path::PathBuf;

use crate::btree::{DEFAULT_DEGREE, TreeKey};

/// History file kept in the working directory
pub const HISTORY_FILE: &str = ".mwtree_history";

pub const PROMPT: &str = "mwtree> ";

/// Log filter used when neither `--log-level` nor `RUST_LOG` is set
pub const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    /// Degree for trees created by the shell
    pub degree: usize,
    /// `None` disables history persistence
    pub history_file: Option<PathBuf>,
    /// Field delimiter for `IMPORT`
    pub csv_delimiter: u8,
    pub prompt: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            degree: DEFAULT_DEGREE,
            history_file: Some(PathBuf::from(HISTORY_FILE)),
            csv_delimiter: b',',
            prompt: PROMPT.to_string(),
        }
    }
}

/// Interactive multiway search tree
#[derive(Debug, Parser)]
#[command(name = "mwtree", version, about)]
pub struct Cli {
    /// Max children per node (>= 3); a loaded snapshot keeps its own
    #[arg(short, long, default_value_t = DEFAULT_DEGREE, conflicts_with = "load")]
    pub degree: usize,

    /// Initial keys; the first one seeds the root
    #[arg(short, long, value_delimiter = ',', allow_negative_numbers = true)]
    pub keys: Vec<TreeKey>,

    /// Restore a tree from a JSON snapshot
    #[arg(long, conflicts_with = "keys")]
    pub load: Option<PathBuf>,

    /// Insert keys read from a CSV file
    #[arg(long)]
    pub import: Option<PathBuf>,

    /// CSV field delimiter (a single ASCII character)
    #[arg(long, default_value = ",", value_parser = parse_delimiter)]
    pub delimiter: u8,

    /// Run these commands and exit instead of starting the shell
    #[arg(short, long)]
    pub execute: Option<String>,

    /// Do not read or write the history file
    #[arg(long)]
    pub no_history: bool,

    /// Log filter, e.g. `debug` or `mwtree=trace`
    #[arg(long, default_value = DEFAULT_LOG_LEVEL)]
    pub log_level: String,
}

fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value.as_bytes() {
        [byte] if byte.is_ascii() => Ok(*byte),
        _ => Err(format!("delimiter must be one ASCII character, got {:?}", value)),
    }
}

impl Cli {
    pub fn shell_config(&self) -> ShellConfig {
        ShellConfig {
            degree: self.degree,
            history_file: if self.no_history {
                None
            } else {
                Some(PathBuf::from(HISTORY_FILE))
            },
            csv_delimiter: self.delimiter,
            ..ShellConfig::default()
        }
    }
}
