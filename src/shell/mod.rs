//! Command execution and the interactive read-eval-print loop

use prettytable::{Table, format, row};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use thiserror::Error;
use tracing::{info, warn};

use crate::btree::{MultiwayTree, TreeError, TreeKey};
use crate::command::{self, Command};
use crate::config::ShellConfig;
use crate::import::{self, ImportError};
use crate::snapshot::SnapshotError;

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    #[error("{0}")]
    Parse(String),

    #[error("Tree is empty")]
    EmptyTree,

    #[error("Readline error: {0}")]
    Readline(#[from] ReadlineError),
}

pub type ShellResult<T> = Result<T, ShellError>;

const HELP: &str = "\
Commands (separate with ';' or newlines, '--' starts a comment):
  INSERT k [k ...]   insert keys, duplicates are ignored
  CONTAINS k         report whether k is in the tree
  SEARCH k           show the node and slot where k is or would go
  DUMP               breadth-first dump, one line per level
  LEVELS             table of nodes per level
  STATS              degree, key count, node count and height
  CHECK              verify the tree invariants
  NEW degree k       start over with a fresh tree
  SAVE 'path'        write a JSON snapshot
  LOAD 'path'        replace the tree with a JSON snapshot
  IMPORT 'path'      insert keys from a CSV file
  HELP               this text
  EXIT | QUIT        leave the shell";

/// Result of running one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Output(String),
    Exit,
}

pub struct Shell {
    tree: Option<MultiwayTree>,
    config: ShellConfig,
}

impl Shell {
    pub fn new(tree: Option<MultiwayTree>, config: ShellConfig) -> Self {
        Self { tree, config }
    }

    pub fn tree(&self) -> Option<&MultiwayTree> {
        self.tree.as_ref()
    }

    /// Insert keys, creating the tree from the first key if there is none yet.
    /// Returns how many keys were new.
    pub fn insert_keys(&mut self, keys: &[TreeKey]) -> ShellResult<usize> {
        match &mut self.tree {
            Some(tree) => Ok(tree.insert_many(keys.iter().copied())?),
            None => {
                let Some((&first, rest)) = keys.split_first() else {
                    return Ok(0);
                };
                let mut tree = MultiwayTree::new(first, self.config.degree)?;
                let inserted = tree.insert_many(rest.iter().copied())? + 1;
                self.tree = Some(tree);
                Ok(inserted)
            }
        }
    }

    pub fn execute(&mut self, command: Command) -> ShellResult<Outcome> {
        let output = match command {
            Command::Insert(keys) => {
                let inserted = self.insert_keys(&keys)?;
                format!("Inserted {} of {} keys", inserted, keys.len())
            }
            Command::Contains(key) => {
                let found = match &self.tree {
                    Some(tree) => tree.contains(key)?,
                    None => false,
                };
                found.to_string()
            }
            Command::Search(key) => match &self.tree {
                None => "Tree is empty".to_string(),
                Some(tree) => {
                    let result = tree.search(key)?;
                    let node = tree.node(result.node).ok_or(TreeError::NodeNotFound(result.node))?;
                    format!(
                        "{} key {} in node {} {} at index {}",
                        if result.found { "Found" } else { "Missing" },
                        key,
                        result.node,
                        node,
                        result.index
                    )
                }
            },
            Command::Dump => match &self.tree {
                None => "Tree is empty".to_string(),
                Some(tree) => tree.dump(),
            },
            Command::Levels => match &self.tree {
                None => "Tree is empty".to_string(),
                Some(tree) => render_levels(tree),
            },
            Command::Stats => match &self.tree {
                None => "Tree is empty".to_string(),
                Some(tree) => render_stats(tree),
            },
            Command::Check => match &self.tree {
                None => "OK".to_string(),
                Some(tree) => {
                    tree.validate()?;
                    "OK".to_string()
                }
            },
            Command::New { degree, key } => {
                self.tree = Some(MultiwayTree::new(key, degree)?);
                self.config.degree = degree;
                format!("New tree of degree {}", degree)
            }
            Command::Save(path) => {
                let tree = self.tree.as_ref().ok_or(ShellError::EmptyTree)?;
                tree.save_snapshot(&path)?;
                info!(%path, "saved snapshot");
                format!("Saved to {}", path)
            }
            Command::Load(path) => {
                let tree = MultiwayTree::load_snapshot(&path)?;
                info!(%path, keys = tree.len(), "loaded snapshot");
                self.config.degree = tree.degree();
                let message = format!("Loaded {} keys from {}", tree.len(), path);
                self.tree = Some(tree);
                message
            }
            Command::Import(path) => {
                let keys = import::load_keys_csv(&path, self.config.csv_delimiter)?;
                let inserted = self.insert_keys(&keys)?;
                format!("Imported {} of {} keys", inserted, keys.len())
            }
            Command::Help => HELP.to_string(),
            Command::Exit => return Ok(Outcome::Exit),
        };

        Ok(Outcome::Output(output))
    }

    /// Parse and run a script, stopping at the first error or `EXIT`
    pub fn run_script(&mut self, script: &str) -> ShellResult<Vec<String>> {
        let commands = command::parse(script).map_err(ShellError::Parse)?;
        let mut outputs = Vec::new();

        for cmd in commands {
            match self.execute(cmd)? {
                Outcome::Output(out) => outputs.push(out),
                Outcome::Exit => break,
            }
        }

        Ok(outputs)
    }

    /// Interactive loop; errors in a line are printed and the loop continues
    pub fn repl(&mut self) -> ShellResult<()> {
        let mut editor = DefaultEditor::new()?;
        if let Some(history) = &self.config.history_file {
            if editor.load_history(history).is_err() {
                info!(path = %history.display(), "no previous history");
            }
        }

        loop {
            let line = match editor.readline(&self.config.prompt) {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err.into()),
            };
            if line.trim().is_empty() {
                continue;
            }
            editor.add_history_entry(line.as_str())?;

            let commands = match command::parse(&line) {
                Ok(commands) => commands,
                Err(err) => {
                    println!("{}", err);
                    continue;
                }
            };

            let mut exit = false;
            for cmd in commands {
                match self.execute(cmd) {
                    Ok(Outcome::Output(out)) => println!("{}", out),
                    Ok(Outcome::Exit) => {
                        exit = true;
                        break;
                    }
                    Err(err) => {
                        warn!(error = %err, "command failed");
                        println!("Error: {}", err);
                        break;
                    }
                }
            }
            if exit {
                break;
            }
        }

        if let Some(history) = &self.config.history_file {
            if let Err(err) = editor.save_history(history) {
                warn!(error = %err, "failed to save history");
            }
        }
        Ok(())
    }
}

/// One row per level: depth, node count, and the nodes themselves
pub fn render_levels(tree: &MultiwayTree) -> String {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
    table.set_titles(row!["Level", "Nodes", "Keys"]);

    for (depth, level) in tree.level_ids().iter().enumerate() {
        let nodes: String = level
            .iter()
            .filter_map(|&id| tree.node(id))
            .map(|n| n.to_string())
            .collect();
        table.add_row(row![depth, level.len(), nodes]);
    }

    table.to_string()
}

pub fn render_stats(tree: &MultiwayTree) -> String {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
    table.add_row(row!["degree", tree.degree()]);
    table.add_row(row!["keys", tree.len()]);
    table.add_row(row!["nodes", tree.node_count()]);
    table.add_row(row!["height", tree.height()]);
    table.add_row(row!["root", tree.root()]);
    table.to_string()
}
