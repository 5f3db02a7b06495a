pub mod btree;
pub mod command;
pub mod config;
pub mod import;
pub mod shell;
pub mod snapshot;

pub use btree::{
    InsertOutcome, MultiwayTree, Node, NodeId, SearchResult, TreeError, TreeKey, TreeResult,
};
pub use command::Command;
pub use config::{Cli, ShellConfig};
pub use shell::{Shell, ShellError, ShellResult};
pub use snapshot::{NodeSnapshot, SnapshotError, SnapshotResult, TreeSnapshot};
