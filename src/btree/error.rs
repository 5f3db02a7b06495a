use thiserror::Error;

use super::node::NodeId;

/// Errors that can occur during multiway tree operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("Invalid degree: {0} (must be >= 3)")]
    InvalidDegree(usize),

    #[error("Index out of range: index={index}, len={len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Invalid tree state: {0}")]
    InvalidState(String),
}

pub type TreeResult<T> = Result<T, TreeError>;
