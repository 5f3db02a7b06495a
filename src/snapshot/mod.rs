//! JSON snapshots of a tree's exact node layout
//!
//! A snapshot records the degree and the nested node structure, so a tree can
//! be written out, edited by hand, and rebuilt verbatim. Rebuilt trees are
//! validated before they are handed back.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::btree::{MultiwayTree, Node, NodeId, TreeError, TreeKey};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid snapshot: {0}")]
    TreeError(#[from] TreeError),
}

pub type SnapshotResult<T> = Result<T, SnapshotError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub keys: Vec<TreeKey>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeSnapshot {
    pub degree: usize,
    pub root: NodeSnapshot,
}

impl TreeSnapshot {
    pub fn load<P: AsRef<Path>>(path: P) -> SnapshotResult<Self> {
        let content = fs::read_to_string(path)?;
        let snapshot = serde_json::from_str(&content)?;
        Ok(snapshot)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> SnapshotResult<()> {
        let content = serde_json::to_string_pretty(&self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

impl MultiwayTree {
    pub fn to_snapshot(&self) -> TreeSnapshot {
        TreeSnapshot {
            degree: self.degree(),
            root: self.snapshot_node(self.root_id()),
        }
    }

    fn snapshot_node(&self, id: NodeId) -> NodeSnapshot {
        match self.node(id) {
            Some(node) => NodeSnapshot {
                keys: node.keys.clone(),
                children: node
                    .children
                    .iter()
                    .map(|&child| self.snapshot_node(child))
                    .collect(),
            },
            None => NodeSnapshot {
                keys: Vec::new(),
                children: Vec::new(),
            },
        }
    }

    /// Rebuild a tree with exactly the node layout of `snapshot`
    pub fn from_snapshot(snapshot: &TreeSnapshot) -> SnapshotResult<Self> {
        if snapshot.degree < crate::btree::MIN_DEGREE {
            return Err(TreeError::InvalidDegree(snapshot.degree).into());
        }

        let mut nodes = Vec::new();
        // (snapshot node, parent, slot reserved in `nodes`)
        let mut pending = vec![(&snapshot.root, None::<NodeId>, 0usize)];
        nodes.push(Node::with_entries(snapshot.degree, Vec::new(), Vec::new(), None));

        while let Some((snap, parent, id)) = pending.pop() {
            if !snap.children.is_empty() && snap.children.len() != snap.keys.len() + 1 {
                return Err(TreeError::InvalidState(format!(
                    "node with {} keys has {} children",
                    snap.keys.len(),
                    snap.children.len()
                ))
                .into());
            }

            let mut children = Vec::with_capacity(snap.children.len());
            for child in &snap.children {
                let child_id = nodes.len();
                nodes.push(Node::with_entries(snapshot.degree, Vec::new(), Vec::new(), None));
                children.push(child_id);
                pending.push((child, Some(id), child_id));
            }

            nodes[id] = Node::with_entries(snapshot.degree, snap.keys.clone(), children, parent);
        }

        let tree = MultiwayTree::from_raw_parts(0, snapshot.degree, nodes);
        tree.validate()?;
        Ok(tree)
    }

    pub fn save_snapshot<P: AsRef<Path>>(&self, path: P) -> SnapshotResult<()> {
        self.to_snapshot().save(path)
    }

    pub fn load_snapshot<P: AsRef<Path>>(path: P) -> SnapshotResult<Self> {
        Self::from_snapshot(&TreeSnapshot::load(path)?)
    }
}
