//! Multiway search tree (B-tree) over integer keys
//!
//! Keys live directly in the nodes, every node holding between one and
//! `degree - 1` keys. The tree supports:
//! - Ordered key search
//! - Single-key and batch insertion (duplicates are ignored)
//! - Node splitting with upward propagation, growing a new root when needed
//!
//! Nodes are stored in an arena and refer to each other by `NodeId`, so the
//! parent back-reference is a plain index. There is no removal: nodes live
//! until the whole tree is dropped, and the minimum-occupancy rule is never
//! enforced.

mod error;
mod node;
mod tests;

pub use error::{TreeError, TreeResult};
pub use node::{Node, NodeId, Slot};

use std::collections::VecDeque;
use std::fmt;

use tracing::{debug, trace};

/// Key type stored in the tree
pub type TreeKey = i64;

/// Smallest degree that can split a node into `[left, median, right]`
pub const MIN_DEGREE: usize = 3;

/// Degree used when none is given
pub const DEFAULT_DEGREE: usize = 5;

/// Result of a tree-level search
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchResult {
    /// Node holding the key, or the leaf where it would be inserted
    pub node: NodeId,
    pub found: bool,
    /// Index into the node's keys (the key's position or its insertion point)
    pub index: usize,
}

/// What `insert` did with a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    /// The key was already present; the tree is unchanged
    DuplicateIgnored,
}

/// Multiway search tree
///
/// Degree `t` means:
/// - Every node has at most `t` children and `t - 1` keys
/// - A node holding `t` keys overflows and is split before the insert returns
/// - All leaves sit at the same depth
#[derive(Debug, Clone)]
pub struct MultiwayTree {
    /// Root node ID
    root: NodeId,

    /// Max children per node
    degree: usize,

    /// Node storage
    nodes: Vec<Node>,

    /// Number of distinct keys
    len: usize,
}

impl MultiwayTree {
    /// Create a tree holding a single key
    ///
    /// # Arguments
    /// * `initial_key` - The key stored in the initial root leaf
    /// * `degree` - Max children per node (must be >= 3)
    pub fn new(initial_key: TreeKey, degree: usize) -> TreeResult<Self> {
        if degree < MIN_DEGREE {
            return Err(TreeError::InvalidDegree(degree));
        }

        Ok(Self {
            root: 0,
            degree,
            nodes: vec![Node::leaf(degree, initial_key)],
            len: 1,
        })
    }

    /// Create a tree with the default degree (5)
    pub fn with_default_degree(initial_key: TreeKey) -> Self {
        Self {
            root: 0,
            degree: DEFAULT_DEGREE,
            nodes: vec![Node::leaf(DEFAULT_DEGREE, initial_key)],
            len: 1,
        }
    }

    /// Assemble a tree from an already linked arena. Callers must validate the result.
    pub(crate) fn from_raw_parts(root: NodeId, degree: usize, nodes: Vec<Node>) -> Self {
        let len = nodes.iter().map(Node::key_count).sum();
        Self {
            root,
            degree,
            nodes,
            len,
        }
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Number of distinct keys in the tree
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn root_id(&self) -> NodeId {
        self.root
    }

    pub fn root(&self) -> &Node {
        &self.nodes[self.root]
    }

    /// Get the total number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Get a reference to a node by ID
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    fn get_node(&self, id: NodeId) -> TreeResult<&Node> {
        self.nodes.get(id).ok_or(TreeError::NodeNotFound(id))
    }

    fn get_node_mut(&mut self, id: NodeId) -> TreeResult<&mut Node> {
        self.nodes.get_mut(id).ok_or(TreeError::NodeNotFound(id))
    }

    fn allocate_node(&mut self, node: Node) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(node);
        id
    }

    /// Tree height (1 for a single leaf)
    pub fn height(&self) -> usize {
        let mut height = 1;
        let mut current = self.root();

        while let Some(node) = current.children.first().and_then(|&id| self.node(id)) {
            current = node;
            height += 1;
        }

        height
    }

    // ========== Search Operations ==========

    /// Find the node holding `key`, or the leaf and index where it would be inserted
    pub fn search(&self, key: TreeKey) -> TreeResult<SearchResult> {
        let mut current = self.root;

        loop {
            let node = self.get_node(current)?;
            match node.locate(key) {
                Slot::Found(index) => {
                    return Ok(SearchResult {
                        node: current,
                        found: true,
                        index,
                    });
                }
                Slot::Vacant(index) => {
                    return Ok(SearchResult {
                        node: current,
                        found: false,
                        index,
                    });
                }
                Slot::Descend(child_idx) => {
                    trace!(key, node = current, child_idx, "descending");
                    current = *node.children.get(child_idx).ok_or(TreeError::IndexOutOfRange {
                        index: child_idx,
                        len: node.children.len(),
                    })?;
                }
            }
        }
    }

    pub fn contains(&self, key: TreeKey) -> TreeResult<bool> {
        Ok(self.search(key)?.found)
    }

    // ========== Insert Operations ==========

    /// Insert a single key, splitting nodes as needed
    pub fn insert(&mut self, key: TreeKey) -> TreeResult<InsertOutcome> {
        let SearchResult { node, found, index } = self.search(key)?;
        if found {
            trace!(key, "duplicate key ignored");
            return Ok(InsertOutcome::DuplicateIgnored);
        }

        self.get_node_mut(node)?.insert_key(index, key)?;

        if let Some(new_root) = self.split(node)? {
            let old_root = std::mem::replace(&mut self.root, new_root);
            debug!(old_root, new_root, height = self.height(), "root split");
        }
        self.len += 1;

        Ok(InsertOutcome::Inserted)
    }

    /// Insert keys in sequence order, returning how many were new
    pub fn insert_many<I>(&mut self, keys: I) -> TreeResult<usize>
    where
        I: IntoIterator<Item = TreeKey>,
    {
        let mut inserted = 0;
        for key in keys {
            if self.insert(key)? == InsertOutcome::Inserted {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    /// Resolve overflow starting at `node_id` and walking up through parents.
    ///
    /// Returns the new root if the split reached the old one. The loop runs at
    /// most once per level since every iteration moves to the parent.
    fn split(&mut self, node_id: NodeId) -> TreeResult<Option<NodeId>> {
        let mut current = node_id;

        loop {
            if !self.get_node(current)?.is_overflowing() {
                return Ok(None);
            }

            let (median, right) = self.get_node_mut(current)?.split_off()?;
            let parent = right.parent;
            let moved = right.children.clone();
            let right_id = self.allocate_node(right);

            for child in moved {
                self.get_node_mut(child)?.parent = Some(right_id);
            }

            debug!(node = current, right = right_id, median, "split node");

            match parent {
                None => {
                    let new_root = Node::with_entries(
                        self.degree,
                        vec![median],
                        vec![current, right_id],
                        None,
                    );
                    let root_id = self.allocate_node(new_root);
                    self.get_node_mut(current)?.parent = Some(root_id);
                    self.get_node_mut(right_id)?.parent = Some(root_id);
                    return Ok(Some(root_id));
                }
                Some(parent_id) => {
                    self.get_node_mut(parent_id)?
                        .insert_child(current, median, right_id)?;
                    current = parent_id;
                }
            }
        }
    }

    // ========== Inspection ==========

    /// In-order iterator over all keys
    pub fn iter(&self) -> Keys<'_> {
        Keys::new(self)
    }

    /// Node IDs grouped by level, breadth-first from the root
    pub fn level_ids(&self) -> Vec<Vec<NodeId>> {
        let mut levels = Vec::new();
        let mut queue = VecDeque::from([self.root]);

        while !queue.is_empty() {
            let level: Vec<NodeId> = queue.drain(..).collect();
            for &id in &level {
                if let Some(node) = self.node(id) {
                    queue.extend(node.children.iter().copied());
                }
            }
            levels.push(level);
        }

        levels
    }

    /// Keys of every node, grouped by level, left to right
    pub fn levels(&self) -> Vec<Vec<Vec<TreeKey>>> {
        self.level_ids()
            .into_iter()
            .map(|level| {
                level
                    .into_iter()
                    .filter_map(|id| self.node(id).map(|n| n.keys.clone()))
                    .collect()
            })
            .collect()
    }

    /// Breadth-first dump, one line per level
    pub fn dump(&self) -> String {
        self.level_ids()
            .iter()
            .map(|level| {
                level
                    .iter()
                    .filter_map(|&id| self.node(id))
                    .map(Node::to_string)
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Check the structural invariants of the whole tree
    pub fn validate(&self) -> TreeResult<()> {
        let invalid = |msg: String| -> TreeResult<()> { Err(TreeError::InvalidState(msg)) };

        if self.degree < MIN_DEGREE {
            return Err(TreeError::InvalidDegree(self.degree));
        }
        if self.get_node(self.root)?.parent.is_some() {
            return invalid(format!("root {} has a parent", self.root));
        }

        let mut leaf_depth = None;
        let mut visited = 0;
        let mut key_total = 0;
        // (node, depth, exclusive lower bound, exclusive upper bound)
        let mut stack = vec![(self.root, 0usize, None::<TreeKey>, None::<TreeKey>)];

        while let Some((id, depth, lower, upper)) = stack.pop() {
            let node = self.get_node(id)?;
            visited += 1;
            if visited > self.nodes.len() {
                return invalid("cycle in child links".to_string());
            }

            if node.degree != self.degree {
                return invalid(format!("node {} has degree {}", id, node.degree));
            }
            if node.keys.is_empty() {
                return invalid(format!("node {} has no keys", id));
            }
            if node.is_overflowing() {
                return invalid(format!("node {} overflows with {} keys", id, node.key_count()));
            }
            if node.keys.windows(2).any(|w| w[0] >= w[1]) {
                return invalid(format!("node {} keys are not strictly ascending", id));
            }
            let first = node.keys[0];
            let last = node.keys[node.key_count() - 1];
            if lower.is_some_and(|l| first <= l) || upper.is_some_and(|u| last >= u) {
                return invalid(format!("node {} keys fall outside their separators", id));
            }
            key_total += node.key_count();

            if node.is_leaf() {
                match leaf_depth {
                    None => leaf_depth = Some(depth),
                    Some(d) if d != depth => {
                        return invalid(format!("leaf {} at depth {}, expected {}", id, depth, d));
                    }
                    Some(_) => {}
                }
                continue;
            }

            if node.children.len() != node.key_count() + 1 {
                return invalid(format!(
                    "node {} has {} keys but {} children",
                    id,
                    node.key_count(),
                    node.children.len()
                ));
            }
            for (i, &child) in node.children.iter().enumerate() {
                if self.get_node(child)?.parent != Some(id) {
                    return invalid(format!("child {} does not point back to {}", child, id));
                }
                let child_lower = if i == 0 { lower } else { Some(node.keys[i - 1]) };
                let child_upper = node.keys.get(i).copied().or(upper);
                stack.push((child, depth + 1, child_lower, child_upper));
            }
        }

        if visited != self.nodes.len() {
            return invalid(format!(
                "{} of {} nodes reachable from the root",
                visited,
                self.nodes.len()
            ));
        }
        if key_total != self.len {
            return invalid(format!("tree holds {} keys, expected {}", key_total, self.len));
        }

        Ok(())
    }
}

impl fmt::Display for MultiwayTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dump())
    }
}

impl<'a> IntoIterator for &'a MultiwayTree {
    type Item = TreeKey;
    type IntoIter = Keys<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// In-order iterator over tree keys
pub struct Keys<'a> {
    tree: &'a MultiwayTree,
    /// (node, index of the next key to yield)
    stack: Vec<(NodeId, usize)>,
}

impl<'a> Keys<'a> {
    fn new(tree: &'a MultiwayTree) -> Self {
        let mut iter = Self {
            tree,
            stack: Vec::new(),
        };
        iter.push_left_spine(tree.root);
        iter
    }

    fn push_left_spine(&mut self, mut id: NodeId) {
        let tree = self.tree;
        loop {
            self.stack.push((id, 0));
            match tree.node(id).and_then(|n| n.children.first()) {
                Some(&child) => id = child,
                None => break,
            }
        }
    }
}

impl Iterator for Keys<'_> {
    type Item = TreeKey;

    fn next(&mut self) -> Option<Self::Item> {
        let tree = self.tree;
        loop {
            let (id, idx) = *self.stack.last()?;
            let node = tree.node(id)?;

            if idx < node.key_count() {
                if let Some(top) = self.stack.last_mut() {
                    top.1 += 1;
                }
                if let Some(&child) = node.children.get(idx + 1) {
                    self.push_left_spine(child);
                }
                return Some(node.keys[idx]);
            }

            self.stack.pop();
        }
    }
}
