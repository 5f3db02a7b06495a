use std::fmt;

use super::TreeKey;
use super::error::{TreeError, TreeResult};

/// Node identifier (index into node storage)
pub type NodeId = usize;

/// Where a key falls within a single node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// The key is stored at this index
    Found(usize),
    /// The key belongs to the subtree rooted at `children[i]`
    Descend(usize),
    /// Leaf node: the key would be inserted at this index
    Vacant(usize),
}

/// Tree node holding keys and child links as two parallel sequences
///
/// A node with `k` keys is laid out as `[child0, key0, child1, ..., key(k-1), childk]`:
/// - `keys` is strictly ascending
/// - `children` holds `k + 1` handles for internal nodes and is empty for leaves
/// - `parent` is a back-reference only; the tree owns every node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Maximum branching factor, shared by the whole tree
    pub degree: usize,
    pub keys: Vec<TreeKey>,
    pub children: Vec<NodeId>,
    /// Parent node, `None` for the root
    pub parent: Option<NodeId>,
}

impl Node {
    /// Create a single-key leaf
    pub fn leaf(degree: usize, key: TreeKey) -> Self {
        Self {
            degree,
            keys: vec![key],
            children: Vec::new(),
            parent: None,
        }
    }

    /// Create a node with given keys and children
    pub fn with_entries(
        degree: usize,
        keys: Vec<TreeKey>,
        children: Vec<NodeId>,
        parent: Option<NodeId>,
    ) -> Self {
        debug_assert!(children.is_empty() || children.len() == keys.len() + 1);
        Self {
            degree,
            keys,
            children,
            parent,
        }
    }

    /// Number of keys
    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Minimum number of keys a non-root node should hold.
    ///
    /// Only meaningful once removal exists; insertion never checks it.
    pub fn min_keys(&self) -> usize {
        self.degree.div_ceil(2) - 1
    }

    /// Maximum number of keys before the node overflows
    pub fn max_keys(&self) -> usize {
        self.degree - 1
    }

    pub fn is_overflowing(&self) -> bool {
        self.key_count() >= self.degree
    }

    /// Scan the keys left to right and report where `key` falls
    pub fn locate(&self, key: TreeKey) -> Slot {
        for (i, &k) in self.keys.iter().enumerate() {
            if key == k {
                return Slot::Found(i);
            }
            if key < k {
                return if self.is_leaf() {
                    Slot::Vacant(i)
                } else {
                    Slot::Descend(i)
                };
            }
        }

        if self.is_leaf() {
            Slot::Vacant(self.keys.len())
        } else {
            Slot::Descend(self.keys.len())
        }
    }

    /// Insert a key into a leaf at the given position
    pub fn insert_key(&mut self, index: usize, key: TreeKey) -> TreeResult<()> {
        if index > self.keys.len() {
            return Err(TreeError::IndexOutOfRange {
                index,
                len: self.keys.len(),
            });
        }
        if !self.is_leaf() {
            return Err(TreeError::InvalidState(format!(
                "cannot insert key {} directly into an internal node",
                key
            )));
        }
        self.keys.insert(index, key);
        Ok(())
    }

    /// Position of `child` among this node's children
    pub fn child_index(&self, child: NodeId) -> Option<usize> {
        self.children.iter().position(|&c| c == child)
    }

    /// Replace the slot of `left` with `[left, median, right]`.
    /// Used after `left` was split.
    pub fn insert_child(&mut self, left: NodeId, median: TreeKey, right: NodeId) -> TreeResult<()> {
        let pos = self.child_index(left).ok_or_else(|| {
            TreeError::InvalidState(format!("node {} is not a child of its parent", left))
        })?;
        self.keys.insert(pos, median);
        self.children.insert(pos + 1, right);
        Ok(())
    }

    /// Split this node around its median key, returning the median and the new right half.
    /// This node keeps the left half. The right half inherits this node's parent.
    pub fn split_off(&mut self) -> TreeResult<(TreeKey, Node)> {
        let mid = self.key_count() / 2;

        let right_keys = self.keys.split_off(mid + 1);
        let median = self.keys.pop().ok_or(TreeError::IndexOutOfRange {
            index: mid,
            len: 0,
        })?;
        let right_children = if self.is_leaf() {
            Vec::new()
        } else {
            self.children.split_off(mid + 1)
        };

        let right = Node::with_entries(self.degree, right_keys, right_children, self.parent);
        Ok((median, right))
    }
}

impl fmt::Display for Node {
    /// Renders e.g. `|[N]3[N]11[N]|`, `[K]` marking a present child and `[N]` an absent one
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let child = if self.is_leaf() { "[N]" } else { "[K]" };
        write!(f, "|{}", child)?;
        for key in &self.keys {
            write!(f, "{}{}", key, child)?;
        }
        write!(f, "|")
    }
}
