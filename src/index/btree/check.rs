//! Structural integrity check.

use std::collections::HashSet;

use crate::common::{Error, NodeId, Result};

use super::key::Key;
use super::node::Node;
use super::tree::BPlusTree;

/// Summary of a tree that passed [`BPlusTree::check`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TreeShape {
    pub height: u32,
    pub leaf_nodes: u32,
    pub internal_nodes: u32,
    /// Total number of stored entries.
    pub entries: u64,
}

/// State threaded through the recursive walk.
struct Walk {
    shape: TreeShape,
    visited: HashSet<NodeId>,
    /// Leaves in left-to-right order.
    leaves: Vec<NodeId>,
}

fn corrupted(msg: String) -> Error {
    Error::Corrupted(msg)
}

impl BPlusTree {
    /// Walk the whole tree and verify its invariants.
    ///
    /// Checks that keys ascend within every node and respect the ranges set
    /// by ancestor separators, that internal nodes have one more child than
    /// separators, that every leaf sits at the recorded height, that no node
    /// is reachable twice, and that the leaf chain links exactly the
    /// reachable leaves in order.
    ///
    /// # Errors
    /// Returns `Error::Corrupted` describing the first violation found.
    pub fn check(&mut self) -> Result<TreeShape> {
        let mut walk = Walk {
            shape: TreeShape {
                height: self.height(),
                ..TreeShape::default()
            },
            visited: HashSet::new(),
            leaves: Vec::new(),
        };
        let root = self.root();
        self.check_node(root, 1, None, None, &mut walk)?;
        self.check_chain(&walk.leaves)?;

        let shape = walk.shape;
        if shape.leaf_nodes != self.leaf_count() || shape.internal_nodes != self.internal_count() {
            return Err(corrupted(format!(
                "reachable nodes ({} leaves, {} internal) differ from allocated ({}, {})",
                shape.leaf_nodes,
                shape.internal_nodes,
                self.leaf_count(),
                self.internal_count()
            )));
        }
        Ok(shape)
    }

    fn check_node(
        &mut self,
        id: NodeId,
        depth: u32,
        lower: Option<&Key>,
        upper: Option<&Key>,
        walk: &mut Walk,
    ) -> Result<()> {
        if !walk.visited.insert(id) {
            return Err(corrupted(format!("{} is reachable twice", id)));
        }
        if depth > walk.shape.height {
            return Err(corrupted(format!(
                "{} at depth {} exceeds height {}",
                id, depth, walk.shape.height
            )));
        }

        let node = self.store.read_node(id)?;
        let keys = match &node {
            Node::Leaf(leaf) => &leaf.keys,
            Node::Internal(internal) => &internal.keys,
        };
        if keys.windows(2).any(|w| w[0] >= w[1]) {
            return Err(corrupted(format!("keys of {} are not strictly ascending", id)));
        }
        if let (Some(lo), Some(first)) = (lower, keys.first()) {
            if first < lo {
                return Err(corrupted(format!("{} holds {} below bound {}", id, first, lo)));
            }
        }
        if let (Some(hi), Some(last)) = (upper, keys.last()) {
            if last >= hi {
                return Err(corrupted(format!("{} holds {} at or above bound {}", id, last, hi)));
            }
        }

        match node {
            Node::Leaf(leaf) => {
                if depth != walk.shape.height {
                    return Err(corrupted(format!(
                        "leaf {} at depth {} but height is {}",
                        id, depth, walk.shape.height
                    )));
                }
                walk.shape.leaf_nodes += 1;
                walk.shape.entries += leaf.keys.len() as u64;
                walk.leaves.push(id);
            }
            Node::Internal(internal) => {
                if internal.children.len() != internal.keys.len() + 1 {
                    return Err(corrupted(format!(
                        "{} has {} separators and {} children",
                        id,
                        internal.keys.len(),
                        internal.children.len()
                    )));
                }
                walk.shape.internal_nodes += 1;
                for (i, &child) in internal.children.iter().enumerate() {
                    let lo = if i == 0 { lower } else { internal.keys.get(i - 1) };
                    let hi = internal.keys.get(i).or(upper);
                    self.check_node(child, depth + 1, lo, hi, walk)?;
                }
            }
        }
        Ok(())
    }

    /// Follow `next` from the first leaf and compare with the in-order leaves.
    fn check_chain(&mut self, leaves: &[NodeId]) -> Result<()> {
        let mut previous: Option<Key> = None;
        for (i, &id) in leaves.iter().enumerate() {
            let leaf = self.read_leaf(id)?;
            let expected = leaves.get(i + 1).copied().unwrap_or(NodeId::INVALID);
            if leaf.next != expected {
                return Err(corrupted(format!(
                    "{} links to {} but the next leaf in order is {}",
                    id, leaf.next, expected
                )));
            }
            if let (Some(prev), Some(first)) = (&previous, leaf.keys.first()) {
                if first <= prev {
                    return Err(corrupted(format!(
                        "leaf chain is not ascending at {} ({} after {})",
                        id, first, prev
                    )));
                }
            }
            if let Some(last) = leaf.keys.last() {
                previous = Some(last.clone());
            }
        }
        Ok(())
    }
}
