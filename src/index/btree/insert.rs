//! Insertion with bottom-up split propagation.

use tracing::debug;

use crate::common::{Error, NodeId, Result};

use super::key::Key;
use super::node::{InternalNode, LeafNode, Node};
use super::tree::BPlusTree;

/// What a subtree reports to its parent after an insertion.
enum Insertion {
    /// The subtree absorbed the key without splitting.
    Absorbed,
    /// The subtree root split; `separator` and `sibling` go into the parent.
    Split { separator: Key, sibling: NodeId },
}

impl BPlusTree {
    /// Insert the entry `(text, value)`.
    ///
    /// # Errors
    /// - `Error::DuplicateEntry` if the exact pair is already stored; the
    ///   file is left untouched
    /// - `Error::KeyTooLong` / `Error::InvalidKey` if `text` cannot be stored
    pub fn insert(&mut self, text: &str, value: i32) -> Result<()> {
        let key = self.key(text, value)?;
        let root = self.root();

        if let Insertion::Split { separator, sibling } = self.insert_into(root, &key, 1)? {
            self.grow_root(root, separator, sibling)?;
        }
        Ok(())
    }

    fn insert_into(&mut self, id: NodeId, key: &Key, depth: u32) -> Result<Insertion> {
        if depth > self.height() {
            return Err(Error::Corrupted(format!(
                "{} lies below the recorded height {}",
                id,
                self.height()
            )));
        }

        match self.store.read_node(id)? {
            Node::Leaf(mut leaf) => {
                let pos = match leaf.keys.binary_search(key) {
                    Ok(_) => {
                        return Err(Error::DuplicateEntry {
                            key: key.text().to_owned(),
                            value: key.value(),
                        })
                    }
                    Err(pos) => pos,
                };
                leaf.keys.insert(pos, key.clone());

                if leaf.keys.len() >= self.config().leaf_capacity {
                    self.split_leaf(id, leaf)
                } else {
                    self.store.write_node(id, &Node::Leaf(leaf))?;
                    Ok(Insertion::Absorbed)
                }
            }
            Node::Internal(mut node) => {
                let idx = node.child_index(key);
                match self.insert_into(node.children[idx], key, depth + 1)? {
                    Insertion::Absorbed => Ok(Insertion::Absorbed),
                    Insertion::Split { separator, sibling } => {
                        node.keys.insert(idx, separator);
                        node.children.insert(idx + 1, sibling);

                        if node.keys.len() >= self.config().internal_fanout - 1 {
                            self.split_internal(id, node)
                        } else {
                            self.store.write_node(id, &Node::Internal(node))?;
                            Ok(Insertion::Absorbed)
                        }
                    }
                }
            }
        }
    }

    /// Split a full leaf in half.
    ///
    /// The right half moves to a new leaf spliced into the chain after `id`.
    /// Its first key is copied up as the separator and stays in the leaf.
    fn split_leaf(&mut self, id: NodeId, mut leaf: LeafNode) -> Result<Insertion> {
        let mid = self.config().leaf_capacity / 2;
        let sibling = self.store.alloc_leaf()?;

        let right = LeafNode {
            keys: leaf.keys.split_off(mid),
            next: leaf.next,
        };
        leaf.next = sibling;
        let separator = right.keys[0].clone();

        self.store.write_node(id, &Node::Leaf(leaf))?;
        self.store.write_node(sibling, &Node::Leaf(right))?;
        self.store.stats_mut().leaf_splits += 1;

        debug!(node = id.0, sibling = sibling.0, separator = %separator, "split leaf");
        Ok(Insertion::Split { separator, sibling })
    }

    /// Split a full internal node around its middle separator.
    ///
    /// The middle separator moves up to the parent and is removed from both
    /// halves.
    fn split_internal(&mut self, id: NodeId, mut node: InternalNode) -> Result<Insertion> {
        let mid = (self.config().internal_fanout - 1) / 2;
        let sibling = self.store.alloc_internal()?;

        let right = InternalNode {
            keys: node.keys.split_off(mid + 1),
            children: node.children.split_off(mid + 1),
        };
        let separator = node.keys.remove(mid);

        self.store.write_node(id, &Node::Internal(node))?;
        self.store.write_node(sibling, &Node::Internal(right))?;
        self.store.stats_mut().internal_splits += 1;

        debug!(node = id.0, sibling = sibling.0, separator = %separator, "split internal node");
        Ok(Insertion::Split { separator, sibling })
    }

    /// Put a new internal root above a root that just split.
    fn grow_root(&mut self, old_root: NodeId, separator: Key, sibling: NodeId) -> Result<()> {
        let new_root = self.store.alloc_internal()?;
        let node = InternalNode {
            keys: vec![separator],
            children: vec![old_root, sibling],
        };
        self.store.write_node(new_root, &Node::Internal(node))?;

        let height = self.height() + 1;
        self.store.set_root(new_root, height)?;

        debug!(root = new_root.0, height, "tree grew a level");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::TreeConfig;
    use tempfile::{tempdir, TempDir};

    fn small_tree() -> (BPlusTree, TempDir) {
        let dir = tempdir().unwrap();
        let config = TreeConfig::new()
            .with_max_key_len(8)
            .with_leaf_capacity(4)
            .with_internal_fanout(4);
        let tree = BPlusTree::create(dir.path().join("t.db"), config).unwrap();
        (tree, dir)
    }

    fn leaf_texts(tree: &mut BPlusTree, id: NodeId) -> Vec<String> {
        tree.read_leaf(id)
            .unwrap()
            .keys
            .iter()
            .map(|k| k.text().to_owned())
            .collect()
    }

    #[test]
    fn test_insert_keeps_leaf_sorted() {
        let (mut tree, _dir) = small_tree();
        tree.insert("c", 0).unwrap();
        tree.insert("a", 0).unwrap();
        tree.insert("b", 0).unwrap();

        let root = tree.root();
        assert_eq!(leaf_texts(&mut tree, root), ["a", "b", "c"]);
        assert_eq!(tree.height(), 1);
    }

    #[test]
    fn test_duplicate_rejected_without_writes() {
        let (mut tree, _dir) = small_tree();
        tree.insert("abc", 1).unwrap();

        let before = tree.stats();
        match tree.insert("abc", 1) {
            Err(Error::DuplicateEntry { key, value }) => {
                assert_eq!(key, "abc");
                assert_eq!(value, 1);
            }
            other => panic!("Expected DuplicateEntry, got {other:?}"),
        }
        assert_eq!(tree.stats().since(&before).nodes_written, 0);

        // Same string with another value is a distinct entry
        tree.insert("abc", 2).unwrap();
    }

    #[test]
    fn test_leaf_split_copies_first_right_key() {
        let (mut tree, _dir) = small_tree();
        for text in ["a", "b", "c", "d"] {
            tree.insert(text, 0).unwrap();
        }

        assert_eq!(tree.height(), 2);
        assert_eq!(tree.leaf_count(), 2);
        assert_eq!(tree.internal_count(), 1);
        assert_eq!(tree.stats().leaf_splits, 1);

        let root = tree.root();
        let Node::Internal(node) = tree.store.read_node(root).unwrap() else {
            panic!("root should be internal");
        };
        assert_eq!(node.keys.len(), 1);
        assert_eq!(node.keys[0].text(), "c");

        let (left, right) = (node.children[0], node.children[1]);
        assert_eq!(leaf_texts(&mut tree, left), ["a", "b"]);
        // Separator stays in the right leaf
        assert_eq!(leaf_texts(&mut tree, right), ["c", "d"]);

        // Chain: left -> right -> end
        assert_eq!(tree.read_leaf(left).unwrap().next, right);
        assert!(!tree.read_leaf(right).unwrap().next.is_valid());
    }

    #[test]
    fn test_split_relinks_chain_in_the_middle() {
        let (mut tree, _dir) = small_tree();
        // [a b] [c d] then fill the left leaf until it splits
        for text in ["a", "c", "e", "g", "b", "ba", "bb"] {
            tree.insert(text, 0).unwrap();
        }

        let mut texts = Vec::new();
        let key = tree.key("", i32::MIN).unwrap();
        let (_, mut leaf) = tree.find_leaf(&key).unwrap();
        loop {
            texts.extend(leaf.keys.iter().map(|k| k.text().to_owned()));
            match leaf.next.valid() {
                Some(next) => leaf = tree.read_leaf(next).unwrap(),
                None => break,
            }
        }
        assert_eq!(texts, ["a", "b", "ba", "bb", "c", "e", "g"]);
    }

    #[test]
    fn test_internal_split_promotes_by_removal() {
        let (mut tree, _dir) = small_tree();
        // With L = 4 and M = 4 ascending inserts split a leaf every two keys
        // and the root internal node once it collects three separators.
        let texts: Vec<String> = (0..8).map(|i| format!("k{i}")).collect();
        for text in &texts {
            tree.insert(text, 0).unwrap();
        }

        assert_eq!(tree.height(), 3);
        assert_eq!(tree.stats().internal_splits, 1);

        let root = tree.root();
        let Node::Internal(root_node) = tree.store.read_node(root).unwrap() else {
            panic!("root should be internal");
        };
        assert_eq!(root_node.keys.len(), 1);
        let promoted = root_node.keys[0].clone();

        for child in root_node.children {
            let Node::Internal(node) = tree.store.read_node(child).unwrap() else {
                panic!("second level should be internal");
            };
            assert!(!node.keys.contains(&promoted));
            assert_eq!(node.children.len(), node.keys.len() + 1);
        }
    }

    #[test]
    fn test_root_growth_persists_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.db");
        let config = TreeConfig::new()
            .with_max_key_len(8)
            .with_leaf_capacity(3)
            .with_internal_fanout(4);

        let root;
        {
            let mut tree = BPlusTree::create(&path, config).unwrap();
            for i in 0..3 {
                tree.insert("x", i).unwrap();
            }
            root = tree.root();
            assert_eq!(tree.height(), 2);
            // Skip the drop-time flush to observe the eager header write
            std::mem::forget(tree);
        }

        let tree = BPlusTree::open(&path, config).unwrap();
        assert_eq!(tree.root(), root);
        assert_eq!(tree.height(), 2);
    }
}
