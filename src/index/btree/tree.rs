//! The tree handle and root-to-leaf navigation.

use std::path::Path;

use tracing::warn;

use crate::common::{Error, NodeId, Result, TreeConfig};
use crate::storage::StatsSnapshot;

use super::key::Key;
use super::node::{LeafNode, Node};
use super::store::NodeStore;

/// A persistent B+ tree mapping strings to sets of `i32` values.
///
/// Every operation goes straight to the file: there is no node cache, and
/// mutations are written back before the call returns. The header is
/// rewritten whenever the root changes and again when the tree is flushed,
/// closed or dropped.
///
/// # Example
/// ```no_run
/// use bplusdb::{BPlusTree, TreeConfig};
///
/// let mut tree = BPlusTree::open_or_create("index.db", TreeConfig::default()).unwrap();
/// tree.insert("apple", 3).unwrap();
/// tree.insert("apple", 1).unwrap();
/// assert_eq!(tree.find("apple").unwrap(), vec![1, 3]);
/// tree.close().unwrap();
/// ```
pub struct BPlusTree {
    pub(super) store: NodeStore,
    closed: bool,
}

impl BPlusTree {
    /// Create a new tree file holding an empty root leaf.
    ///
    /// # Errors
    /// Returns an error if the config is invalid or the file already exists.
    pub fn create<P: AsRef<Path>>(path: P, config: TreeConfig) -> Result<Self> {
        Ok(Self::from_store(NodeStore::create(path, config)?))
    }

    /// Open an existing tree file.
    ///
    /// `config` must carry the same format parameters the file was created
    /// with; only `sync_writes` may differ.
    ///
    /// # Errors
    /// Returns `Error::ConfigMismatch` on differing parameters and
    /// `Error::Corrupted` on a damaged header.
    pub fn open<P: AsRef<Path>>(path: P, config: TreeConfig) -> Result<Self> {
        Ok(Self::from_store(NodeStore::open(path, config)?))
    }

    /// Open an existing tree file, or create it if it doesn't exist.
    pub fn open_or_create<P: AsRef<Path>>(path: P, config: TreeConfig) -> Result<Self> {
        if path.as_ref().exists() {
            Self::open(path, config)
        } else {
            Self::create(path, config)
        }
    }

    fn from_store(store: NodeStore) -> Self {
        Self {
            store,
            closed: false,
        }
    }

    /// Write the header and `fsync` the file.
    pub fn flush(&mut self) -> Result<()> {
        self.store.flush()
    }

    /// Flush and close the tree, reporting any error.
    ///
    /// Dropping the tree also flushes, but can only log a failure.
    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        self.store.flush()
    }

    /// The format parameters of this tree.
    pub fn config(&self) -> &TreeConfig {
        self.store.config()
    }

    /// Number of levels, 1 while the root is a leaf.
    pub fn height(&self) -> u32 {
        self.store.header().height
    }

    /// Handle of the current root node.
    pub fn root(&self) -> NodeId {
        self.store.header().root
    }

    /// Number of leaf slots allocated over the file's lifetime.
    pub fn leaf_count(&self) -> u32 {
        self.store.header().leaf_count
    }

    /// Number of internal slots allocated over the file's lifetime.
    pub fn internal_count(&self) -> u32 {
        self.store.header().internal_count
    }

    /// Size of the backing file in bytes.
    pub fn file_size(&self) -> u64 {
        self.store.file_size()
    }

    /// I/O counters since the tree was opened (or last reset).
    pub fn stats(&self) -> StatsSnapshot {
        self.store.stats().snapshot()
    }

    pub fn reset_stats(&mut self) {
        self.store.stats_mut().reset();
    }

    /// Build a key validated against this tree's `max_key_len`.
    pub(super) fn key(&self, text: &str, value: i32) -> Result<Key> {
        Key::new(text, value, self.config().max_key_len)
    }

    /// Descend from the root to the leaf responsible for `key`.
    ///
    /// At each internal node the first child whose separator is greater
    /// than `key` is taken, or the last child if there is none. The node
    /// kind comes from the slot tag.
    ///
    /// # Errors
    /// Returns `Error::Corrupted` if the descent runs deeper than the
    /// recorded height.
    pub(super) fn find_leaf(&mut self, key: &Key) -> Result<(NodeId, LeafNode)> {
        let height = self.height();
        let mut current = self.root();

        for _ in 0..height {
            match self.store.read_node(current)? {
                Node::Internal(node) => current = node.children[node.child_index(key)],
                Node::Leaf(leaf) => return Ok((current, leaf)),
            }
        }
        Err(Error::Corrupted(format!(
            "no leaf reached within height {}",
            height
        )))
    }

    /// Read `id`, which must be a leaf.
    pub(super) fn read_leaf(&mut self, id: NodeId) -> Result<LeafNode> {
        match self.store.read_node(id)? {
            Node::Leaf(leaf) => Ok(leaf),
            Node::Internal(_) => Err(Error::Corrupted(format!(
                "{} is linked as a leaf but holds an internal node",
                id
            ))),
        }
    }
}

impl Drop for BPlusTree {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(e) = self.store.flush() {
                warn!(error = %e, "failed to flush tree on drop");
            }
        }
    }
}
