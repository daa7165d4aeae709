//! Point deletion without rebalancing.

use tracing::trace;

use crate::common::{Error, Result};

use super::node::Node;
use super::tree::BPlusTree;

impl BPlusTree {
    /// Remove the entry `(text, value)`.
    ///
    /// Only the target leaf is rewritten. Under-full leaves are never merged
    /// and separators are left as they are, so they may name keys that no
    /// longer exist.
    ///
    /// # Errors
    /// - `Error::NotFound` if the exact pair is not stored; nothing is written
    /// - `Error::KeyTooLong` / `Error::InvalidKey` if `text` cannot be stored
    pub fn delete(&mut self, text: &str, value: i32) -> Result<()> {
        let key = self.key(text, value)?;
        let (id, mut leaf) = self.find_leaf(&key)?;

        let Some(pos) = leaf.keys.iter().position(|k| *k == key) else {
            return Err(Error::NotFound {
                key: text.to_owned(),
                value,
            });
        };

        leaf.keys.remove(pos);
        trace!(node = id.0, remaining = leaf.keys.len(), "deleted {}", key);
        self.store.write_node(id, &Node::Leaf(leaf))
    }
}
