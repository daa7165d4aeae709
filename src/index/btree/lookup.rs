//! Lookup of all values stored under one string.

use tracing::trace;

use crate::common::{Error, Result};

use super::key::Key;
use super::tree::BPlusTree;

impl BPlusTree {
    /// Return every value stored under `text`, sorted ascending.
    ///
    /// An absent string yields an empty vector.
    ///
    /// The descent uses the lowest possible key for `text`, landing on the
    /// leftmost leaf that may hold it. Matches are collected from that leaf,
    /// then from following leaves in the chain; the walk stops at the first
    /// leaf that contributes no match. A leaf emptied by deletions therefore
    /// ends the walk, and values stored past it are not reported.
    ///
    /// # Errors
    /// Returns `Error::KeyTooLong` / `Error::InvalidKey` if `text` could
    /// never be stored.
    pub fn find(&mut self, text: &str) -> Result<Vec<i32>> {
        let probe = Key::lowest(text, self.config().max_key_len)?;
        let (_, mut leaf) = self.find_leaf(&probe)?;

        let mut values: Vec<i32> = leaf
            .keys
            .iter()
            .filter(|k| k.matches(text))
            .map(Key::value)
            .collect();

        let mut hops = 0u32;
        while let Some(next) = leaf.next.valid() {
            hops += 1;
            if hops > self.leaf_count() {
                return Err(Error::Corrupted("leaf chain contains a cycle".to_string()));
            }
            leaf = self.read_leaf(next)?;

            let before = values.len();
            for key in &leaf.keys {
                if key.matches(text) {
                    values.push(key.value());
                } else if values.len() > before {
                    break;
                }
            }
            if values.len() == before {
                break;
            }
        }

        trace!(key = text, matches = values.len(), leaves = hops + 1, "find");
        values.sort_unstable();
        Ok(values)
    }

    /// Whether the exact entry `(text, value)` is stored.
    pub fn contains(&mut self, text: &str, value: i32) -> Result<bool> {
        let key = self.key(text, value)?;
        let (_, leaf) = self.find_leaf(&key)?;
        Ok(leaf.keys.binary_search(&key).is_ok())
    }
}
