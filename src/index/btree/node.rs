//! Node types and slot layout.
//!
//! Every node slot starts with a 5-byte prefix:
//! - [`NodeKind`] discriminator
//! - CRC32 checksum over the rest of the slot
//!
//! The kind tag alone decides how the body is decoded; a node's position in
//! the file says nothing about its kind.

use crate::common::{Error, NodeId, Result, TreeConfig};

use super::key::Key;

/// Kind of node stored in a slot.
///
/// Uses `#[repr(u8)]` to guarantee a 1-byte representation for serialization.
#[repr(u8)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Unwritten (zeroed) or corrupted slot.
    #[default]
    Invalid = 0,
    /// Branch node holding separators and child handles.
    Internal = 1,
    /// Terminal node holding entries and the next-leaf link.
    Leaf = 2,
}

impl NodeKind {
    /// Convert from u8, returning Invalid for unknown values.
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => NodeKind::Internal,
            2 => NodeKind::Leaf,
            _ => NodeKind::Invalid,
        }
    }
}

/// A leaf: sorted entries plus a link to the next leaf in key order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafNode {
    pub keys: Vec<Key>,
    /// Next leaf in ascending key order, or `NodeId::INVALID`.
    pub next: NodeId,
}

impl LeafNode {
    pub fn new() -> Self {
        Self {
            keys: Vec::new(),
            next: NodeId::INVALID,
        }
    }
}

impl Default for LeafNode {
    fn default() -> Self {
        Self::new()
    }
}

/// An internal node: `keys.len()` separators and `keys.len() + 1` children.
///
/// Child `i` holds keys `k` with `keys[i-1] <= k < keys[i]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternalNode {
    pub keys: Vec<Key>,
    pub children: Vec<NodeId>,
}

impl InternalNode {
    /// Index of the child to descend into for `key`: the first `i` with
    /// `key < keys[i]`, or the last child when no separator is greater.
    pub fn child_index(&self, key: &Key) -> usize {
        self.keys.partition_point(|sep| sep <= key)
    }
}

/// A decoded node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Leaf(LeafNode),
    Internal(InternalNode),
}

impl Node {
    pub const OFFSET_KIND: usize = 0;
    pub const OFFSET_CHECKSUM: usize = 1;
    pub const OFFSET_BODY: usize = 5;

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Leaf(_) => NodeKind::Leaf,
            Node::Internal(_) => NodeKind::Internal,
        }
    }

    /// Encode this node into a full slot buffer (`config.slot_size()` bytes).
    ///
    /// # Errors
    /// Returns `Error::Corrupted` if the node is over capacity: an
    /// overflowing node must be split before it reaches disk.
    pub fn encode(&self, config: &TreeConfig, buf: &mut [u8]) -> Result<()> {
        debug_assert_eq!(buf.len(), config.slot_size());
        buf.fill(0);
        buf[Self::OFFSET_KIND] = self.kind() as u8;

        let width = config.key_width();
        let body = &mut buf[Self::OFFSET_BODY..];
        match self {
            Node::Leaf(leaf) => {
                if leaf.keys.len() >= config.leaf_capacity {
                    return Err(Error::Corrupted(format!(
                        "leaf with {} entries must be split before writing",
                        leaf.keys.len()
                    )));
                }
                write_u32(body, 0, leaf.keys.len() as u32);
                for (i, key) in leaf.keys.iter().enumerate() {
                    let at = 4 + i * width;
                    key.encode(&mut body[at..at + width], config.max_key_len);
                }
                let next_at = 4 + config.leaf_capacity * width;
                write_u32(body, next_at, leaf.next.0);
            }
            Node::Internal(node) => {
                let max_keys = config.internal_fanout - 1;
                if node.keys.len() >= max_keys {
                    return Err(Error::Corrupted(format!(
                        "internal node with {} separators must be split before writing",
                        node.keys.len()
                    )));
                }
                if node.children.len() != node.keys.len() + 1 {
                    return Err(Error::Corrupted(format!(
                        "internal node has {} separators but {} children",
                        node.keys.len(),
                        node.children.len()
                    )));
                }
                write_u32(body, 0, node.keys.len() as u32);
                for (i, key) in node.keys.iter().enumerate() {
                    let at = 4 + i * width;
                    key.encode(&mut body[at..at + width], config.max_key_len);
                }
                let children_at = 4 + max_keys * width;
                for i in 0..config.internal_fanout {
                    let child = node.children.get(i).copied().unwrap_or(NodeId::INVALID);
                    write_u32(body, children_at + i * 4, child.0);
                }
            }
        }

        let checksum = compute_checksum(buf);
        write_u32(buf, Self::OFFSET_CHECKSUM, checksum);
        Ok(())
    }

    /// Decode a node from a full slot buffer.
    ///
    /// # Errors
    /// Returns `Error::Corrupted` on an unknown kind tag, checksum mismatch,
    /// or counts that exceed the configured capacities.
    pub fn decode(config: &TreeConfig, buf: &[u8]) -> Result<Self> {
        debug_assert_eq!(buf.len(), config.slot_size());
        let kind = NodeKind::from_u8(buf[Self::OFFSET_KIND]);
        if kind == NodeKind::Invalid {
            return Err(Error::Corrupted(format!(
                "invalid node kind {}",
                buf[Self::OFFSET_KIND]
            )));
        }

        let stored = read_u32(buf, Self::OFFSET_CHECKSUM);
        let computed = compute_checksum(buf);
        if stored != computed {
            return Err(Error::Corrupted(format!(
                "node checksum mismatch: stored {:#010x}, computed {:#010x}",
                stored, computed
            )));
        }

        let width = config.key_width();
        let body = &buf[Self::OFFSET_BODY..];
        let count = read_u32(body, 0) as usize;
        let decode_keys = |n: usize| -> Result<Vec<Key>> {
            (0..n)
                .map(|i| {
                    let at = 4 + i * width;
                    Key::decode(&body[at..at + width], config.max_key_len)
                })
                .collect()
        };

        match kind {
            NodeKind::Leaf => {
                if count >= config.leaf_capacity {
                    return Err(Error::Corrupted(format!(
                        "leaf count {} exceeds capacity",
                        count
                    )));
                }
                let keys = decode_keys(count)?;
                let next = NodeId::new(read_u32(body, 4 + config.leaf_capacity * width));
                Ok(Node::Leaf(LeafNode { keys, next }))
            }
            NodeKind::Internal => {
                let max_keys = config.internal_fanout - 1;
                if count >= max_keys {
                    return Err(Error::Corrupted(format!(
                        "internal count {} exceeds capacity",
                        count
                    )));
                }
                let keys = decode_keys(count)?;
                let children_at = 4 + max_keys * width;
                let children = (0..=count)
                    .map(|i| NodeId::new(read_u32(body, children_at + i * 4)))
                    .collect::<Vec<_>>();
                if children.iter().any(|c| !c.is_valid()) {
                    return Err(Error::Corrupted(
                        "internal node has an invalid child handle".to_string(),
                    ));
                }
                Ok(Node::Internal(InternalNode { keys, children }))
            }
            NodeKind::Invalid => Err(Error::Corrupted("invalid node kind".to_string())),
        }
    }
}

/// CRC32 of a slot with the checksum field treated as zero.
fn compute_checksum(buf: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&buf[..Node::OFFSET_CHECKSUM]);
    hasher.update(&[0u8; 4]);
    hasher.update(&buf[Node::OFFSET_BODY..]);
    hasher.finalize()
}

fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}

fn write_u32(data: &mut [u8], offset: usize, value: u32) {
    data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

// ============================================================================
// TESTS
// ============================================================================
