//! Tree file header.
//!
//! The first [`HEADER_SIZE`] bytes of every tree file hold a [`FileHeader`]:
//! - the format parameters the file was created with
//! - the root handle, tree height and allocation counters
//! - a CRC32 checksum over the header block

use crate::common::config::{HEADER_SIZE, MAGIC};
use crate::common::{Error, NodeId, Result, TreeConfig};

/// Metadata stored at the beginning of the tree file.
///
/// # Layout (64 bytes, little-endian)
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       4     magic ("BPX1")
/// 4       4     max_key_len
/// 8       4     leaf_capacity (L)
/// 12      4     internal_fanout (M)
/// 16      4     root (NodeId)
/// 20      4     leaf_count
/// 24      4     internal_count
/// 28      4     height
/// 32      1     is_leaf_root
/// 36      4     checksum (CRC32)
/// 40      24    reserved (zero)
/// ```
///
/// # Checksum
/// The checksum is computed over the whole header block with the checksum
/// field itself set to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    pub max_key_len: u32,
    pub leaf_capacity: u32,
    pub internal_fanout: u32,
    /// Handle of the root node.
    pub root: NodeId,
    /// Number of leaf slots ever allocated.
    pub leaf_count: u32,
    /// Number of internal slots ever allocated.
    pub internal_count: u32,
    /// Number of levels; 1 when the root is a leaf.
    pub height: u32,
    pub is_leaf_root: bool,
}

impl FileHeader {
    pub const OFFSET_MAGIC: usize = 0;
    pub const OFFSET_MAX_KEY_LEN: usize = 4;
    pub const OFFSET_LEAF_CAPACITY: usize = 8;
    pub const OFFSET_INTERNAL_FANOUT: usize = 12;
    pub const OFFSET_ROOT: usize = 16;
    pub const OFFSET_LEAF_COUNT: usize = 20;
    pub const OFFSET_INTERNAL_COUNT: usize = 24;
    pub const OFFSET_HEIGHT: usize = 28;
    pub const OFFSET_IS_LEAF_ROOT: usize = 32;
    pub const OFFSET_CHECKSUM: usize = 36;

    /// Header for a fresh file: no slots allocated yet, empty root pending.
    pub fn new(config: &TreeConfig) -> Self {
        Self {
            max_key_len: config.max_key_len as u32,
            leaf_capacity: config.leaf_capacity as u32,
            internal_fanout: config.internal_fanout as u32,
            root: NodeId::INVALID,
            leaf_count: 0,
            internal_count: 0,
            height: 1,
            is_leaf_root: true,
        }
    }

    /// Total number of slots allocated so far.
    #[inline]
    pub fn node_count(&self) -> u32 {
        self.leaf_count + self.internal_count
    }

    /// Decode and verify a header block.
    ///
    /// # Errors
    /// Returns `Error::Corrupted` on a bad magic tag or checksum mismatch.
    pub fn from_bytes(data: &[u8; HEADER_SIZE]) -> Result<Self> {
        if data[Self::OFFSET_MAGIC..Self::OFFSET_MAGIC + 4] != MAGIC {
            return Err(Error::Corrupted(format!(
                "bad magic {:?}",
                &data[Self::OFFSET_MAGIC..Self::OFFSET_MAGIC + 4]
            )));
        }

        let stored = read_u32(data, Self::OFFSET_CHECKSUM);
        let computed = Self::compute_checksum(data);
        if stored != computed {
            return Err(Error::Corrupted(format!(
                "header checksum mismatch: stored {:#010x}, computed {:#010x}",
                stored, computed
            )));
        }

        Ok(Self {
            max_key_len: read_u32(data, Self::OFFSET_MAX_KEY_LEN),
            leaf_capacity: read_u32(data, Self::OFFSET_LEAF_CAPACITY),
            internal_fanout: read_u32(data, Self::OFFSET_INTERNAL_FANOUT),
            root: NodeId::new(read_u32(data, Self::OFFSET_ROOT)),
            leaf_count: read_u32(data, Self::OFFSET_LEAF_COUNT),
            internal_count: read_u32(data, Self::OFFSET_INTERNAL_COUNT),
            height: read_u32(data, Self::OFFSET_HEIGHT),
            is_leaf_root: data[Self::OFFSET_IS_LEAF_ROOT] != 0,
        })
    }

    /// Encode this header, including a fresh checksum.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut data = [0u8; HEADER_SIZE];
        data[Self::OFFSET_MAGIC..Self::OFFSET_MAGIC + 4].copy_from_slice(&MAGIC);
        write_u32(&mut data, Self::OFFSET_MAX_KEY_LEN, self.max_key_len);
        write_u32(&mut data, Self::OFFSET_LEAF_CAPACITY, self.leaf_capacity);
        write_u32(&mut data, Self::OFFSET_INTERNAL_FANOUT, self.internal_fanout);
        write_u32(&mut data, Self::OFFSET_ROOT, self.root.0);
        write_u32(&mut data, Self::OFFSET_LEAF_COUNT, self.leaf_count);
        write_u32(&mut data, Self::OFFSET_INTERNAL_COUNT, self.internal_count);
        write_u32(&mut data, Self::OFFSET_HEIGHT, self.height);
        data[Self::OFFSET_IS_LEAF_ROOT] = u8::from(self.is_leaf_root);

        let checksum = Self::compute_checksum(&data);
        write_u32(&mut data, Self::OFFSET_CHECKSUM, checksum);
        data
    }

    /// Compute the CRC32 of a header block, skipping the checksum field.
    pub fn compute_checksum(data: &[u8; HEADER_SIZE]) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&data[..Self::OFFSET_CHECKSUM]);
        hasher.update(&[0u8; 4]);
        hasher.update(&data[Self::OFFSET_CHECKSUM + 4..]);
        hasher.finalize()
    }

    /// Compare the stored format parameters against a requested config.
    ///
    /// # Errors
    /// Returns `Error::ConfigMismatch` naming the first differing field.
    pub fn check_config(&self, config: &TreeConfig) -> Result<()> {
        let fields = [
            ("max_key_len", self.max_key_len, config.max_key_len),
            ("leaf_capacity", self.leaf_capacity, config.leaf_capacity),
            ("internal_fanout", self.internal_fanout, config.internal_fanout),
        ];
        for (field, stored, requested) in fields {
            if stored as usize != requested {
                return Err(Error::ConfigMismatch {
                    field,
                    stored,
                    requested: u32::try_from(requested).unwrap_or(u32::MAX),
                });
            }
        }
        Ok(())
    }
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
