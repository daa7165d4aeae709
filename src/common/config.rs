//! Configuration for bplusdb tree files.
//!
//! Format parameters (key width and node fan-out) are chosen when a file is
//! created and stored in its header. They cannot change afterwards: opening
//! a file with a different [`TreeConfig`] fails instead of reinterpreting the
//! bytes.

use crate::common::{Error, Result};

/// Size of the file header block in bytes.
///
/// Node slots start immediately after the header:
/// slot `N` is located at file offset `HEADER_SIZE + N × slot_size`.
pub const HEADER_SIZE: usize = 64;

/// Magic tag at offset 0 of every tree file.
pub const MAGIC: [u8; 4] = *b"BPX1";

/// Default maximum key length in bytes (excluding padding).
pub const DEFAULT_MAX_KEY_LEN: usize = 64;

/// Default leaf capacity `L`. A leaf is split when it reaches `L` entries.
pub const DEFAULT_LEAF_CAPACITY: usize = 85;

/// Default internal fan-out `M`. An internal node holds up to `M` children
/// and is split when it reaches `M - 1` separators.
pub const DEFAULT_INTERNAL_FANOUT: usize = 85;

/// Upper bound for `max_key_len`.
pub const MAX_KEY_LEN_LIMIT: usize = 1024;

/// Upper bound for the encoded size of one node slot (1 MiB).
pub const MAX_SLOT_SIZE: usize = 1 << 20;

/// Parameters of a tree file.
///
/// # Example
/// ```
/// use bplusdb::TreeConfig;
///
/// let config = TreeConfig::default()
///     .with_leaf_capacity(16)
///     .with_internal_fanout(16);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeConfig {
    /// Maximum key length in bytes. Keys are stored NUL-padded to this width.
    pub max_key_len: usize,
    /// Leaf capacity `L`.
    pub leaf_capacity: usize,
    /// Internal fan-out `M`.
    pub internal_fanout: usize,
    /// Call `sync_all` after every node write. Not persisted.
    pub sync_writes: bool,
}

impl TreeConfig {
    /// Create a config with the default parameters.
    pub fn new() -> Self {
        Self {
            max_key_len: DEFAULT_MAX_KEY_LEN,
            leaf_capacity: DEFAULT_LEAF_CAPACITY,
            internal_fanout: DEFAULT_INTERNAL_FANOUT,
            sync_writes: false,
        }
    }

    pub fn with_max_key_len(mut self, max_key_len: usize) -> Self {
        self.max_key_len = max_key_len;
        self
    }

    pub fn with_leaf_capacity(mut self, leaf_capacity: usize) -> Self {
        self.leaf_capacity = leaf_capacity;
        self
    }

    pub fn with_internal_fanout(mut self, internal_fanout: usize) -> Self {
        self.internal_fanout = internal_fanout;
        self
    }

    pub fn with_sync_writes(mut self, sync_writes: bool) -> Self {
        self.sync_writes = sync_writes;
        self
    }

    /// Encoded width of one key: padded string plus an `i32` value.
    #[inline]
    pub fn key_width(&self) -> usize {
        self.max_key_len + 4
    }

    /// Encoded size of a leaf body: count, `L` keys, next handle.
    pub fn leaf_body_size(&self) -> usize {
        4 + self.leaf_capacity * self.key_width() + 4
    }

    /// Encoded size of an internal body: count, `M - 1` keys, `M` children.
    pub fn internal_body_size(&self) -> usize {
        4 + (self.internal_fanout - 1) * self.key_width() + self.internal_fanout * 4
    }

    /// Size of every node slot in the file.
    ///
    /// Slots are uniform so that a handle maps to an offset without knowing
    /// the node kind. The 5-byte prefix holds the kind tag and checksum.
    pub fn slot_size(&self) -> usize {
        5 + self.leaf_body_size().max(self.internal_body_size())
    }

    /// Check that the parameters describe a usable tree.
    ///
    /// # Errors
    /// Returns [`Error::InvalidConfig`] describing the first bad parameter.
    pub fn validate(&self) -> Result<()> {
        if self.max_key_len == 0 || self.max_key_len > MAX_KEY_LEN_LIMIT {
            return Err(Error::InvalidConfig(format!(
                "max_key_len must be in 1..={}, got {}",
                MAX_KEY_LEN_LIMIT, self.max_key_len
            )));
        }
        if self.leaf_capacity < 3 {
            return Err(Error::InvalidConfig(format!(
                "leaf_capacity must be at least 3, got {}",
                self.leaf_capacity
            )));
        }
        if self.internal_fanout < 4 {
            return Err(Error::InvalidConfig(format!(
                "internal_fanout must be at least 4, got {}",
                self.internal_fanout
            )));
        }
        // Bound the products before computing the slot size so that huge
        // capacities cannot overflow.
        let max_entries = MAX_SLOT_SIZE / self.key_width();
        if self.leaf_capacity > max_entries || self.internal_fanout > max_entries {
            return Err(Error::InvalidConfig(format!(
                "node slot would exceed {} bytes",
                MAX_SLOT_SIZE
            )));
        }
        if self.slot_size() > MAX_SLOT_SIZE {
            return Err(Error::InvalidConfig(format!(
                "node slot of {} bytes exceeds {} bytes",
                self.slot_size(),
                MAX_SLOT_SIZE
            )));
        }
        Ok(())
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self::new()
    }
}
