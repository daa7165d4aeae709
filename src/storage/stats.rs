//! Node store I/O statistics.

use std::fmt;

/// Counters tracked by the node store.
///
/// The store is single-threaded, so plain integers suffice. Counters start
/// at zero for every open handle and are not persisted.
#[derive(Debug, Default)]
pub struct IoStats {
    /// Number of node slots read from disk.
    pub nodes_read: u64,

    /// Number of node slots written to disk.
    pub nodes_written: u64,

    /// Number of node slots allocated.
    pub nodes_allocated: u64,

    /// Number of leaf splits performed.
    pub leaf_splits: u64,

    /// Number of internal node splits performed (including root growth).
    pub internal_splits: u64,
}

impl IoStats {
    /// Create a new stats tracker with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a copy of the current counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            nodes_read: self.nodes_read,
            nodes_written: self.nodes_written,
            nodes_allocated: self.nodes_allocated,
            leaf_splits: self.leaf_splits,
            internal_splits: self.internal_splits,
        }
    }

    /// Reset all counters to zero.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// A point-in-time snapshot of node store statistics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub nodes_read: u64,
    pub nodes_written: u64,
    pub nodes_allocated: u64,
    pub leaf_splits: u64,
    pub internal_splits: u64,
}

impl StatsSnapshot {
    /// Counter deltas since an earlier snapshot.
    pub fn since(&self, earlier: &StatsSnapshot) -> StatsSnapshot {
        StatsSnapshot {
            nodes_read: self.nodes_read - earlier.nodes_read,
            nodes_written: self.nodes_written - earlier.nodes_written,
            nodes_allocated: self.nodes_allocated - earlier.nodes_allocated,
            leaf_splits: self.leaf_splits - earlier.leaf_splits,
            internal_splits: self.internal_splits - earlier.internal_splits,
        }
    }
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stats {{ reads: {}, writes: {}, allocated: {}, splits: {}/{} }}",
            self.nodes_read,
            self.nodes_written,
            self.nodes_allocated,
            self.leaf_splits,
            self.internal_splits
        )
    }
}
