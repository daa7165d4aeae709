//! Node handle type.

use std::fmt;

/// Identifies a node slot in the tree file.
///
/// Handles are logical arena indices handed out by an append-only
/// allocator: slot `N` lives at a fixed offset computed from `N` and the
/// slot size. A handle is never reused, even when the node it names has
/// been emptied by deletions.
///
/// # Example
/// ```
/// use bplusdb::NodeId;
///
/// let id = NodeId::new(42);
/// assert!(id.is_valid());
/// assert_eq!(id.0, 42);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Invalid/sentinel handle.
    ///
    /// Marks the end of the leaf chain and unused child slots.
    pub const INVALID: NodeId = NodeId(u32::MAX);

    /// Create a new NodeId.
    #[inline]
    pub fn new(id: u32) -> Self {
        NodeId(id)
    }

    /// Check if this handle is valid (not the sentinel value).
    #[inline]
    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }

    /// Convert to `Some(self)` unless this is the sentinel.
    #[inline]
    pub fn valid(self) -> Option<NodeId> {
        self.is_valid().then_some(self)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "Node(INVALID)")
        } else {
            write!(f, "Node({})", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_new() {
        let id = NodeId::new(42);
        assert_eq!(id.0, 42);
        assert!(id.is_valid());
        assert_eq!(id.valid(), Some(id));
    }

    #[test]
    fn test_node_id_invalid() {
        assert!(!NodeId::INVALID.is_valid());
        assert_eq!(NodeId::INVALID.0, u32::MAX);
        assert_eq!(NodeId::INVALID.valid(), None);
    }

    #[test]
    fn test_node_id_display() {
        assert_eq!(format!("{}", NodeId::new(7)), "Node(7)");
        assert_eq!(format!("{}", NodeId::INVALID), "Node(INVALID)");
    }
}
