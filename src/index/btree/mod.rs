//! On-disk B+ tree index.
//!
//! # Components
//! - [`Key`] - Composite `(string, i32)` key and its fixed-width encoding
//! - [`Node`] - Leaf / internal node types and slot layout
//! - [`NodeStore`] - Slot allocation and node I/O
//! - [`BPlusTree`] - Navigation, insertion, lookup, deletion, integrity check
//!
//! # Shape
//! ```text
//!                  ┌──────────────┐
//!                  │ [m]          │   internal: separators + children
//!                  └──┬────────┬──┘
//!         ┌───────────┘        └───────────┐
//!   ┌─────▼──────┐                   ┌─────▼──────┐
//!   │ a1 b4 f2   │ ────── next ────▶ │ m3 m7 q1   │   leaves: entries
//!   └────────────┘                   └────────────┘
//! ```

mod check;
mod delete;
mod insert;
mod key;
mod lookup;
mod node;
mod store;
mod tree;

pub use check::TreeShape;
pub use key::Key;
pub use node::{InternalNode, LeafNode, Node, NodeKind};
pub use store::NodeStore;
pub use tree::BPlusTree;
