//! Index structures.
//!
//! - [`btree`] - Persistent B+ tree over `(string, i32)` entries

pub mod btree;

pub use btree::{BPlusTree, TreeShape};
