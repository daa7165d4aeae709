//! bplusdb - A persistent string-to-integer index backed by an on-disk B+ tree.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                            bplusdb                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              Index Layer (index/btree/)                  │   │
//! │  │   BPlusTree: navigate → insert / find / delete / check  │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │              Node Store (index/btree/store)              │   │
//! │  │    Key + Node codecs, append-only slot allocation        │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                              ↓                                  │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │           Storage Layer (storage/)                       │   │
//! │  │        DiskManager + FileHeader + IoStats                │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (NodeId, Error, TreeConfig)
//! - [`storage`] - File I/O and header format
//! - [`index`] - The B+ tree
//!
//! # Quick Start
//! ```no_run
//! use bplusdb::{BPlusTree, TreeConfig};
//!
//! let mut tree = BPlusTree::open_or_create("my_index.db", TreeConfig::default()).unwrap();
//!
//! tree.insert("abc", 5).unwrap();
//! tree.insert("abc", 2).unwrap();
//! assert_eq!(tree.find("abc").unwrap(), vec![2, 5]);
//!
//! tree.delete("abc", 5).unwrap();
//! assert_eq!(tree.find("abc").unwrap(), vec![2]);
//! ```

pub mod common;
pub mod index;
pub mod storage;

// Re-export commonly used items at crate root for convenience
pub use common::config::HEADER_SIZE;
pub use common::{Error, NodeId, Result, TreeConfig};

pub use index::btree::Key;
pub use index::{BPlusTree, TreeShape};
pub use storage::StatsSnapshot;
