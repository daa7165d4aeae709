//! Storage layer - disk I/O and file header.
//!
//! This module handles persistent storage:
//! - [`DiskManager`] - Low-level file I/O over fixed-size slots
//! - [`FileHeader`] - Tree metadata at the start of the file
//! - [`IoStats`] - Read/write/allocation counters

mod disk_manager;
mod file_header;
mod stats;

pub use disk_manager::DiskManager;
pub use file_header::FileHeader;
pub use stats::{IoStats, StatsSnapshot};
