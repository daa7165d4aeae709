//! Disk Manager - low-level file I/O for the tree file.
//!
//! The [`DiskManager`] handles all direct file operations:
//! - Reading and writing the header block
//! - Reading and writing fixed-size node slots
//! - Allocating new slots at the end of the file

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::trace;

use crate::common::config::HEADER_SIZE;
use crate::common::{Error, NodeId, Result};

/// Manages disk I/O for a single tree file.
///
/// # File Layout
/// A header block followed by node slots of one fixed size:
/// ```text
/// ┌──────────┬─────────┬─────────┬─────────┬─────────┐
/// │ Header   │ Slot 0  │ Slot 1  │  ...    │ Slot N  │
/// │ (64 B)   │         │         │         │         │
/// └──────────┴─────────┴─────────┴─────────┴─────────┘
/// Offset: 0   64      64+S      ...     64+N×S
/// ```
///
/// Slot N is located at file offset `HEADER_SIZE + N × slot_size`.
///
/// # Thread Safety
/// `DiskManager` is **single-threaded**; every method takes `&mut self`.
///
/// # Durability
/// Writes go to the OS page cache. Call [`DiskManager::sync`] to `fsync`.
pub struct DiskManager {
    file: File,
    slot_size: usize,
    /// Number of complete slots in the file.
    slot_count: u32,
}

impl DiskManager {
    /// Create a new tree file with a zeroed header block.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be created.
    pub fn create<P: AsRef<Path>>(path: P, slot_size: usize) -> Result<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)?;
        file.write_all(&[0u8; HEADER_SIZE])?;

        Ok(Self {
            file,
            slot_size,
            slot_count: 0,
        })
    }

    /// Open an existing tree file.
    ///
    /// The slot count is derived from the file size; a trailing partial
    /// slot is ignored.
    ///
    /// # Errors
    /// Returns an error if the file doesn't exist, cannot be opened, or is
    /// shorter than the header block.
    pub fn open<P: AsRef<Path>>(path: P, slot_size: usize) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(&path)?;

        let file_size = file.metadata()?.len();
        if file_size < HEADER_SIZE as u64 {
            return Err(Error::Corrupted(format!(
                "file of {} bytes is shorter than the {}-byte header",
                file_size, HEADER_SIZE
            )));
        }
        let slot_count = ((file_size - HEADER_SIZE as u64) / slot_size as u64) as u32;

        Ok(Self {
            file,
            slot_size,
            slot_count,
        })
    }

    /// Read the raw header block.
    pub fn read_header(&mut self) -> Result<[u8; HEADER_SIZE]> {
        let mut data = [0u8; HEADER_SIZE];
        self.file.seek(SeekFrom::Start(0))?;
        self.file.read_exact(&mut data)?;
        Ok(data)
    }

    /// Overwrite the raw header block.
    pub fn write_header(&mut self, data: &[u8; HEADER_SIZE]) -> Result<()> {
        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(data)?;
        Ok(())
    }

    /// Read a slot into `buf`, which must be exactly `slot_size` bytes.
    ///
    /// # Errors
    /// Returns `Error::NodeNotFound` if the slot hasn't been allocated.
    pub fn read_slot(&mut self, id: NodeId, buf: &mut [u8]) -> Result<()> {
        debug_assert_eq!(buf.len(), self.slot_size);
        let offset = self.slot_offset(id)?;
        trace!(node = id.0, offset, "read slot");

        self.file.seek(SeekFrom::Start(offset))?;
        self.file.read_exact(buf)?;
        Ok(())
    }

    /// Write a slot from `buf`, which must be exactly `slot_size` bytes.
    ///
    /// The slot must have been previously allocated with `allocate_slot()`.
    ///
    /// # Errors
    /// Returns `Error::NodeNotFound` if the slot hasn't been allocated.
    pub fn write_slot(&mut self, id: NodeId, buf: &[u8]) -> Result<()> {
        debug_assert_eq!(buf.len(), self.slot_size);
        let offset = self.slot_offset(id)?;
        trace!(node = id.0, offset, "write slot");

        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(buf)?;
        Ok(())
    }

    /// Allocate a new slot at the end of the file.
    ///
    /// Returns the `NodeId` of the newly allocated slot. The slot is
    /// initialized with zeros, which no node kind decodes as valid.
    pub fn allocate_slot(&mut self) -> Result<NodeId> {
        let id = NodeId::new(self.slot_count);
        let offset = HEADER_SIZE as u64 + id.0 as u64 * self.slot_size as u64;

        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(&vec![0u8; self.slot_size])?;

        self.slot_count += 1;
        Ok(id)
    }

    /// Flush file contents and metadata to stable storage.
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    /// Get the number of allocated slots.
    #[inline]
    pub fn slot_count(&self) -> u32 {
        self.slot_count
    }

    /// Get the size of one slot in bytes.
    #[inline]
    pub fn slot_size(&self) -> usize {
        self.slot_size
    }

    /// Get the total size of the file in bytes.
    #[inline]
    pub fn file_size(&self) -> u64 {
        HEADER_SIZE as u64 + self.slot_count as u64 * self.slot_size as u64
    }

    fn slot_offset(&self, id: NodeId) -> Result<u64> {
        if id.0 >= self.slot_count {
            return Err(Error::NodeNotFound(id.0));
        }
        Ok(HEADER_SIZE as u64 + id.0 as u64 * self.slot_size as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SLOT: usize = 128;

    #[test]
    fn test_create_new_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let dm = DiskManager::create(&path, SLOT).unwrap();
        assert_eq!(dm.slot_count(), 0);
        assert_eq!(dm.file_size(), HEADER_SIZE as u64);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), HEADER_SIZE as u64);
    }

    #[test]
    fn test_create_existing_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        DiskManager::create(&path, SLOT).unwrap();
        assert!(DiskManager::create(&path, SLOT).is_err());
    }

    #[test]
    fn test_open_nonexistent_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nonexistent.db");

        assert!(DiskManager::open(&path, SLOT).is_err());
    }

    #[test]
    fn test_open_truncated_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("short.db");
        std::fs::write(&path, [0u8; 10]).unwrap();

        assert!(matches!(
            DiskManager::open(&path, SLOT),
            Err(Error::Corrupted(_))
        ));
    }

    #[test]
    fn test_allocate_and_read_slot() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let mut dm = DiskManager::create(&path, SLOT).unwrap();

        let id = dm.allocate_slot().unwrap();
        assert_eq!(id, NodeId::new(0));
        assert_eq!(dm.slot_count(), 1);

        // Read it back (should be zeros)
        let mut buf = vec![0xFFu8; SLOT];
        dm.read_slot(id, &mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_write_and_read_slot() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let mut dm = DiskManager::create(&path, SLOT).unwrap();
        dm.allocate_slot().unwrap();
        let id = dm.allocate_slot().unwrap();

        let mut buf = vec![0u8; SLOT];
        buf[0] = 0xAB;
        buf[SLOT - 1] = 0xEF;
        dm.write_slot(id, &buf).unwrap();

        let mut read = vec![0u8; SLOT];
        dm.read_slot(id, &mut read).unwrap();
        assert_eq!(read, buf);

        // Neighbouring slot untouched
        dm.read_slot(NodeId::new(0), &mut read).unwrap();
        assert!(read.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_header_roundtrip_does_not_touch_slots() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let mut dm = DiskManager::create(&path, SLOT).unwrap();
        let id = dm.allocate_slot().unwrap();
        dm.write_slot(id, &[0x11u8; SLOT]).unwrap();

        let header = [0x5Au8; HEADER_SIZE];
        dm.write_header(&header).unwrap();
        assert_eq!(dm.read_header().unwrap(), header);

        let mut buf = vec![0u8; SLOT];
        dm.read_slot(id, &mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == 0x11));
    }

    #[test]
    fn test_persistence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        {
            let mut dm = DiskManager::create(&path, SLOT).unwrap();
            let id = dm.allocate_slot().unwrap();
            let mut buf = vec![0u8; SLOT];
            buf[0] = 0x42;
            dm.write_slot(id, &buf).unwrap();
            dm.sync().unwrap();
        }

        {
            let mut dm = DiskManager::open(&path, SLOT).unwrap();
            assert_eq!(dm.slot_count(), 1);

            let mut buf = vec![0u8; SLOT];
            dm.read_slot(NodeId::new(0), &mut buf).unwrap();
            assert_eq!(buf[0], 0x42);
        }
    }

    #[test]
    fn test_read_invalid_slot() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let mut dm = DiskManager::create(&path, SLOT).unwrap();
        dm.allocate_slot().unwrap();

        let mut buf = vec![0u8; SLOT];
        assert!(matches!(
            dm.read_slot(NodeId::new(1), &mut buf),
            Err(Error::NodeNotFound(1))
        ));
        assert!(matches!(
            dm.write_slot(NodeId::new(5), &buf),
            Err(Error::NodeNotFound(5))
        ));
    }
}
