//! Node store - typed node access on top of the [`DiskManager`].
//!
//! The store owns the file, the in-memory copy of the header and a scratch
//! slot buffer. It never caches nodes: every `read_node` goes to disk.

use std::path::Path;

use tracing::{debug, trace};

use crate::common::{Error, NodeId, Result, TreeConfig};
use crate::storage::{DiskManager, FileHeader, IoStats};

use super::node::{LeafNode, Node};

/// Translates node handles into slot reads and writes.
pub struct NodeStore {
    disk: DiskManager,
    config: TreeConfig,
    header: FileHeader,
    stats: IoStats,
    /// Scratch buffer of exactly one slot.
    buf: Vec<u8>,
}

impl NodeStore {
    /// Create a new tree file containing one empty root leaf.
    ///
    /// # Errors
    /// Returns an error if the config is invalid or the file already exists.
    pub fn create<P: AsRef<Path>>(path: P, config: TreeConfig) -> Result<Self> {
        config.validate()?;
        let disk = DiskManager::create(&path, config.slot_size())?;

        let mut store = Self {
            disk,
            config,
            header: FileHeader::new(&config),
            stats: IoStats::new(),
            buf: vec![0u8; config.slot_size()],
        };

        let root = store.alloc_leaf()?;
        store.write_node(root, &Node::Leaf(LeafNode::new()))?;
        store.header.root = root;
        store.flush()?;

        debug!(path = %path.as_ref().display(), slot_size = config.slot_size(), "created tree file");
        Ok(store)
    }

    /// Open an existing tree file.
    ///
    /// # Errors
    /// - `Error::ConfigMismatch` if the file was created with other parameters
    /// - `Error::Corrupted` if the header is damaged or inconsistent
    pub fn open<P: AsRef<Path>>(path: P, config: TreeConfig) -> Result<Self> {
        config.validate()?;
        let mut disk = DiskManager::open(&path, config.slot_size())?;

        let header = FileHeader::from_bytes(&disk.read_header()?)?;
        header.check_config(&config)?;

        if header.node_count() > disk.slot_count() {
            return Err(Error::Corrupted(format!(
                "header records {} nodes but file holds {} slots",
                header.node_count(),
                disk.slot_count()
            )));
        }
        if header.root.0 >= disk.slot_count() {
            return Err(Error::Corrupted(format!(
                "root {} is outside the file",
                header.root
            )));
        }
        if header.height == 0 || header.is_leaf_root != (header.height == 1) {
            return Err(Error::Corrupted(format!(
                "height {} disagrees with is_leaf_root {}",
                header.height, header.is_leaf_root
            )));
        }

        debug!(
            path = %path.as_ref().display(),
            root = header.root.0,
            height = header.height,
            nodes = header.node_count(),
            "opened tree file"
        );
        Ok(Self {
            disk,
            config,
            header,
            stats: IoStats::new(),
            buf: vec![0u8; config.slot_size()],
        })
    }

    /// Allocate a slot for a new leaf.
    pub fn alloc_leaf(&mut self) -> Result<NodeId> {
        let id = self.allocate()?;
        self.header.leaf_count += 1;
        Ok(id)
    }

    /// Allocate a slot for a new internal node.
    pub fn alloc_internal(&mut self) -> Result<NodeId> {
        let id = self.allocate()?;
        self.header.internal_count += 1;
        Ok(id)
    }

    fn allocate(&mut self) -> Result<NodeId> {
        let id = self.disk.allocate_slot()?;
        self.stats.nodes_allocated += 1;
        trace!(node = id.0, "allocated slot");
        Ok(id)
    }

    /// Read and decode the node at `id`.
    pub fn read_node(&mut self, id: NodeId) -> Result<Node> {
        self.disk.read_slot(id, &mut self.buf)?;
        self.stats.nodes_read += 1;
        Node::decode(&self.config, &self.buf)
    }

    /// Encode and write `node` to the slot at `id`.
    pub fn write_node(&mut self, id: NodeId, node: &Node) -> Result<()> {
        node.encode(&self.config, &mut self.buf)?;
        self.disk.write_slot(id, &self.buf)?;
        self.stats.nodes_written += 1;
        if self.config.sync_writes {
            self.disk.sync()?;
        }
        Ok(())
    }

    /// Install a new root and persist the header.
    pub fn set_root(&mut self, root: NodeId, height: u32) -> Result<()> {
        self.header.root = root;
        self.header.height = height;
        self.header.is_leaf_root = height == 1;
        self.write_header()
    }

    /// Persist the in-memory header.
    pub fn write_header(&mut self) -> Result<()> {
        self.disk.write_header(&self.header.to_bytes())
    }

    /// Persist the header and `fsync` the file.
    pub fn flush(&mut self) -> Result<()> {
        self.write_header()?;
        self.disk.sync()
    }

    #[inline]
    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    #[inline]
    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    #[inline]
    pub fn stats(&self) -> &IoStats {
        &self.stats
    }

    #[inline]
    pub fn stats_mut(&mut self) -> &mut IoStats {
        &mut self.stats
    }

    #[inline]
    pub fn file_size(&self) -> u64 {
        self.disk.file_size()
    }
}
