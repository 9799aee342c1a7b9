//! FAT32 volume engine.
//!
//! This module implements the core functions to browse a FAT32 volume:
//! - Reading and validating the boot sector
//! - Decoding the FAT and following cluster chains
//! - Building the directory tree
//! - Reconstructing file content

pub mod boot_sector;
pub mod dir_entry;
pub mod fat;
pub mod fat_error;

use std::fmt::Write as FmtWrite;

use log::{debug, warn};

use self::boot_sector::BootSector;
use self::dir_entry::{Attributes, DirEntry, decode_entries};
use self::fat::FatTable;
use self::fat_error::FatError;
use crate::traits::{FileSystemView, FsError};
use crate::tree::{NodeId, NodeKind, NodeMeta, Tree};
use crate::volume::VolumeHandle;

/// Per-node payload: what the engine needs to go back to disk for a node.
#[derive(Debug, Clone)]
pub struct Fat32Entry {
    first_cluster: u32,
}

/// A parsed FAT32 volume with its directory tree built.
pub struct Fat32Volume {
    handle: VolumeHandle,
    boot: BootSector,
    fat: FatTable,
    tree: Tree<Fat32Entry>,
}

impl Fat32Volume {
    /// Opens a FAT32 volume: parses the boot sector, decodes the first FAT
    /// copy and builds the whole directory tree.
    ///
    /// # Errors
    /// Geometry failures (`MalformedBootSector`, validation errors, an
    /// unreadable FAT or root chain) abort the open. Failures inside a
    /// subdirectory only prune that subtree.
    pub fn open(mut handle: VolumeHandle, validate: bool) -> Result<Self, FatError> {
        let boot = BootSector::from(&mut handle, validate)?;
        handle.set_sector_size(*boot.bytes_per_sec() as usize);

        let fat_bytes =
            handle.read_sectors(*boot.rsvd_sec_cnt() as u64, *boot.fat_sz_32() as usize)?;
        let fat = FatTable::from_bytes(&fat_bytes);

        let root_cluster = *boot.root_clus();
        let label = boot.label();
        let root_name = if label.is_empty() { "/" } else { label.as_str() };
        let tree = Tree::new(
            NodeMeta::directory(root_name),
            Fat32Entry {
                first_cluster: root_cluster,
            },
        );

        let mut volume = Self {
            handle,
            boot,
            fat,
            tree,
        };
        volume.expand_dir(volume.tree.root(), root_cluster)?;
        Ok(volume)
    }

    /// Reads a whole cluster chain into one contiguous buffer.
    fn read_chain(&mut self, first_cluster: u32) -> Result<Vec<u8>, FatError> {
        let chain = self.fat.cluster_chain(first_cluster)?;
        let mut data = Vec::with_capacity(chain.len() * self.boot.cluster_size());
        for cluster in chain {
            let sector = self.boot.cluster_to_sector(cluster);
            data.extend_from_slice(
                &self
                    .handle
                    .read_sectors(sector as u64, *self.boot.sec_per_clus() as usize)?,
            );
        }
        Ok(data)
    }

    /// Decodes a directory's entries and recurses into its subdirectories.
    ///
    /// Skipped entries, in order: entries pointing back at this directory's
    /// own first cluster (`.`-style self references), `.`/`..`, entries
    /// that are neither directories nor archives (volume labels, device
    /// entries), and hidden entries.
    fn expand_dir(&mut self, node: NodeId, first_cluster: u32) -> Result<(), FatError> {
        let raw = self.read_chain(first_cluster)?;
        let entries = decode_entries(&raw)?;

        for entry in entries {
            if entry.first_cluster() == first_cluster {
                continue;
            }
            let base = entry.base_name();
            if base == "." || base == ".." {
                continue;
            }
            let attrs = entry.attributes();
            if !attrs.intersects(Attributes::DIRECTORY | Attributes::ARCHIVE) {
                continue;
            }
            if attrs.contains(Attributes::HIDDEN) {
                continue;
            }

            let child_cluster = entry.first_cluster();
            let is_dir = entry.is_dir();
            let child = self.tree.add_child(
                node,
                node_meta(&entry),
                Fat32Entry {
                    first_cluster: child_cluster,
                },
            );

            if is_dir {
                // One bad subdirectory must not take the rest of the tree
                // down with it.
                if let Err(err) = self.expand_dir(child, child_cluster) {
                    warn!("skipping subdirectory {}: {err}", self.tree.meta(child).name);
                }
            }
        }

        Ok(())
    }

    /// Reconstructs a file's exact content: the cluster chain is read in
    /// full, then truncated to the declared size (the last cluster is
    /// normally padded beyond the actual content).
    fn read_entry_content(&mut self, node: NodeId) -> Result<Vec<u8>, FatError> {
        let size = self.tree.meta(node).size as usize;
        let first_cluster = self.tree.payload(node).first_cluster;

        if size == 0 || first_cluster < 2 {
            debug!("empty file, no allocated chain");
            return Ok(Vec::new());
        }

        let mut data = self.read_chain(first_cluster)?;
        data.truncate(size);
        Ok(data)
    }
}

fn node_meta(entry: &DirEntry) -> NodeMeta {
    let long = entry.long_name().is_some();
    NodeMeta {
        name: entry.display_name(),
        alt_name: long.then(|| entry.short_name()),
        kind: if entry.is_dir() {
            NodeKind::Directory
        } else {
            NodeKind::File
        },
        size: *entry.file_size() as u64,
        created: Some(entry.created()),
        modified: Some(entry.modified()),
        accessed: Some(entry.accessed()),
    }
}

impl FileSystemView for Fat32Volume {
    fn root(&self) -> NodeId {
        self.tree.root()
    }

    fn children(&self, node: NodeId) -> &[NodeId] {
        self.tree.children(node)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.tree.parent(node)
    }

    fn meta(&self, node: NodeId) -> &NodeMeta {
        self.tree.meta(node)
    }

    fn read_file(&mut self, node: NodeId) -> Result<Vec<u8>, FsError> {
        Ok(self.read_entry_content(node)?)
    }

    fn display_info(&self) -> Result<String, std::fmt::Error> {
        let mut out = String::new();
        writeln!(out, "Filesystem: FAT32")?;
        writeln!(out, "Volume label: {}", self.boot.label())?;
        writeln!(
            out,
            "OEM name: {}",
            String::from_utf8_lossy(self.boot.oem_name()).trim_end()
        )?;
        writeln!(out, "Bytes per sector: {}", self.boot.bytes_per_sec())?;
        writeln!(out, "Sectors per cluster: {}", self.boot.sec_per_clus())?;
        writeln!(out, "Reserved sectors: {}", self.boot.rsvd_sec_cnt())?;
        writeln!(out, "FAT count: {}", self.boot.num_fat())?;
        writeln!(out, "FAT size (sectors): {}", self.boot.fat_sz_32())?;
        writeln!(out, "Total sectors: {}", self.boot.tot_sec_32())?;
        writeln!(out, "Root cluster: {}", self.boot.root_clus())?;
        Ok(out)
    }
}
