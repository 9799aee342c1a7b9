//! NTFS volume engine.
//!
//! This module implements the core functions to browse an NTFS volume:
//! - Reading the BPB
//! - Scanning the MFT and decoding its records
//! - Linking records into a directory tree by parent reference
//! - Reconstructing resident and non-resident file content

pub mod bpb;
pub mod data_run;
pub mod mft;
pub mod ntfs_error;

use std::collections::HashMap;
use std::fmt::Write as FmtWrite;

use log::debug;

use self::bpb::NtfsBpb;
use self::mft::{DataContent, MftRecord};
use self::ntfs_error::NtfsError;
use crate::traits::{FileSystemView, FsError};
use crate::tree::{NodeId, NodeKind, NodeMeta, Tree};
use crate::volume::VolumeHandle;

/// Per-node payload: the record's DATA attribute, kept for content reads.
#[derive(Debug, Clone)]
pub struct NtfsEntry {
    record: u64,
    data: DataContent,
}

/// A parsed NTFS volume with its directory tree built.
pub struct NtfsVolume {
    handle: VolumeHandle,
    bpb: NtfsBpb,
    tree: Tree<NtfsEntry>,
}

impl NtfsVolume {
    /// Opens an NTFS volume: parses the BPB, scans the whole MFT, then
    /// links the records into a tree.
    ///
    /// The build is two-pass and non-recursive. Pass one collects every
    /// decodable record keyed by its slot index; the record named `.` is
    /// the root. Pass two attaches each record under its parent reference;
    /// records whose parent is absent from the map stay detached and
    /// unreachable, which is acceptable for a damaged volume.
    pub fn open(mut handle: VolumeHandle) -> Result<Self, NtfsError> {
        let bpb = NtfsBpb::from(&mut handle)?;
        handle.set_sector_size(*bpb.bytes_per_sec() as usize);

        let records = mft::scan(&mut handle, &bpb)?;

        let root_record = records
            .iter()
            .find(|r| r.is_root())
            .ok_or(NtfsError::MissingRoot)?;
        let mut tree = Tree::new(
            NodeMeta::directory("."),
            NtfsEntry {
                record: *root_record.index(),
                data: DataContent::None,
            },
        );

        let mut by_index: HashMap<u64, NodeId> = HashMap::new();
        by_index.insert(*root_record.index(), tree.root());

        for record in &records {
            if record.is_root() {
                continue;
            }
            if record.is_hidden_or_system() {
                debug!("hiding record {} ({})", record.index(), record.name());
                continue;
            }
            let id = tree.add_detached(node_meta(record), payload(record));
            by_index.insert(*record.index(), id);
        }

        for record in &records {
            if record.is_root() || record.is_hidden_or_system() {
                continue;
            }
            let Some(&node) = by_index.get(record.index()) else {
                continue;
            };
            match record.parent() {
                Some(parent_index) if *parent_index != *record.index() => {
                    if let Some(&parent) = by_index.get(parent_index) {
                        tree.attach(parent, node);
                    } else {
                        debug!(
                            "record {} has a dangling parent reference {}",
                            record.index(),
                            parent_index
                        );
                    }
                }
                _ => {}
            }
        }

        Ok(Self { handle, bpb, tree })
    }

    /// Reconstructs a file's content.
    ///
    /// Resident bytes come straight out of the record. Non-resident
    /// content walks the run list: each run is one contiguous cluster
    /// read, sparse runs expand to zeros, and the concatenation is
    /// truncated to the attribute's real size.
    fn read_record_content(&mut self, node: NodeId) -> Result<Vec<u8>, NtfsError> {
        let entry = self.tree.payload(node).clone();
        debug!("reading content of MFT record {}", entry.record);
        match entry.data {
            DataContent::None => Ok(Vec::new()),
            DataContent::Resident(bytes) => Ok(bytes),
            DataContent::NonResident { runs, size } => {
                let cluster_size =
                    *self.bpb.bytes_per_sec() as usize * *self.bpb.sec_per_clus() as usize;
                let mut data = Vec::new();
                for run in &runs {
                    let run_bytes = run.length as usize * cluster_size;
                    match run.lcn {
                        Some(lcn) => {
                            let sector = lcn * *self.bpb.sec_per_clus() as u64;
                            data.extend_from_slice(&self.handle.read_sectors(
                                sector,
                                run.length as usize * *self.bpb.sec_per_clus() as usize,
                            )?);
                        }
                        None => data.resize(data.len() + run_bytes, 0),
                    }
                }
                data.truncate(size as usize);
                Ok(data)
            }
        }
    }
}

fn node_meta(record: &MftRecord) -> NodeMeta {
    NodeMeta {
        name: record.name().clone(),
        alt_name: None,
        kind: if *record.is_directory() {
            NodeKind::Directory
        } else {
            NodeKind::File
        },
        size: record.size(),
        created: *record.created(),
        modified: *record.modified(),
        accessed: *record.accessed(),
    }
}

fn payload(record: &MftRecord) -> NtfsEntry {
    NtfsEntry {
        record: *record.index(),
        data: record.data().clone(),
    }
}

impl FileSystemView for NtfsVolume {
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
        Ok(self.read_record_content(node)?)
    }

    fn display_info(&self) -> Result<String, std::fmt::Error> {
        let mut out = String::new();
        writeln!(out, "Filesystem: NTFS")?;
        writeln!(
            out,
            "OEM name: {}",
            String::from_utf8_lossy(self.bpb.oem_name()).trim_end()
        )?;
        writeln!(out, "Bytes per sector: {}", self.bpb.bytes_per_sec())?;
        writeln!(out, "Sectors per cluster: {}", self.bpb.sec_per_clus())?;
        writeln!(out, "Sectors per track: {}", self.bpb.sec_per_trk())?;
        writeln!(out, "Total sectors: {}", self.bpb.total_sectors())?;
        writeln!(out, "MFT start sector: {}", self.bpb.mft_start_sector())?;
        Ok(out)
    }
}
