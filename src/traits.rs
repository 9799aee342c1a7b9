//! The capability interface both filesystem engines implement.
//!
//! Navigation and the CLI depend only on [`FileSystemView`]; whether the
//! tree underneath came from a FAT32 cluster walk or an NTFS MFT scan is
//! invisible above this line.

use std::fmt;
use std::io;

use thiserror::Error;

use crate::fat32::fat_error::FatError;
use crate::ntfs::ntfs_error::NtfsError;
use crate::tree::{NodeId, NodeMeta};

/// Errors surfaced through the engine-independent view.
#[derive(Error, Debug)]
pub enum FsError {
    #[error("FAT32 error: `{0}`")]
    Fat(#[from] FatError),

    #[error("NTFS error: `{0}`")]
    Ntfs(#[from] NtfsError),

    #[error("IO Error: `{0}`")]
    Io(#[from] io::Error),
}

/// Read-only browse surface over a parsed volume.
///
/// The tree is built once when the volume is opened; all methods except
/// [`FileSystemView::read_file`] are pure queries over it. `read_file`
/// takes `&mut self` because reconstructing non-resident content goes back
/// to the volume handle.
pub trait FileSystemView {
    /// The synthetic node representing the volume itself.
    fn root(&self) -> NodeId;

    /// Direct children of a directory node, in on-disk order.
    fn children(&self, node: NodeId) -> &[NodeId];

    /// Parent edge, `None` for the root and for unreachable nodes.
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    fn meta(&self, node: NodeId) -> &NodeMeta;

    /// Reconstructs the exact byte content of a file node.
    fn read_file(&mut self, node: NodeId) -> Result<Vec<u8>, FsError>;

    /// Volume geometry summary for the `info` command.
    fn display_info(&self) -> Result<String, fmt::Error>;
}
