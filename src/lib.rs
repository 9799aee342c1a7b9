//!
//! fs_browser: A library and CLI for browsing FAT32 and NTFS volumes at the
//! raw device level.
//!
//! This crate provides tools for:
//! - Parsing FAT32 boot sectors, FAT tables and directory entries
//! - Scanning the NTFS Master File Table and decoding its attributes
//! - Reconstructing the directory hierarchy of a volume
//! - Navigating the tree and extracting exact file content
//!
//! Both engines expose the same read-only [`FileSystemView`] interface, so
//! navigation and presentation code never cares which filesystem is
//! underneath.
//!
//! # Re-exports
//! - [`Fat32Volume`]: FAT32 engine (see [`fat32::Fat32Volume`])
//! - [`NtfsVolume`]: NTFS engine (see [`ntfs::NtfsVolume`])
//! - [`VolumeHandle`]: raw volume access capability (see [`volume::VolumeHandle`])
//! - [`Navigator`]: path resolution and the current-directory cursor

pub mod commands;
pub mod fat32;
pub mod navigator;
pub mod ntfs;
pub mod traits;
pub mod tree;
pub mod utils;
pub mod volume;

pub use crate::fat32::Fat32Volume;
pub use crate::navigator::{NavError, Navigator, Resolved};
pub use crate::ntfs::NtfsVolume;
pub use crate::traits::{FileSystemView, FsError};
pub use crate::tree::{NodeId, NodeKind, NodeMeta};
pub use crate::volume::VolumeHandle;
