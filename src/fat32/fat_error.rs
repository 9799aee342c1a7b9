//! Error types for the FAT32 engine.
//!
//! Geometry errors abort the volume open; per-entry errors are isolated to
//! the directory being expanded and never take down the whole tree.

use std::io;
use thiserror::Error;

/// Errors raised while parsing and traversing a FAT32 volume.
#[derive(Error, Debug)]
pub enum FatError {
    /// The first sector could not be read in full, so there is no geometry
    /// to work with.
    #[error("Malformed boot sector: {0}")]
    MalformedBootSector(String),

    /// The first three bytes of a FAT volume must contain a valid x86 jump
    /// instruction.
    #[error("Invalid jump instruction `{0}`")]
    InvalidJmp(String),

    /// Bytes per sector must be 512, 1024, 2048 or 4096.
    #[error("Invalid count of bytes per sector: `{0}`. Legal values: 512, 1024, 2048 or 4096")]
    InvalidBytesPerSec(u16),

    /// Sectors per cluster must be a power of 2 up to 128.
    #[error(
        "Invalid number of sectors per cluster: `{0}`. Legal values: 1, 2, 4, 8, 16, 32, 64, 128"
    )]
    InvalidSecPerClus(u8),

    /// The boot sector signature must be 0x55AA.
    #[error("Invalid boot sector signature: `{0}`. Expected signature: 0x55AA")]
    InvalidSignature(String),

    /// Clusters 0 and 1 are reserved; the root directory starts at 2 or
    /// above.
    #[error("Invalid cluster number of the root directory: `{0}`. Expected a value >= 2.")]
    InvalidRootClus(u32),

    /// A chain was asked to start from, or stepped onto, a cluster number
    /// outside the table.
    #[error("Invalid cluster number: `{0}`")]
    InvalidCluster(u32),

    /// A chain grew past the table size, which only a corrupt (looping)
    /// table can produce.
    #[error("Cluster chain starting at `{0}` exceeds the FAT size")]
    CorruptClusterChain(u32),

    /// Underlying I/O errors while reading the volume.
    #[error("IO Error: `{0}`")]
    IOError(#[from] io::Error),

    /// Parsing error during structure decoding.
    #[error("BinRead Error: `{0}`")]
    BinReadError(#[from] binread::Error),
}
