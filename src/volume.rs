//! Raw volume access.
//!
//! Every on-disk structure in this crate is reached through [`VolumeHandle`]:
//! a capability object wrapping a seekable byte source plus the volume's
//! sector size. Each read is an explicit offset+length request, so no two
//! components ever share an implicit cursor position.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

/// Sector size assumed until the boot sector has been parsed.
pub const DEFAULT_SECTOR_SIZE: usize = 512;

/// Anything seekable and readable can back a volume: a raw block device, a
/// disk image file, or an in-memory buffer in tests.
pub trait ByteSource: Read + Seek {}
impl<T: Read + Seek> ByteSource for T {}

/// A read-only handle on a raw volume.
pub struct VolumeHandle {
    source: Box<dyn ByteSource>,
    sector_size: usize,
}

impl VolumeHandle {
    /// Wraps a byte source with an explicit sector size.
    pub fn new(source: Box<dyn ByteSource>, sector_size: usize) -> Self {
        Self {
            source,
            sector_size,
        }
    }

    /// Opens a disk image or raw device node read-only, assuming
    /// [`DEFAULT_SECTOR_SIZE`] until the boot sector says otherwise.
    pub fn from_file(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self::new(Box::new(file), DEFAULT_SECTOR_SIZE))
    }

    /// The sector size all sector-indexed reads use.
    pub fn sector_size(&self) -> usize {
        self.sector_size
    }

    /// Updates the sector size once the boot sector has been decoded.
    pub fn set_sector_size(&mut self, sector_size: usize) {
        self.sector_size = sector_size;
    }

    /// Reads `len` bytes starting at the absolute byte `offset`.
    pub fn read_at(&mut self, offset: u64, len: usize) -> io::Result<Vec<u8>> {
        let mut buf = vec![0; len];
        self.source.seek(SeekFrom::Start(offset))?;
        self.source.read_exact(&mut buf).map_err(|err| {
            io::Error::new(
                err.kind(),
                format!("Failed to read {len} bytes at offset {offset}: {err}"),
            )
        })?;
        Ok(buf)
    }

    /// Reads one sector.
    pub fn read_sector(&mut self, sector: u64) -> io::Result<Vec<u8>> {
        self.read_sectors(sector, 1)
    }

    /// Reads `count` consecutive sectors.
    pub fn read_sectors(&mut self, sector: u64, count: usize) -> io::Result<Vec<u8>> {
        self.read_at(
            sector * self.sector_size as u64,
            count * self.sector_size,
        )
    }
}
