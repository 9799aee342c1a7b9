//! NTFS boot sector parsing.
//!
//! NTFS reuses the BIOS Parameter Block layout of the FAT family for its
//! first sector; the fields this engine needs stop at offset 0x40, where
//! the MFT mirror cluster ends.

use binread::{BinRead, BinReaderExt};
use getset::Getters;
use std::fmt;
use std::io;

use super::ntfs_error::NtfsError;
use crate::volume::VolumeHandle;

/// NTFS BIOS Parameter Block.
#[derive(BinRead, Debug, Getters)]
#[br(little)]
pub struct NtfsBpb {
    /// Jump instruction to boot code
    jmp: [u8; 3],
    /// OEM identifier ("NTFS    ")
    #[get = "pub"]
    oem_name: [u8; 8],
    /// Number of bytes per sector
    #[get = "pub"]
    bytes_per_sec: u16,
    /// Number of sectors per cluster
    #[get = "pub"]
    sec_per_clus: u8,
    /// Reserved sectors (unused by NTFS, 0)
    rsvd_sec_cnt: u16,
    /// FAT-era fields, all zero on NTFS
    zeroed: [u8; 5],
    /// Media descriptor (0xF8 for fixed disk)
    media: u8,
    /// Sectors per FAT, zero on NTFS
    fat_sz_16: u16,
    /// Sectors per track
    #[get = "pub"]
    sec_per_trk: u16,
    /// Number of heads
    num_heads: u16,
    /// Number of hidden sectors preceding the partition
    hidd_sec: u32,
    /// FAT-era 32-bit total, zero on NTFS
    tot_sec_32: u32,
    /// Reserved
    reserved: u32,
    /// Total sectors on the volume
    #[get = "pub"]
    total_sectors: u64,
    /// First cluster of the Master File Table
    #[get = "pub"]
    mft_start_cluster: u64,
    /// First cluster of the MFT mirror
    #[get = "pub"]
    mft_mirror_cluster: u64,
}

impl NtfsBpb {
    /// Reads the BPB from the volume's first sector.
    ///
    /// # Errors
    /// - `NtfsError::MalformedBootSector` if a full sector cannot be read
    pub fn from(handle: &mut VolumeHandle) -> Result<NtfsBpb, NtfsError> {
        let buf = handle
            .read_sector(0)
            .map_err(|err| NtfsError::MalformedBootSector(err.to_string()))?;

        let mut reader = io::Cursor::new(buf);
        let bpb: NtfsBpb = reader.read_le()?;
        Ok(bpb)
    }

    /// Sector number where the MFT begins. Cached derivation of
    /// `mft_start_cluster * sectors_per_cluster`; the single place the
    /// formula lives.
    pub fn mft_start_sector(&self) -> u64 {
        self.mft_start_cluster * self.sec_per_clus as u64
    }
}

/// Field-by-field dump with on-disk offsets, for inspection.
impl fmt::Display for NtfsBpb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut offset = 0;

        macro_rules! field {
            ($name:expr, $val:expr, $size:expr) => {{
                writeln!(f, "  {:<18} 0x{:>04X}: {}", $name, offset, $val)?;
                offset += $size;
            }};
        }

        writeln!(f, "NTFS boot sector:")?;
        field!("jmp", format!("{:02X?}", self.jmp), 3);
        field!("oem_name", String::from_utf8_lossy(&self.oem_name), 8);
        field!("bytes_per_sec", self.bytes_per_sec, 2);
        field!("sec_per_clus", self.sec_per_clus, 1);
        field!("rsvd_sec_cnt", self.rsvd_sec_cnt, 2);
        field!("zeroed", format!("{:02X?}", &self.zeroed[..]), 5);
        field!("media", format!("0x{:X}", self.media), 1);
        field!("fat_sz_16", self.fat_sz_16, 2);
        field!("sec_per_trk", self.sec_per_trk, 2);
        field!("num_heads", self.num_heads, 2);
        field!("hidd_sec", self.hidd_sec, 4);
        field!("tot_sec_32", self.tot_sec_32, 4);
        field!("reserved", self.reserved, 4);
        field!("total_sectors", self.total_sectors, 8);
        field!("mft_start_cluster", self.mft_start_cluster, 8);
        field!("mft_mirror_cluster", self.mft_mirror_cluster, 8);
        writeln!(f, "  (parsed {offset} bytes)")?;

        Ok(())
    }
}
