//! FAT32 boot sector parsing.
//!
//! The first sector of the volume carries the BIOS Parameter Block: the
//! geometry everything else hangs off. All fields are little-endian
//! integers at fixed offsets; this implementation follows Microsoft's
//! FAT32 layout.

use binread::{BinRead, BinReaderExt};
use getset::Getters;
use std::fmt;
use std::io;

use super::fat_error::FatError;
use crate::volume::VolumeHandle;

/// FAT32 boot sector / BIOS Parameter Block.
#[derive(BinRead, Debug, Getters)]
#[br(little)]
pub struct BootSector {
    /// Jump instruction to boot code (0xEB ?? 0x90 or 0xE9 ?? ??)
    jmp: [u8; 3],
    /// OEM identifier (e.g., "MSWIN4.1")
    #[get = "pub"]
    oem_name: [u8; 8],
    /// Number of bytes per sector (512, 1024, 2048, or 4096)
    #[get = "pub"]
    bytes_per_sec: u16,
    /// Number of sectors per cluster (power of 2 up to 128)
    #[get = "pub"]
    sec_per_clus: u8,
    /// Number of reserved sectors from start of volume
    #[get = "pub"]
    rsvd_sec_cnt: u16,
    /// Number of FAT copies (typically 2 for redundancy)
    #[get = "pub"]
    num_fat: u8,
    /// Maximum number of root directory entries (0 for FAT32)
    root_ent_cnt: u16,
    /// Total sectors for volumes < 32MB (0 for FAT32)
    tot_sec_16: u16,
    /// Media descriptor (0xF8 for fixed disk)
    media: u8,
    /// Sectors per FAT for FAT12/FAT16 (0 for FAT32)
    fat_sz_16: u16,
    /// Sectors per track
    sec_per_trk: u16,
    /// Number of heads
    num_heads: u16,
    /// Number of hidden sectors preceding the partition
    hidd_sec: u32,
    /// Total sectors on the volume
    #[get = "pub"]
    tot_sec_32: u32,
    /// Sectors per FAT
    #[get = "pub"]
    fat_sz_32: u32,
    /// FAT flags (mirroring, active FAT)
    ext_flags: u16,
    /// Filesystem version (should be 0:0)
    fs_ver: u16,
    /// First cluster of root directory (typically 2)
    #[get = "pub"]
    root_clus: u32,
    /// Sector number of FSINFO structure
    fs_info: u16,
    /// Sector number of backup boot sector
    bk_boot_sec: u16,
    /// Reserved for future expansion
    reserved: [u8; 12],
    /// Drive number (0x80 for hard disk)
    drv_num: u8,
    /// Reserved (used by Windows NT)
    reserved_1: u8,
    /// Extended boot signature (0x29)
    boot_sig: u8,
    /// Volume serial number
    vol_id: u32,
    /// Volume label (11 bytes, space-padded)
    #[get = "pub"]
    vol_lab: [u8; 11],
    /// Filesystem type label ("FAT32   ")
    fil_sys_type: [u8; 8],
    /// Boot code
    #[br(count = 420)]
    boot_code: Vec<u8>,
    /// Boot sector signature (0x55 0xAA)
    sig: [u8; 2],
}

impl BootSector {
    /// Reads and optionally validates the boot sector from the volume's
    /// first sector.
    ///
    /// # Errors
    /// - `FatError::MalformedBootSector` if a full sector cannot be read
    /// - Various `FatError` variants if validation fails and `validate` is
    ///   true
    pub fn from(handle: &mut VolumeHandle, validate: bool) -> Result<BootSector, FatError> {
        let buf = handle
            .read_sector(0)
            .map_err(|err| FatError::MalformedBootSector(err.to_string()))?;

        let mut reader = io::Cursor::new(buf);
        let boot: BootSector = reader.read_le()?;

        if validate { boot.validate() } else { Ok(boot) }
    }

    /// First sector of the root directory region:
    /// `reserved + fat_count * fat_size`. On FAT32 this is also where the
    /// cluster heap begins, so the cluster-to-sector formula in
    /// [`BootSector::cluster_to_sector`] is anchored here. Computed in one
    /// place so no caller re-derives it.
    pub fn root_dir_start(&self) -> u32 {
        self.rsvd_sec_cnt as u32 + self.num_fat as u32 * self.fat_sz_32
    }

    /// Sector number of the first sector of a cluster.
    pub fn cluster_to_sector(&self, cluster: u32) -> u32 {
        self.root_dir_start() + (cluster - 2) * self.sec_per_clus as u32
    }

    /// Cluster size in bytes.
    pub fn cluster_size(&self) -> usize {
        self.bytes_per_sec as usize * self.sec_per_clus as usize
    }

    /// Volume label with the space padding removed.
    pub fn label(&self) -> String {
        String::from_utf8_lossy(&self.vol_lab).trim_end().to_string()
    }

    /// Structural checks on the fields the browser relies on.
    fn validate(self) -> Result<Self, FatError> {
        if !((self.jmp[0] == 0xEB && self.jmp[2] == 0x90) || self.jmp[0] == 0xE9) {
            return Err(FatError::InvalidJmp(format!(
                "0x{:02X}{:02X}{:02X}",
                self.jmp[0], self.jmp[1], self.jmp[2],
            )));
        }

        const VALID_BYTES_PER_SEC: [u16; 4] = [512, 1024, 2048, 4096];
        if !VALID_BYTES_PER_SEC.contains(&self.bytes_per_sec) {
            return Err(FatError::InvalidBytesPerSec(self.bytes_per_sec));
        }

        const VALID_SEC_PER_CLUS: [u8; 8] = [1, 2, 4, 8, 16, 32, 64, 128];
        if !VALID_SEC_PER_CLUS.contains(&self.sec_per_clus) {
            return Err(FatError::InvalidSecPerClus(self.sec_per_clus));
        }

        const SIG: [u8; 2] = [0x55, 0xAA];
        if !self.sig.eq(&SIG) {
            return Err(FatError::InvalidSignature(format!(
                "0x{:02X}{:02X}",
                self.sig[0], self.sig[1]
            )));
        }

        if self.root_clus < 2 {
            return Err(FatError::InvalidRootClus(self.root_clus));
        }

        Ok(self)
    }
}

/// Field-by-field dump with on-disk offsets, for inspection.
impl fmt::Display for BootSector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut offset = 0;

        macro_rules! field {
            ($name:expr, $val:expr, $size:expr) => {{
                writeln!(f, "  {:<16} 0x{:>04X}: {}", $name, offset, $val)?;
                offset += $size;
            }};
        }

        writeln!(f, "FAT32 boot sector:")?;
        field!("jmp", format!("{:02X?}", self.jmp), 3);
        field!("oem_name", String::from_utf8_lossy(&self.oem_name), 8);
        field!("bytes_per_sec", self.bytes_per_sec, 2);
        field!("sec_per_clus", self.sec_per_clus, 1);
        field!("rsvd_sec_cnt", self.rsvd_sec_cnt, 2);
        field!("num_fat", self.num_fat, 1);
        field!("root_ent_cnt", self.root_ent_cnt, 2);
        field!("tot_sec_16", self.tot_sec_16, 2);
        field!("media", format!("0x{:X}", self.media), 1);
        field!("fat_sz_16", self.fat_sz_16, 2);
        field!("sec_per_trk", self.sec_per_trk, 2);
        field!("num_heads", self.num_heads, 2);
        field!("hidd_sec", self.hidd_sec, 4);
        field!("tot_sec_32", self.tot_sec_32, 4);
        field!("fat_sz_32", self.fat_sz_32, 4);
        field!("ext_flags", self.ext_flags, 2);
        field!("fs_ver", self.fs_ver, 2);
        field!("root_clus", self.root_clus, 4);
        field!("fs_info", self.fs_info, 2);
        field!("bk_boot_sec", self.bk_boot_sec, 2);
        field!("reserved", format!("{:02X?}", &self.reserved[..]), 12);
        field!("drv_num", format!("0x{:X}", self.drv_num), 1);
        field!("reserved_1", self.reserved_1, 1);
        field!("boot_sig", format!("0x{:X}", self.boot_sig), 1);
        field!("vol_id", format!("0x{:X}", self.vol_id), 4);
        field!("vol_lab", String::from_utf8_lossy(&self.vol_lab), 11);
        field!(
            "fil_sys_type",
            String::from_utf8_lossy(&self.fil_sys_type),
            8
        );
        field!(
            "boot_code",
            format!("({} bytes)", self.boot_code.len()),
            self.boot_code.len()
        );
        writeln!(f, "  {:<16} 0x{:>04X}: {:02X?}", "sig", offset, self.sig)?;

        Ok(())
    }
}
