//! MFT record scanning and attribute decoding.
//!
//! The Master File Table is an array of fixed 1024-byte records, one per
//! filesystem object. Each record that passes the `FILE` signature and
//! flag checks is walked attribute by attribute; `$STANDARD_INFORMATION`,
//! `$FILE_NAME` and `$DATA` are decoded, everything else is stepped over
//! using the attribute's total length.

use chrono::{DateTime, NaiveDateTime};
use getset::Getters;
use log::{debug, warn};

use super::bpb::NtfsBpb;
use super::data_run::{DataRun, decode_data_runs};
use super::ntfs_error::NtfsError;
use crate::utils::{u16_at, u32_at, u48_at, u64_at};
use crate::volume::VolumeHandle;

/// Fixed on-disk size of an MFT record.
pub const RECORD_SIZE: usize = 1024;

/// An MFT record spans two 512-byte sectors.
pub const SECTORS_PER_RECORD: u64 = 2;

const SIGNATURE: &[u8; 4] = b"FILE";

/// Record header offsets.
const ATTR_LIST_OFFSET: usize = 0x14;
const RECORD_FLAGS_OFFSET: usize = 0x16;

/// Record flag bits.
const FLAG_IN_USE: u16 = 0x0001;
const FLAG_DIRECTORY: u16 = 0x0002;
/// Bits 2/3 mark extension and index records, which carry no user data.
const FLAG_NON_REGULAR: u16 = 0x000C;

/// Attribute type codes.
pub const ATTR_STANDARD_INFORMATION: u32 = 0x10;
pub const ATTR_FILE_NAME: u32 = 0x30;
pub const ATTR_DATA: u32 = 0x80;
const ATTR_LIST_END: u32 = 0xFFFF_FFFF;

/// DOS flags inside `$STANDARD_INFORMATION`.
pub const SI_FLAG_HIDDEN: u32 = 0x0002;
pub const SI_FLAG_SYSTEM: u32 = 0x0004;

/// Seconds between the FILETIME epoch (1601-01-01) and the Unix epoch.
const FILETIME_UNIX_OFFSET: i64 = 11_644_473_600;
/// FILETIME counts 100-nanosecond ticks.
const FILETIME_TICKS_PER_SECOND: u64 = 10_000_000;

/// Where a record's `$DATA` content lives.
#[derive(Debug, Clone)]
pub enum DataContent {
    /// No DATA attribute: the file is empty.
    None,
    /// Content embedded in the record itself.
    Resident(Vec<u8>),
    /// Content stored in the cluster runs listed here.
    NonResident { runs: Vec<DataRun>, size: u64 },
}

/// One decoded, in-use, regular MFT record.
#[derive(Debug, Clone, Getters)]
pub struct MftRecord {
    /// Slot index inside the MFT; parent references point at these.
    #[get = "pub"]
    index: u64,
    /// File name from `$FILE_NAME`.
    #[get = "pub"]
    name: String,
    /// Parent record reference from `$FILE_NAME`.
    #[get = "pub"]
    parent: Option<u64>,
    #[get = "pub"]
    is_directory: bool,
    /// DOS flags from `$STANDARD_INFORMATION`.
    #[get = "pub"]
    si_flags: u32,
    #[get = "pub"]
    created: Option<NaiveDateTime>,
    #[get = "pub"]
    modified: Option<NaiveDateTime>,
    #[get = "pub"]
    accessed: Option<NaiveDateTime>,
    #[get = "pub"]
    data: DataContent,
}

impl MftRecord {
    /// File size in bytes: the resident content length, the non-resident
    /// real size, or 0 when the record has no DATA attribute.
    pub fn size(&self) -> u64 {
        match &self.data {
            DataContent::None => 0,
            DataContent::Resident(bytes) => bytes.len() as u64,
            DataContent::NonResident { size, .. } => *size,
        }
    }

    /// The record every parent reference chain ends at.
    pub fn is_root(&self) -> bool {
        self.name == "."
    }

    pub fn is_hidden_or_system(&self) -> bool {
        self.si_flags & (SI_FLAG_HIDDEN | SI_FLAG_SYSTEM) != 0
    }

    /// Decodes one 1024-byte slot.
    ///
    /// Returns `Ok(None)` for slots that decode fine but hold nothing the
    /// tree wants: records not in use, non-regular records, records with
    /// no `$FILE_NAME`, and `$`-prefixed metadata records.
    ///
    /// # Errors
    /// - `NtfsError::RecordSignatureMismatch` when the slot is not a FILE
    ///   record (the walker skips it)
    /// - `NtfsError::UnsupportedResidentFlag` / `MalformedAttribute` /
    ///   `MalformedDataRun` when the record cannot be decoded (the record
    ///   is excluded, the scan continues)
    pub fn parse(slot: &[u8], index: u64) -> Result<Option<MftRecord>, NtfsError> {
        if slot.len() < RECORD_SIZE || &slot[0..4] != SIGNATURE {
            return Err(NtfsError::RecordSignatureMismatch);
        }

        let flags = u16_at(slot, RECORD_FLAGS_OFFSET);
        if flags & FLAG_IN_USE == 0 || flags & FLAG_NON_REGULAR != 0 {
            return Ok(None);
        }

        let mut record = MftRecord {
            index,
            name: String::new(),
            parent: None,
            is_directory: flags & FLAG_DIRECTORY != 0,
            si_flags: 0,
            created: None,
            modified: None,
            accessed: None,
            data: DataContent::None,
        };

        let mut offset = u16_at(slot, ATTR_LIST_OFFSET) as usize;
        loop {
            if offset + 8 > slot.len() {
                break;
            }
            let attr_type = u32_at(slot, offset);
            if attr_type == ATTR_LIST_END || attr_type == 0 {
                break;
            }

            let length = u32_at(slot, offset + 4) as usize;
            if length < 24 || offset + length > slot.len() {
                return Err(NtfsError::MalformedAttribute(format!(
                    "attribute at offset {offset} declares length {length}"
                )));
            }
            let attr = &slot[offset..offset + length];

            let resident_flag = attr[8];
            if resident_flag > 1 {
                return Err(NtfsError::UnsupportedResidentFlag(resident_flag));
            }
            let resident = resident_flag == 0;

            match attr_type {
                ATTR_FILE_NAME => record.decode_file_name(attr)?,
                ATTR_STANDARD_INFORMATION => record.decode_standard_information(attr),
                ATTR_DATA => {
                    if matches!(record.data, DataContent::None) {
                        record.data = decode_data(attr, resident)?;
                    }
                }
                _ => {}
            }

            offset += length;
        }

        if record.name.is_empty() {
            debug!("record {index} carries no FILE_NAME attribute");
            return Ok(None);
        }
        if record.name.starts_with('$') {
            // Filesystem metadata ($MFT, $Bitmap, ...), not a user file.
            return Ok(None);
        }

        Ok(Some(record))
    }

    fn decode_file_name(&mut self, attr: &[u8]) -> Result<(), NtfsError> {
        let content_offset = attr[20] as usize;
        let content = attr
            .get(content_offset..)
            .filter(|c| c.len() >= 66)
            .ok_or_else(|| {
                NtfsError::MalformedAttribute("FILE_NAME content is truncated".to_string())
            })?;

        let name_len = content[64] as usize;
        let name_bytes = content.get(66..66 + name_len * 2).ok_or_else(|| {
            NtfsError::MalformedAttribute("FILE_NAME name is truncated".to_string())
        })?;
        let units: Vec<u16> = name_bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();

        self.name = String::from_utf16_lossy(&units);
        self.parent = Some(u48_at(content, 0));
        self.created = filetime_to_datetime(u64_at(content, 8));
        self.modified = filetime_to_datetime(u64_at(content, 16));
        self.accessed = filetime_to_datetime(u64_at(content, 32));
        Ok(())
    }

    fn decode_standard_information(&mut self, attr: &[u8]) {
        let content_offset = attr[20] as usize;
        match attr.get(content_offset..) {
            Some(content) if content.len() >= 0x24 => {
                self.si_flags = u32_at(content, 0x20);
            }
            _ => debug!("STANDARD_INFORMATION too short for DOS flags"),
        }
    }
}

fn decode_data(attr: &[u8], resident: bool) -> Result<DataContent, NtfsError> {
    if resident {
        let content_size = u32_at(attr, 16) as usize;
        let content_offset = attr[20] as usize;
        let bytes = attr
            .get(content_offset..content_offset + content_size)
            .ok_or_else(|| {
                NtfsError::MalformedAttribute("resident DATA content is truncated".to_string())
            })?;
        return Ok(DataContent::Resident(bytes.to_vec()));
    }

    if attr.len() < 56 {
        return Err(NtfsError::MalformedAttribute(
            "non-resident DATA header is truncated".to_string(),
        ));
    }
    let run_offset = u16_at(attr, 32) as usize;
    let size = u64_at(attr, 48);
    let run_list = attr.get(run_offset..).ok_or_else(|| {
        NtfsError::MalformedAttribute("run list offset is out of range".to_string())
    })?;
    let runs = decode_data_runs(run_list)?;
    Ok(DataContent::NonResident { runs, size })
}

/// Converts a Windows FILETIME (100ns ticks since 1601-01-01 UTC) to a
/// naive UTC timestamp. Zero means "not recorded".
pub fn filetime_to_datetime(filetime: u64) -> Option<NaiveDateTime> {
    if filetime == 0 {
        return None;
    }
    let secs = (filetime / FILETIME_TICKS_PER_SECOND) as i64 - FILETIME_UNIX_OFFSET;
    DateTime::from_timestamp(secs, 0).map(|dt| dt.naive_utc())
}

/// Scans the MFT slot by slot, stepping two sectors at a time.
///
/// Slots that fail to decode are logged and skipped; the scan ends at the
/// BPB's total sector count or at the end of the underlying source,
/// whichever comes first.
pub fn scan(handle: &mut VolumeHandle, bpb: &NtfsBpb) -> Result<Vec<MftRecord>, NtfsError> {
    let mft_offset = bpb.mft_start_sector() * *bpb.bytes_per_sec() as u64;
    let mut records = Vec::new();
    let mut sector = 0u64;
    let mut index = 0u64;

    while sector < *bpb.total_sectors() {
        let slot = match handle.read_at(mft_offset + index * RECORD_SIZE as u64, RECORD_SIZE) {
            Ok(slot) => slot,
            Err(err) => {
                debug!("MFT scan stopped at slot {index}: {err}");
                break;
            }
        };

        match MftRecord::parse(&slot, index) {
            Ok(Some(record)) => records.push(record),
            Ok(None) => {}
            Err(NtfsError::RecordSignatureMismatch) => {}
            Err(err) => warn!("skipping MFT record {index}: {err}"),
        }

        sector += SECTORS_PER_RECORD;
        index += 1;
    }

    Ok(records)
}
