//! FAT32 directory entry codec.
//!
//! This module implements:
//! - The fixed 32-byte directory entry structure
//! - Slot status classification (empty / deleted / live)
//! - VFAT long-file-name reconstruction
//! - Packed date/time decoding

use binread::{BinRead, BinReaderExt};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use getset::Getters;
use std::io;

use super::fat_error::FatError;
use crate::utils::normalize_name;

/// On-disk size of one directory entry slot.
pub const ENTRY_SIZE: usize = 32;

/// FAT attribute bitset stored as a plain byte with named bit constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attributes(u8);

impl Attributes {
    pub const READ_ONLY: u8 = 0x01;
    pub const HIDDEN: u8 = 0x02;
    pub const SYSTEM: u8 = 0x04;
    pub const VOLUME_ID: u8 = 0x08;
    pub const DIRECTORY: u8 = 0x10;
    pub const ARCHIVE: u8 = 0x20;
    /// READ_ONLY | HIDDEN | SYSTEM | VOLUME_ID; an entry whose attribute
    /// byte equals exactly this value is a long-file-name fragment.
    pub const LONG_NAME: u8 = 0x0F;

    pub fn new(bits: u8) -> Self {
        Self(bits)
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    /// All of the given bits are set.
    pub fn contains(&self, flags: u8) -> bool {
        self.0 & flags == flags
    }

    /// Any of the given bits is set.
    pub fn intersects(&self, flags: u8) -> bool {
        self.0 & flags != 0
    }

    /// LFN fragments are recognized by exact equality, not bit overlap.
    pub fn is_long_name(&self) -> bool {
        self.0 == Self::LONG_NAME
    }
}

/// Slot status, decoded from the first byte of the entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    /// No entry here and none after it: terminates the listing.
    Empty,
    /// Deleted entry: skipped, scanning continues.
    Deleted,
    /// Live entry.
    Normal,
}

impl EntryStatus {
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0x00 => EntryStatus::Empty,
            0xE5 => EntryStatus::Deleted,
            _ => EntryStatus::Normal,
        }
    }
}

/// One 32-byte FAT directory entry.
///
/// The first cluster number is split across two 16-bit halves; see
/// [`DirEntry::first_cluster`] for the reassembly. The optional long name
/// is not part of the on-disk slot: it is attached by [`decode_entries`]
/// from the LFN fragments preceding the slot.
#[derive(BinRead, Debug, Clone, Getters)]
#[br(little)]
pub struct DirEntry {
    /// Filename in 8.3 format (8 characters name + 3 characters extension)
    name: [u8; 11],
    /// File attributes byte
    attr: u8,
    /// NT reserved (unused)
    _nt_res: u8,
    /// Creation time in 10ms units
    _crt_time_tenth: u8,
    /// Creation time, packed h:m:s/2
    crt_time: u16,
    /// Creation date, packed y-1980:m:d
    crt_date: u16,
    /// Last access date
    lst_acc_date: u16,
    /// High 16 bits of first cluster number
    fst_clus_hi: u16,
    /// Last write time
    wrt_time: u16,
    /// Last write date
    wrt_date: u16,
    /// Low 16 bits of first cluster number
    fst_clus_lo: u16,
    /// File size in bytes (0 for directories)
    #[get = "pub"]
    file_size: u32,
    /// Reconstructed long file name, when LFN fragments preceded the slot.
    #[br(ignore)]
    #[get = "pub"]
    long_name: Option<String>,
}

impl DirEntry {
    /// Decodes one entry from a 32-byte slice.
    pub fn from_slice(buf: &[u8]) -> Result<Self, FatError> {
        let mut reader = io::Cursor::new(buf);
        reader.read_le().map_err(FatError::from)
    }

    pub fn status(&self) -> EntryStatus {
        EntryStatus::from_byte(self.name[0])
    }

    pub fn attributes(&self) -> Attributes {
        Attributes::new(self.attr)
    }

    /// The complete first cluster number: high word at offset 0x14, low
    /// word at offset 0x1A, combined as `(hi << 16) | lo`.
    pub fn first_cluster(&self) -> u32 {
        ((self.fst_clus_hi as u32) << 16) | self.fst_clus_lo as u32
    }

    pub fn is_dir(&self) -> bool {
        self.attributes().contains(Attributes::DIRECTORY)
    }

    /// Raw 8-byte base name, space padding removed.
    pub fn base_name(&self) -> String {
        normalize_name(&String::from_utf8_lossy(&self.name[0..8]))
    }

    /// Raw 3-byte extension, space padding removed.
    pub fn extension(&self) -> String {
        normalize_name(&String::from_utf8_lossy(&self.name[8..11]))
    }

    /// Normalized short name: NULs and padding stripped, extension
    /// lower-cased and joined with a dot when present.
    pub fn short_name(&self) -> String {
        let base = self.base_name();
        let ext = self.extension();
        if ext.is_empty() {
            base
        } else {
            format!("{}.{}", base, ext.to_lowercase())
        }
    }

    /// Name to show in listings: the long name when one was reconstructed.
    pub fn display_name(&self) -> String {
        match &self.long_name {
            Some(long) => normalize_name(long),
            None => self.short_name(),
        }
    }

    pub fn created(&self) -> NaiveDateTime {
        NaiveDateTime::new(decode_date(self.crt_date), decode_time(self.crt_time))
    }

    pub fn modified(&self) -> NaiveDateTime {
        NaiveDateTime::new(decode_date(self.wrt_date), decode_time(self.wrt_time))
    }

    pub fn accessed(&self) -> NaiveDateTime {
        NaiveDateTime::new(decode_date(self.lst_acc_date), midnight())
    }
}

/// Decodes a packed FAT date: 7 bits year since 1980, 4 bits month, 5 bits
/// day. Out-of-range values fall back to 1980-01-01 rather than failing
/// the entry.
pub fn decode_date(packed: u16) -> NaiveDate {
    let year = ((packed >> 9) & 0x7F) as i32 + 1980;
    let month = ((packed >> 5) & 0x0F) as u32;
    let day = (packed & 0x1F) as u32;

    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_else(epoch_date)
}

/// Decodes a packed FAT time: 5 bits hour, 6 bits minute, 5 bits
/// two-second units. Out-of-range values fall back to midnight.
pub fn decode_time(packed: u16) -> NaiveTime {
    let hour = ((packed >> 11) & 0x1F) as u32;
    let minute = ((packed >> 5) & 0x3F) as u32;
    let second = ((packed & 0x1F) as u32) * 2;

    NaiveTime::from_hms_opt(hour, minute, second).unwrap_or_else(midnight)
}

fn epoch_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1980, 1, 1).unwrap_or_default()
}

fn midnight() -> NaiveTime {
    NaiveTime::from_hms_opt(0, 0, 0).unwrap_or_default()
}

/// UTF-16 name characters of one LFN fragment, in slot order: bytes 1-11,
/// 14-26 and 28-32, truncated at the first 0xFFFF padding pair.
fn lfn_fragment(slot: &[u8]) -> String {
    let mut units = Vec::with_capacity(13);
    let ranges: [(usize, usize); 3] = [(1, 11), (14, 26), (28, 32)];

    'outer: for (start, end) in ranges {
        for off in (start..end).step_by(2) {
            let unit = u16::from_le_bytes([slot[off], slot[off + 1]]);
            if unit == 0xFFFF {
                break 'outer;
            }
            units.push(unit);
        }
    }

    String::from_utf16_lossy(&units)
}

/// Decodes a directory's raw bytes into its live entries.
///
/// The buffer is sliced into 32-byte slots. An empty-status slot ends the
/// listing; deleted slots are skipped; LFN fragments accumulate (prepended,
/// since fragments are stored highest-ordinal first) until the next regular
/// slot claims the assembled name.
pub fn decode_entries(buf: &[u8]) -> Result<Vec<DirEntry>, FatError> {
    let mut entries = Vec::new();
    let mut name_buffer = String::new();

    for slot in buf.chunks_exact(ENTRY_SIZE) {
        match EntryStatus::from_byte(slot[0]) {
            EntryStatus::Empty => break,
            EntryStatus::Deleted => continue,
            EntryStatus::Normal => {}
        }

        let mut entry = DirEntry::from_slice(slot)?;
        if entry.attributes().is_long_name() {
            name_buffer = lfn_fragment(slot) + &name_buffer;
            continue;
        }

        if !name_buffer.is_empty() {
            entry.long_name = Some(normalize_name(&name_buffer));
            name_buffer.clear();
        }
        entries.push(entry);
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A 32-byte regular entry slot.
    pub(crate) fn raw_entry(
        name: &[u8; 11],
        attr: u8,
        cluster: u32,
        size: u32,
    ) -> [u8; ENTRY_SIZE] {
        let mut slot = [0u8; ENTRY_SIZE];
        slot[0..11].copy_from_slice(name);
        slot[11] = attr;
        slot[20..22].copy_from_slice(&((cluster >> 16) as u16).to_le_bytes());
        slot[26..28].copy_from_slice(&((cluster & 0xFFFF) as u16).to_le_bytes());
        slot[28..32].copy_from_slice(&size.to_le_bytes());
        slot
    }

    /// A 32-byte LFN fragment slot holding up to 13 UTF-16 characters.
    pub(crate) fn raw_lfn(sequence: u8, chars: &str) -> [u8; ENTRY_SIZE] {
        let mut units: Vec<u16> = chars.encode_utf16().collect();
        assert!(units.len() <= 13);
        if units.len() < 13 {
            units.push(0x0000); // NUL terminator
        }
        while units.len() < 13 {
            units.push(0xFFFF); // padding
        }

        let mut slot = [0u8; ENTRY_SIZE];
        slot[0] = sequence;
        slot[11] = Attributes::LONG_NAME;
        let ranges: [(usize, usize); 3] = [(1, 11), (14, 26), (28, 32)];
        let mut unit = units.into_iter();
        for (start, end) in ranges {
            for off in (start..end).step_by(2) {
                let bytes = unit.next().unwrap().to_le_bytes();
                slot[off] = bytes[0];
                slot[off + 1] = bytes[1];
            }
        }
        slot
    }

    #[test]
    fn listing_stops_at_the_empty_slot() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&raw_entry(b"FIRST   TXT", Attributes::ARCHIVE, 3, 10));
        let mut deleted = raw_entry(b"GONE    TXT", Attributes::ARCHIVE, 4, 10);
        deleted[0] = 0xE5;
        buf.extend_from_slice(&deleted);
        buf.extend_from_slice(&raw_entry(b"SECOND  TXT", Attributes::ARCHIVE, 5, 10));
        buf.extend_from_slice(&[0u8; ENTRY_SIZE]); // empty: terminator
        buf.extend_from_slice(&raw_entry(b"AFTER   TXT", Attributes::ARCHIVE, 6, 10));

        let entries = decode_entries(&buf).unwrap();
        let names: Vec<String> = entries.iter().map(|e| e.short_name()).collect();
        assert_eq!(names, vec!["FIRST.txt", "SECOND.txt"]);
    }

    #[test]
    fn long_name_round_trips_across_two_fragments() {
        let full = "My Long File Name.txt";
        let mut buf = Vec::new();
        // Fragments are stored highest ordinal first.
        buf.extend_from_slice(&raw_lfn(0x42, &full[13..]));
        buf.extend_from_slice(&raw_lfn(0x01, &full[..13]));
        buf.extend_from_slice(&raw_entry(b"MYLONG~1TXT", Attributes::ARCHIVE, 7, 21));
        buf.extend_from_slice(&[0u8; ENTRY_SIZE]);

        let entries = decode_entries(&buf).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].long_name().as_deref(), Some(full));
        assert_eq!(entries[0].display_name(), full);
        // The short name is still there for matching.
        assert_eq!(entries[0].short_name(), "MYLONG~1.txt");
    }

    #[test]
    fn first_cluster_reassembles_the_split_halves() {
        let slot = raw_entry(b"BIG     BIN", Attributes::ARCHIVE, 0x0012_3456, 1);
        let entry = DirEntry::from_slice(&slot).unwrap();
        assert_eq!(entry.first_cluster(), 0x0012_3456);
    }

    #[test]
    fn packed_timestamps_decode() {
        // 2014-03-01, year field 34, month 3, day 1
        let date = (34u16 << 9) | (3 << 5) | 1;
        assert_eq!(
            decode_date(date),
            NaiveDate::from_ymd_opt(2014, 3, 1).unwrap()
        );
        // 09:17:24 -> seconds stored as half units
        let time = (9u16 << 11) | (17 << 5) | 12;
        assert_eq!(
            decode_time(time),
            NaiveTime::from_hms_opt(9, 17, 24).unwrap()
        );
    }

    #[test]
    fn out_of_range_timestamps_fall_back_to_the_epoch() {
        // Month 0 / day 0 is not a calendar date.
        assert_eq!(
            decode_date(0),
            NaiveDate::from_ymd_opt(1980, 1, 1).unwrap()
        );
        // Hour 31 / minute 63 is not a time of day.
        assert_eq!(
            decode_time(0xFFFF),
            NaiveTime::from_hms_opt(0, 0, 0).unwrap()
        );
    }

    #[test]
    fn directory_short_names_have_no_extension() {
        let slot = raw_entry(b"DOCS       ", Attributes::DIRECTORY, 3, 0);
        let entry = DirEntry::from_slice(&slot).unwrap();
        assert_eq!(entry.short_name(), "DOCS");
        assert!(entry.is_dir());
    }
}
