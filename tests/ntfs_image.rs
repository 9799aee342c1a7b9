//! End-to-end scenario over a synthetic NTFS volume held in memory.
//!
//! Layout: 512-byte sectors, 1 sector per cluster, MFT at cluster 1.
//! The MFT holds a root record, a DOCS directory, resident and
//! non-resident files, plus records that must be excluded: a corrupt one
//! and a hidden one.

use chrono::NaiveDate;
use fs_browser::navigator::Resolved;
use fs_browser::tree::NodeId;
use fs_browser::{FileSystemView, Navigator, NtfsVolume, VolumeHandle};
use std::io::Cursor;

const SECTOR_SIZE: usize = 512;
const RECORD_SIZE: usize = 1024;
const TOTAL_SECTORS: u64 = 24;

const ATTR_STANDARD_INFORMATION: u32 = 0x10;
const ATTR_FILE_NAME: u32 = 0x30;
const ATTR_DATA: u32 = 0x80;
const ATTR_END: u32 = 0xFFFF_FFFF;

const SI_HIDDEN: u32 = 0x02;

/// FILETIME for 2014-03-01 09:17:00 UTC.
const FILETIME_SAMPLE: u64 = 130381390209053668;

fn bpb_sector() -> Vec<u8> {
    let mut buf = vec![0u8; SECTOR_SIZE];
    buf[0] = 0xEB;
    buf[2] = 0x90;
    buf[3..11].copy_from_slice(b"NTFS    ");
    buf[0x0B..0x0D].copy_from_slice(&(SECTOR_SIZE as u16).to_le_bytes());
    buf[0x0D] = 1; // sectors per cluster
    buf[0x15] = 0xF8;
    buf[0x18..0x1A].copy_from_slice(&63u16.to_le_bytes());
    buf[0x28..0x30].copy_from_slice(&TOTAL_SECTORS.to_le_bytes());
    buf[0x30..0x38].copy_from_slice(&1u64.to_le_bytes()); // MFT at cluster 1
    buf
}

fn align8(len: usize) -> usize {
    (len + 7) & !7
}

fn put_attr_header(
    slot: &mut [u8],
    offset: usize,
    attr_type: u32,
    length: usize,
    resident_flag: u8,
    content_size: usize,
    content_offset: u8,
) {
    slot[offset..offset + 4].copy_from_slice(&attr_type.to_le_bytes());
    slot[offset + 4..offset + 8].copy_from_slice(&(length as u32).to_le_bytes());
    slot[offset + 8] = resident_flag;
    slot[offset + 16..offset + 20].copy_from_slice(&(content_size as u32).to_le_bytes());
    slot[offset + 20] = content_offset;
}

struct RecordShape<'a> {
    name: &'a str,
    parent: u64,
    directory: bool,
    si_flags: u32,
    data: Data<'a>,
}

enum Data<'a> {
    None,
    Resident(&'a [u8]),
    /// (start cluster, cluster count, real size)
    NonResident(u64, u64, u64),
}

fn build_record(shape: &RecordShape) -> Vec<u8> {
    let mut slot = vec![0u8; RECORD_SIZE];
    slot[0..4].copy_from_slice(b"FILE");
    let flags: u16 = if shape.directory { 0x03 } else { 0x01 };
    slot[0x16..0x18].copy_from_slice(&flags.to_le_bytes());
    slot[0x14..0x16].copy_from_slice(&0x38u16.to_le_bytes());
    let mut offset = 0x38;

    // STANDARD_INFORMATION: 0x30 bytes of content at offset 24.
    put_attr_header(&mut slot, offset, ATTR_STANDARD_INFORMATION, 0x48, 0, 0x30, 24);
    slot[offset + 24 + 0x20..offset + 24 + 0x24].copy_from_slice(&shape.si_flags.to_le_bytes());
    offset += 0x48;

    // FILE_NAME
    let units: Vec<u8> = shape.name.encode_utf16().flat_map(u16::to_le_bytes).collect();
    let content_len = 66 + units.len();
    let attr_len = align8(24 + content_len);
    put_attr_header(&mut slot, offset, ATTR_FILE_NAME, attr_len, 0, content_len, 24);
    let content = offset + 24;
    slot[content..content + 6].copy_from_slice(&shape.parent.to_le_bytes()[..6]);
    slot[content + 8..content + 16].copy_from_slice(&FILETIME_SAMPLE.to_le_bytes());
    slot[content + 16..content + 24].copy_from_slice(&FILETIME_SAMPLE.to_le_bytes());
    slot[content + 32..content + 40].copy_from_slice(&FILETIME_SAMPLE.to_le_bytes());
    slot[content + 64] = shape.name.encode_utf16().count() as u8;
    slot[content + 66..content + 66 + units.len()].copy_from_slice(&units);
    offset += attr_len;

    match shape.data {
        Data::None => {}
        Data::Resident(bytes) => {
            let attr_len = align8(24 + bytes.len());
            put_attr_header(&mut slot, offset, ATTR_DATA, attr_len, 0, bytes.len(), 24);
            slot[offset + 24..offset + 24 + bytes.len()].copy_from_slice(bytes);
            offset += attr_len;
        }
        Data::NonResident(start_cluster, cluster_count, real_size) => {
            // Header through offset 56, run list at 0x40: one run with a
            // 1-byte length and 2-byte start.
            let attr_len = align8(0x40 + 8);
            put_attr_header(&mut slot, offset, ATTR_DATA, attr_len, 1, 0, 0);
            slot[offset + 32..offset + 34].copy_from_slice(&0x40u16.to_le_bytes());
            slot[offset + 48..offset + 56].copy_from_slice(&real_size.to_le_bytes());
            slot[offset + 0x40] = 0x21;
            slot[offset + 0x41] = cluster_count as u8;
            slot[offset + 0x42..offset + 0x44]
                .copy_from_slice(&(start_cluster as u16).to_le_bytes());
            offset += attr_len;
        }
    }

    slot[offset..offset + 4].copy_from_slice(&ATTR_END.to_le_bytes());
    slot
}

/// MFT slots:
///   0: `.` (root)        3: corrupt record (resident flag 2)
///   1: DOCS/             4: B.TXT, zero-size resident data
///   2: A.TXT "HI"        5: SECRET.TXT, hidden via SI flags
///                        6: RUN.BIN, non-resident, 2 clusters at LCN 20
fn build_image() -> Vec<u8> {
    let mut image = bpb_sector();

    let shapes = [
        RecordShape {
            name: ".",
            parent: 0,
            directory: true,
            si_flags: 0,
            data: Data::None,
        },
        RecordShape {
            name: "DOCS",
            parent: 0,
            directory: true,
            si_flags: 0,
            data: Data::None,
        },
        RecordShape {
            name: "A.TXT",
            parent: 1,
            directory: false,
            si_flags: 0,
            data: Data::Resident(b"HI"),
        },
        RecordShape {
            name: "BAD.TXT",
            parent: 0,
            directory: false,
            si_flags: 0,
            data: Data::None,
        },
        RecordShape {
            name: "B.TXT",
            parent: 0,
            directory: false,
            si_flags: 0,
            data: Data::Resident(b""),
        },
        RecordShape {
            name: "SECRET.TXT",
            parent: 0,
            directory: false,
            si_flags: SI_HIDDEN,
            data: Data::Resident(b"classified"),
        },
        RecordShape {
            name: "RUN.BIN",
            parent: 0,
            directory: false,
            si_flags: 0,
            data: Data::NonResident(20, 2, 1000),
        },
    ];

    for (index, shape) in shapes.iter().enumerate() {
        let mut slot = build_record(shape);
        if index == 3 {
            // First attribute's resident flag byte becomes undecodable.
            slot[0x38 + 8] = 2;
        }
        image.extend(slot);
    }

    // Pad out to the full volume, then lay down RUN.BIN's clusters.
    image.resize(TOTAL_SECTORS as usize * SECTOR_SIZE, 0);
    for (i, byte) in image
        [20 * SECTOR_SIZE..22 * SECTOR_SIZE]
        .iter_mut()
        .enumerate()
    {
        *byte = (i % 251) as u8;
    }
    image
}

fn open_volume() -> NtfsVolume {
    let handle = VolumeHandle::new(Box::new(Cursor::new(build_image())), SECTOR_SIZE);
    NtfsVolume::open(handle).expect("synthetic volume should open")
}

fn names_of(view: &impl FileSystemView, node: NodeId) -> Vec<String> {
    view.children(node)
        .iter()
        .map(|&id| view.meta(id).name.clone())
        .collect()
}

#[test]
fn links_records_into_the_expected_tree() {
    let volume = open_volume();
    let root_names = names_of(&volume, volume.root());

    assert_eq!(root_names, vec!["DOCS", "B.TXT", "RUN.BIN"]);
    // The corrupt record and the hidden record never reach the tree.
    assert!(!root_names.contains(&"BAD.TXT".to_string()));
    assert!(!root_names.contains(&"SECRET.TXT".to_string()));

    let docs = volume.children(volume.root())[0];
    assert_eq!(names_of(&volume, docs), vec!["A.TXT"]);
}

#[test]
fn reads_resident_content() {
    let mut volume = open_volume();
    let mut nav = Navigator::new(volume.root());

    let node = match nav.resolve(&volume, "/DOCS/A.TXT").unwrap() {
        Resolved::File(node) => node,
        other => panic!("expected a file, got {other:?}"),
    };
    assert_eq!(volume.read_file(node).unwrap(), b"HI");

    let meta = volume.meta(node);
    assert_eq!(meta.size, 2);
    let expected = NaiveDate::from_ymd_opt(2014, 3, 1)
        .unwrap()
        .and_hms_opt(9, 17, 0)
        .unwrap();
    assert_eq!(meta.created, Some(expected));
}

#[test]
fn zero_size_resident_data_reads_as_empty() {
    let mut volume = open_volume();
    let mut nav = Navigator::new(volume.root());

    let node = match nav.resolve(&volume, "/B.TXT").unwrap() {
        Resolved::File(node) => node,
        other => panic!("expected a file, got {other:?}"),
    };
    assert_eq!(volume.read_file(node).unwrap(), Vec::<u8>::new());
}

#[test]
fn reads_non_resident_content_from_its_run() {
    let mut volume = open_volume();
    let mut nav = Navigator::new(volume.root());

    let node = match nav.resolve(&volume, "/RUN.BIN").unwrap() {
        Resolved::File(node) => node,
        other => panic!("expected a file, got {other:?}"),
    };
    assert_eq!(volume.meta(node).size, 1000);

    let content = volume.read_file(node).unwrap();
    let expected: Vec<u8> = (0..1000).map(|i| (i % 251) as u8).collect();
    assert_eq!(content, expected);
}

#[test]
fn resolution_is_case_insensitive() {
    let volume = open_volume();
    let mut nav = Navigator::new(volume.root());

    let upper = nav.resolve(&volume, "/DOCS/A.TXT").unwrap();
    let lower = nav.resolve(&volume, "/docs/a.txt").unwrap();
    assert_eq!(upper, lower);
}
