//! Error types for the NTFS engine.
//!
//! Only geometry errors abort the volume open. Record-level errors mark a
//! single MFT slot as unusable; the scan keeps going.

use std::io;
use thiserror::Error;

/// Errors raised while parsing an NTFS volume.
#[derive(Error, Debug)]
pub enum NtfsError {
    /// The first sector could not be read in full, so there is no geometry
    /// to work with.
    #[error("Malformed boot sector: {0}")]
    MalformedBootSector(String),

    /// The slot does not start with the "FILE" signature. Common for
    /// unused slots; the walker skips the slot and continues.
    #[error("MFT record signature mismatch")]
    RecordSignatureMismatch,

    /// The resident flag byte must be 0 (resident) or 1 (non-resident);
    /// anything else makes the rest of the record undecodable.
    #[error("Unsupported resident flag value: `{0}`")]
    UnsupportedResidentFlag(u8),

    /// An attribute header or content field points outside the record.
    #[error("Malformed MFT attribute: {0}")]
    MalformedAttribute(String),

    /// A non-resident run list could not be decoded.
    #[error("Malformed data run: {0}")]
    MalformedDataRun(String),

    /// No record named `.` was found, so the tree has nothing to hang off.
    #[error("No root directory record found in the MFT")]
    MissingRoot,

    /// Underlying I/O errors while reading the volume.
    #[error("IO Error: `{0}`")]
    IOError(#[from] io::Error),

    /// Parsing error during structure decoding.
    #[error("BinRead Error: `{0}`")]
    BinReadError(#[from] binread::Error),
}
