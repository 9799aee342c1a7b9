//! Small helpers shared across the two filesystem engines.

/// Extracts a 16-bit little-endian unsigned integer from a buffer.
///
/// # Panics
///
/// Panics if the slice does not contain enough bytes starting from the offset.
pub fn u16_at(buffer: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes(
        buffer[offset..offset + 2]
            .try_into()
            .expect("invalid slice"),
    )
}

/// Extracts a 32-bit little-endian unsigned integer from a buffer.
///
/// # Panics
///
/// Panics if the slice does not contain enough bytes starting from the offset.
pub fn u32_at(buffer: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(
        buffer[offset..offset + 4]
            .try_into()
            .expect("invalid slice"),
    )
}

/// Extracts a 64-bit little-endian unsigned integer from a buffer.
///
/// # Panics
///
/// Panics if the slice does not contain enough bytes starting from the offset.
pub fn u64_at(buffer: &[u8], offset: usize) -> u64 {
    u64::from_le_bytes(
        buffer[offset..offset + 8]
            .try_into()
            .expect("invalid slice"),
    )
}

/// Extracts a 48-bit little-endian unsigned integer, widened to `u64`.
///
/// MFT file-name attributes store the parent record reference in 6 bytes.
///
/// # Panics
///
/// Panics if the slice does not contain enough bytes starting from the offset.
pub fn u48_at(buffer: &[u8], offset: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes[..6].copy_from_slice(&buffer[offset..offset + 6]);
    u64::from_le_bytes(bytes)
}

/// Strips embedded NUL characters and surrounding whitespace from a name.
///
/// Both on-disk name encodings can leave NUL padding behind (the space-padded
/// 8.3 short name and the UTF-16 long-name fragments), so every name
/// comparison and every displayed name goes through this.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '\0')
        .collect::<String>()
        .trim()
        .to_string()
}
