//! Binary format constants and header for the trigram index.
//!
//! Layout:
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ Header (60 bytes)                           │
//! │  magic: [u8; 4] = "CSIX"                    │
//! │  version: u32 = 2                           │
//! │  flags: u32                                 │
//! │  root_count: u32                            │
//! │  file_count: u32                            │
//! │  trigram_count: u32                         │
//! │  root_table_offset: u64                     │
//! │  file_table_offset: u64                     │
//! │  trigram_table_offset: u64                  │
//! │  posting_offset: u64                        │
//! │  header_crc32: u32                          │
//! ├─────────────────────────────────────────────┤
//! │ Root Table                                  │
//! │  (len: u16, bytes)* + section_crc32         │
//! ├─────────────────────────────────────────────┤
//! │ File Table                                  │
//! │  entries + path bytes + section_crc32       │
//! ├─────────────────────────────────────────────┤
//! │ Trigram Table                               │
//! │  sorted trigram entries + section_crc32     │
//! │  (trigram, posting_offset: u64, len: u32)   │
//! ├─────────────────────────────────────────────┤
//! │ Posting Lists                               │
//! │  Roaring bitmap serialized + section_crc32  │
//! └─────────────────────────────────────────────┘
//! ```

use super::extract::Trigram;

/// Magic bytes identifying a csearch index file.
pub const MAGIC: [u8; 4] = *b"CSIX";

/// Current format version. Version 1 used 32-bit posting offsets.
pub const VERSION: u32 = 2;

/// Header size in bytes (fixed).
pub const HEADER_SIZE: usize = 60;

/// Bytes of the header covered by the header CRC.
const HEADER_BODY: usize = HEADER_SIZE - 4;

/// File table entry: file_id (u32) + path_offset (u32) + path_len (u16) = 10 bytes.
pub const FILE_ENTRY_SIZE: usize = 10;

/// Trigram table entry: trigram (3 bytes) + posting_offset (u64) + posting_len (u32) = 15 bytes.
pub const TRIGRAM_ENTRY_SIZE: usize = 15;

/// Every section ends with a CRC32 of its contents.
pub const SECTION_CRC_SIZE: usize = 4;

/// Index header parsed from bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexHeader {
    pub version: u32,
    pub flags: u32,
    pub root_count: u32,
    pub file_count: u32,
    pub trigram_count: u32,
    pub root_table_offset: u64,
    pub file_table_offset: u64,
    pub trigram_table_offset: u64,
    pub posting_offset: u64,
}

pub(crate) fn read_u16(data: &[u8], off: usize) -> u16 {
    u16::from_le_bytes([data[off], data[off + 1]])
}

pub(crate) fn read_u32(data: &[u8], off: usize) -> u32 {
    u32::from_le_bytes([data[off], data[off + 1], data[off + 2], data[off + 3]])
}

pub(crate) fn read_u64(data: &[u8], off: usize) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&data[off..off + 8]);
    u64::from_le_bytes(buf)
}

/// Encode one trigram table entry. The offset is relative to the posting section.
pub fn encode_trigram_entry(
    trigram: &Trigram,
    posting_offset: u64,
    posting_len: u32,
) -> [u8; TRIGRAM_ENTRY_SIZE] {
    let mut buf = [0u8; TRIGRAM_ENTRY_SIZE];
    buf[0..3].copy_from_slice(trigram);
    buf[3..11].copy_from_slice(&posting_offset.to_le_bytes());
    buf[11..15].copy_from_slice(&posting_len.to_le_bytes());
    buf
}

/// Decode a trigram table entry from the first [`TRIGRAM_ENTRY_SIZE`] bytes of `e`.
pub fn decode_trigram_entry(e: &[u8]) -> (Trigram, u64, u32) {
    ([e[0], e[1], e[2]], read_u64(e, 3), read_u32(e, 11))
}

impl IndexHeader {
    /// Serialize header to bytes (little-endian) with a trailing CRC32.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(&MAGIC);
        buf[4..8].copy_from_slice(&self.version.to_le_bytes());
        buf[8..12].copy_from_slice(&self.flags.to_le_bytes());
        buf[12..16].copy_from_slice(&self.root_count.to_le_bytes());
        buf[16..20].copy_from_slice(&self.file_count.to_le_bytes());
        buf[20..24].copy_from_slice(&self.trigram_count.to_le_bytes());
        buf[24..32].copy_from_slice(&self.root_table_offset.to_le_bytes());
        buf[32..40].copy_from_slice(&self.file_table_offset.to_le_bytes());
        buf[40..48].copy_from_slice(&self.trigram_table_offset.to_le_bytes());
        buf[48..56].copy_from_slice(&self.posting_offset.to_le_bytes());
        let crc = crc32fast::hash(&buf[..HEADER_BODY]);
        buf[HEADER_BODY..].copy_from_slice(&crc.to_le_bytes());
        buf
    }

    /// Parse header from bytes. Returns None on bad magic, short input or CRC mismatch.
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < HEADER_SIZE || data[0..4] != MAGIC {
            return None;
        }

        let stored_crc = read_u32(data, HEADER_BODY);
        if stored_crc != crc32fast::hash(&data[..HEADER_BODY]) {
            return None;
        }

        Some(IndexHeader {
            version: read_u32(data, 4),
            flags: read_u32(data, 8),
            root_count: read_u32(data, 12),
            file_count: read_u32(data, 16),
            trigram_count: read_u32(data, 20),
            root_table_offset: read_u64(data, 24),
            file_table_offset: read_u64(data, 32),
            trigram_table_offset: read_u64(data, 40),
            posting_offset: read_u64(data, 48),
        })
    }
}
