//! Trigram index writer: serializes a built index to bytes.
//!
//! No file I/O here; `csearch::index::write_index_file` persists the bytes.

use super::builder::TrigramIndexBuilder;
use super::error::TrigramError;
use super::format::{
    encode_trigram_entry, IndexHeader, FILE_ENTRY_SIZE, HEADER_SIZE, SECTION_CRC_SIZE,
    TRIGRAM_ENTRY_SIZE, VERSION,
};

/// Append the CRC32 of `output[start..]` to `output`.
fn seal_section(output: &mut Vec<u8>, start: usize) {
    let crc = crc32fast::hash(&output[start..]);
    output.extend_from_slice(&crc.to_le_bytes());
}

/// `size` as a u32 length field, or [`TrigramError::TooLarge`].
fn len_u32(size: usize, what: &'static str) -> Result<u32, TrigramError> {
    u32::try_from(size).map_err(|_| TrigramError::TooLarge {
        what,
        size: size as u64,
    })
}

fn path_len_u16(path: &str) -> Result<u16, TrigramError> {
    path.len()
        .try_into()
        .map_err(|_| TrigramError::path_too_long(path))
}

/// Serialize a built trigram index to bytes.
///
/// Returns the complete index file content. The caller is responsible for
/// writing it to disk.
pub fn write_index(builder: &TrigramIndexBuilder) -> Result<Vec<u8>, TrigramError> {
    let files = builder.files();
    let sorted_postings = builder.sorted_posting_lists();

    // Serialize posting bitmaps first so section sizes are known up front.
    let mut serialized_postings: Vec<Vec<u8>> = Vec::with_capacity(sorted_postings.len());
    for (_, bitmap) in &sorted_postings {
        let mut buf = Vec::with_capacity(bitmap.serialized_size());
        bitmap.serialize_into(&mut buf)?;
        serialized_postings.push(buf);
    }

    let root_table_size: usize =
        builder.roots().map(|r| 2 + r.len()).sum::<usize>() + SECTION_CRC_SIZE;
    let file_table_size: usize = files.len() * FILE_ENTRY_SIZE
        + files.iter().map(|f| f.path.len()).sum::<usize>()
        + SECTION_CRC_SIZE;
    let trigram_table_size = sorted_postings.len() * TRIGRAM_ENTRY_SIZE + SECTION_CRC_SIZE;
    let posting_section_size =
        serialized_postings.iter().map(Vec::len).sum::<usize>() + SECTION_CRC_SIZE;

    let root_table_offset = HEADER_SIZE as u64;
    let file_table_offset = root_table_offset + root_table_size as u64;
    let trigram_table_offset = file_table_offset + file_table_size as u64;
    let posting_offset = trigram_table_offset + trigram_table_size as u64;
    let total_size = posting_offset as usize + posting_section_size;

    let mut output = Vec::with_capacity(total_size);

    let header = IndexHeader {
        version: VERSION,
        flags: 0,
        root_count: builder.root_count(),
        file_count: builder.file_count(),
        trigram_count: builder.trigram_count(),
        root_table_offset,
        file_table_offset,
        trigram_table_offset,
        posting_offset,
    };
    output.extend_from_slice(&header.to_bytes());

    // Root table.
    let root_table_start = output.len();
    for root in builder.roots() {
        output.extend_from_slice(&path_len_u16(root)?.to_le_bytes());
        output.extend_from_slice(root.as_bytes());
    }
    seal_section(&mut output, root_table_start);

    // File table: fixed entries, then concatenated path bytes.
    let file_table_start = output.len();
    let entries_len = files.len() * FILE_ENTRY_SIZE;
    let mut all_paths = Vec::new();
    for f in files {
        let path_len = path_len_u16(&f.path)?;
        let path_offset = len_u32(entries_len + all_paths.len(), "file table")?;
        output.extend_from_slice(&f.file_id.to_le_bytes());
        output.extend_from_slice(&path_offset.to_le_bytes());
        output.extend_from_slice(&path_len.to_le_bytes());
        all_paths.extend_from_slice(f.path.as_bytes());
    }
    output.extend_from_slice(&all_paths);
    seal_section(&mut output, file_table_start);

    // Trigram table.
    let trigram_table_start = output.len();
    let mut posting_offset_in_section: u64 = 0;
    for ((trigram, _), serialized) in sorted_postings.iter().zip(&serialized_postings) {
        let posting_len = len_u32(serialized.len(), "posting list")?;
        output.extend_from_slice(&encode_trigram_entry(
            trigram,
            posting_offset_in_section,
            posting_len,
        ));
        posting_offset_in_section += u64::from(posting_len);
    }
    seal_section(&mut output, trigram_table_start);

    // Posting lists.
    let posting_start = output.len();
    for serialized in &serialized_postings {
        output.extend_from_slice(serialized);
    }
    seal_section(&mut output, posting_start);

    debug_assert_eq!(output.len(), total_size);
    Ok(output)
}
