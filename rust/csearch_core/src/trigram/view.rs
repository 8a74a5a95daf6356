//! Validated, zero-copy view over serialized index bytes.
//!
//! `IndexView::parse` checks the header, section bounds and every section
//! CRC once; lookups afterwards only bounds-check the entries they touch.
//! The bytes usually come from an mmap owned by `csearch::index::ShardReader`.

use roaring::RoaringBitmap;

use super::error::TrigramError;
use super::extract::Trigram;
use super::format::{
    decode_trigram_entry, read_u16, read_u32, IndexHeader, FILE_ENTRY_SIZE, HEADER_SIZE,
    SECTION_CRC_SIZE, TRIGRAM_ENTRY_SIZE, VERSION,
};
use super::posting::{intersect, union, PostingList};
use super::query::TrigramQuery;

/// Read-only view of one serialized index.
#[derive(Debug, Clone)]
pub struct IndexView<'a> {
    data: &'a [u8],
    header: IndexHeader,
}

/// Verify a section's CRC32 checksum.
///
/// Each section is laid out as `[data bytes][crc32]`; the CRC covers the
/// data bytes only.
fn verify_section_crc(data: &[u8], start: usize, end: usize, name: &str) -> Result<(), TrigramError> {
    if end < start + SECTION_CRC_SIZE || end > data.len() {
        return Err(TrigramError::corrupt(format!("{name} section too small for CRC")));
    }
    let crc_start = end - SECTION_CRC_SIZE;
    let stored = read_u32(data, crc_start);
    let computed = crc32fast::hash(&data[start..crc_start]);
    if stored != computed {
        return Err(TrigramError::corrupt(format!(
            "{name} CRC mismatch (stored={stored:#010x}, computed={computed:#010x})"
        )));
    }
    Ok(())
}

impl<'a> IndexView<'a> {
    /// Validate `data` and build a view over it.
    pub fn parse(data: &'a [u8]) -> Result<Self, TrigramError> {
        if data.len() < HEADER_SIZE {
            return Err(TrigramError::corrupt("file too small for header"));
        }
        let header = IndexHeader::from_bytes(data).ok_or(TrigramError::InvalidMagic)?;
        if header.version != VERSION {
            return Err(TrigramError::VersionMismatch {
                expected: VERSION,
                found: header.version,
            });
        }

        let len = data.len() as u64;
        let offsets = [
            header.root_table_offset,
            header.file_table_offset,
            header.trigram_table_offset,
            header.posting_offset,
        ];
        if header.root_table_offset != HEADER_SIZE as u64
            || offsets.iter().any(|&o| o > len)
            || offsets.windows(2).any(|w| w[0] > w[1])
        {
            return Err(TrigramError::corrupt(
                "section offset exceeds file size or offsets not ordered",
            ));
        }

        let rt = header.root_table_offset as usize;
        let ft = header.file_table_offset as usize;
        let tt = header.trigram_table_offset as usize;
        let ps = header.posting_offset as usize;
        verify_section_crc(data, rt, ft, "Root table")?;
        verify_section_crc(data, ft, tt, "File table")?;
        verify_section_crc(data, tt, ps, "Trigram table")?;
        verify_section_crc(data, ps, data.len(), "Posting section")?;

        if ft + header.file_count as usize * FILE_ENTRY_SIZE > tt
            || tt + header.trigram_count as usize * TRIGRAM_ENTRY_SIZE > ps
        {
            return Err(TrigramError::corrupt("table entry count exceeds section size"));
        }

        Ok(IndexView { data, header })
    }

    /// Rebuild a view from bytes whose header was already validated by [`IndexView::parse`].
    pub fn from_validated(data: &'a [u8], header: IndexHeader) -> Self {
        IndexView { data, header }
    }

    pub fn header(&self) -> &IndexHeader {
        &self.header
    }

    /// Number of files in the index.
    pub fn file_count(&self) -> u32 {
        self.header.file_count
    }

    /// Number of unique trigrams in the index.
    pub fn trigram_count(&self) -> u32 {
        self.header.trigram_count
    }

    /// Tree roots this index was built from.
    pub fn roots(&self) -> Result<Vec<&'a str>, TrigramError> {
        let mut off = self.header.root_table_offset as usize;
        let end = self.header.file_table_offset as usize - SECTION_CRC_SIZE;
        let mut roots = Vec::with_capacity(self.header.root_count as usize);
        for _ in 0..self.header.root_count {
            if off + 2 > end {
                return Err(TrigramError::corrupt("root table truncated"));
            }
            let len = read_u16(self.data, off) as usize;
            off += 2;
            if off + len > end {
                return Err(TrigramError::corrupt("root table truncated"));
            }
            let root = std::str::from_utf8(&self.data[off..off + len])
                .map_err(|_| TrigramError::corrupt("root is not UTF-8"))?;
            roots.push(root);
            off += len;
        }
        Ok(roots)
    }

    /// Get file path for a given file ID.
    pub fn file_path(&self, file_id: u32) -> Option<&'a str> {
        if file_id >= self.header.file_count {
            return None;
        }
        let ft = self.header.file_table_offset as usize;
        let entry = ft + file_id as usize * FILE_ENTRY_SIZE;
        // Entry layout: file_id (4) | path_offset (4) | path_len (2).
        let path_offset = read_u32(self.data, entry + 4) as usize;
        let path_len = read_u16(self.data, entry + 8) as usize;

        // Path bytes are relative to the start of the file table.
        let start = ft + path_offset;
        let section_end = self.header.trigram_table_offset as usize - SECTION_CRC_SIZE;
        if start + path_len > section_end {
            return None;
        }
        std::str::from_utf8(&self.data[start..start + path_len]).ok()
    }

    /// All file paths in id order.
    pub fn file_paths(&self) -> Result<Vec<&'a str>, TrigramError> {
        (0..self.header.file_count)
            .map(|id| {
                self.file_path(id)
                    .ok_or_else(|| TrigramError::corrupt(format!("bad file entry {id}")))
            })
            .collect()
    }

    fn trigram_entry(&self, index: usize) -> (Trigram, u64, u32) {
        let off = self.header.trigram_table_offset as usize + index * TRIGRAM_ENTRY_SIZE;
        decode_trigram_entry(&self.data[off..off + TRIGRAM_ENTRY_SIZE])
    }

    fn decode_posting(&self, offset: u64, len: u32) -> Result<PostingList, TrigramError> {
        let section_len = (self.data.len() - SECTION_CRC_SIZE) as u64 - self.header.posting_offset;
        let end = offset.checked_add(u64::from(len));
        if end.map_or(true, |end| end > section_len) {
            return Err(TrigramError::corrupt("posting list exceeds posting section"));
        }
        let start = (self.header.posting_offset + offset) as usize;
        let bytes = &self.data[start..start + len as usize];
        let bitmap = RoaringBitmap::deserialize_from(bytes)
            .map_err(|e| TrigramError::corrupt(format!("bad posting list: {e}")))?;
        Ok(PostingList::from_bitmap(bitmap))
    }

    /// Look up the posting list for a trigram using binary search.
    pub fn lookup_posting_list(&self, trigram: &Trigram) -> Result<Option<PostingList>, TrigramError> {
        let mut lo = 0usize;
        let mut hi = self.header.trigram_count as usize;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let (entry_trigram, offset, len) = self.trigram_entry(mid);
            match entry_trigram.cmp(trigram) {
                std::cmp::Ordering::Equal => return self.decode_posting(offset, len).map(Some),
                std::cmp::Ordering::Less => lo = mid + 1,
                std::cmp::Ordering::Greater => hi = mid,
            }
        }
        Ok(None)
    }

    /// Every (trigram, posting list) pair in trigram order.
    pub fn posting_lists(
        &self,
    ) -> impl Iterator<Item = Result<(Trigram, PostingList), TrigramError>> + '_ {
        (0..self.header.trigram_count as usize).map(move |i| {
            let (trigram, offset, len) = self.trigram_entry(i);
            self.decode_posting(offset, len).map(|pl| (trigram, pl))
        })
    }

    /// Candidate file ids for `query`, ascending.
    pub fn posting_query(&self, query: &TrigramQuery) -> Result<Vec<u32>, TrigramError> {
        Ok(self.execute_query(query)?.to_vec())
    }

    fn execute_query(&self, query: &TrigramQuery) -> Result<PostingList, TrigramError> {
        match query {
            TrigramQuery::All => Ok(PostingList::full(self.header.file_count)),
            TrigramQuery::And(trigrams) => {
                if trigrams.is_empty() {
                    return Ok(PostingList::full(self.header.file_count));
                }
                let mut lists = Vec::with_capacity(trigrams.len());
                for trigram in trigrams {
                    match self.lookup_posting_list(trigram)? {
                        Some(pl) => lists.push(pl),
                        // Trigram not in index → no matches.
                        None => return Ok(PostingList::new()),
                    }
                }
                Ok(intersect(&lists))
            }
            TrigramQuery::Or(sub_queries) => {
                let lists = sub_queries
                    .iter()
                    .map(|sub| self.execute_query(sub))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(union(&lists))
            }
        }
    }
}
