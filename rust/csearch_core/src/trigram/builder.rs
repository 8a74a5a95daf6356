//! Trigram index builder: accumulates roots, files and their trigrams.

use std::collections::BTreeSet;

use ahash::AHashMap;
use roaring::RoaringBitmap;

use super::error::TrigramError;
use super::extract::{extract_lowercase_trigrams, extract_trigrams, is_binary, Trigram};

/// Maximum content size for indexing (1 GB).
pub const MAX_INDEX_FILE_SIZE: usize = 1024 * 1024 * 1024;

/// Entry for a file in the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub file_id: u32,
    pub path: String,
}

/// Builder for constructing a trigram index in memory.
///
/// Accumulates the indexed roots, files and their trigrams, then serializes
/// to the binary format via `writer::write_index()`.
#[derive(Debug, Default)]
pub struct TrigramIndexBuilder {
    /// Tree roots this index covers, kept sorted and unique.
    roots: BTreeSet<String>,
    /// Registered files in insertion order; `file_id` is the position.
    files: Vec<FileEntry>,
    /// Trigram → set of file IDs containing this trigram.
    posting_lists: AHashMap<Trigram, RoaringBitmap>,
}

impl TrigramIndexBuilder {
    /// Create a new empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a tree root covered by this index.
    pub fn add_root(&mut self, root: &str) {
        self.roots.insert(root.to_string());
    }

    /// Add a file to the index.
    ///
    /// Returns the assigned file id, or `None` when the file was skipped
    /// because it is binary or larger than [`MAX_INDEX_FILE_SIZE`].
    pub fn add_file(&mut self, path: &str, content: &[u8]) -> Result<Option<u32>, TrigramError> {
        if content.len() > MAX_INDEX_FILE_SIZE || is_binary(content) {
            return Ok(None);
        }

        let file_id = self.register_file(path)?;

        // Empty files have no trigrams but are still registered.
        if content.len() < 3 {
            return Ok(Some(file_id));
        }

        for trigram in extract_trigrams(content) {
            self.posting_lists.entry(trigram).or_default().insert(file_id);
        }
        // Lowercased trigrams serve case-insensitive queries.
        for trigram in extract_lowercase_trigrams(content) {
            self.posting_lists.entry(trigram).or_default().insert(file_id);
        }

        Ok(Some(file_id))
    }

    /// Register a file without touching posting lists.
    pub(crate) fn register_file(&mut self, path: &str) -> Result<u32, TrigramError> {
        let file_id = u32::try_from(self.files.len())
            .map_err(|_| TrigramError::TooManyFiles { max: u32::MAX })?;
        self.files.push(FileEntry {
            file_id,
            path: path.to_string(),
        });
        Ok(file_id)
    }

    /// OR `ids` into the posting list of `trigram`.
    pub(crate) fn union_posting(&mut self, trigram: Trigram, ids: &RoaringBitmap) {
        if ids.is_empty() {
            return;
        }
        *self.posting_lists.entry(trigram).or_default() |= ids;
    }

    /// Number of files in the index.
    pub fn file_count(&self) -> u32 {
        self.files.len() as u32
    }

    /// Number of unique trigrams in the index.
    pub fn trigram_count(&self) -> u32 {
        self.posting_lists.len() as u32
    }

    /// Indexed roots in sorted order.
    pub fn roots(&self) -> impl Iterator<Item = &str> {
        self.roots.iter().map(String::as_str)
    }

    /// Number of indexed roots.
    pub fn root_count(&self) -> u32 {
        self.roots.len() as u32
    }

    /// Get the file entries (for serialization).
    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }

    /// Posting lists sorted by trigram bytes, as the on-disk table needs them.
    pub fn sorted_posting_lists(&self) -> Vec<(Trigram, &RoaringBitmap)> {
        let mut entries: Vec<(Trigram, &RoaringBitmap)> =
            self.posting_lists.iter().map(|(k, v)| (*k, v)).collect();
        entries.sort_by_key(|(trigram, _)| *trigram);
        entries
    }
}
