//! On-disk index files: mmap reader and durable, atomic writes.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use csearch_core::trigram::format::{IndexHeader, HEADER_SIZE};
use csearch_core::trigram::{write_index, IndexView, TrigramError, TrigramIndexBuilder, TrigramQuery};
use memmap2::Mmap;
use tempfile::NamedTempFile;

use crate::error::{CsearchError, Result};

/// Memory-mapped index shard.
///
/// Validated once on open; `Send + Sync` since the mapping is read-only.
pub struct ShardReader {
    path: PathBuf,
    mmap: Mmap,
    header: IndexHeader,
}

impl ShardReader {
    /// Open and validate an index file.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => CsearchError::Index(TrigramError::IndexNotFound(path.to_path_buf())),
            _ => CsearchError::io(path, err),
        })?;
        let len = file.metadata().map_err(|e| CsearchError::io(path, e))?.len();
        if len < HEADER_SIZE as u64 {
            return Err(TrigramError::CorruptIndex {
                reason: format!("{}: file too small for header", path.display()),
            }
            .into());
        }

        // SAFETY: Read-only mmap.
        let mmap = unsafe { Mmap::map(&file) }.map_err(|e| CsearchError::io(path, e))?;
        let header = IndexView::parse(&mmap)?.header().clone();
        Ok(ShardReader {
            path: path.to_path_buf(),
            mmap,
            header,
        })
    }

    pub fn view(&self) -> IndexView<'_> {
        IndexView::from_validated(&self.mmap, self.header.clone())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Candidate file ids for `query`, ascending.
    pub fn posting_query(&self, query: &TrigramQuery) -> Result<Vec<u32>> {
        Ok(self.view().posting_query(query)?)
    }

    /// Indexed name of file `id`.
    pub fn name(&self, id: u32) -> Option<&str> {
        self.view().file_path(id)
    }

    /// Roots this index was built from.
    pub fn paths(&self) -> Result<Vec<&str>> {
        Ok(self.view().roots()?)
    }

    pub fn file_count(&self) -> u32 {
        self.header.file_count
    }
}

/// Write `bytes` to a temp file next to `target` and fsync it.
///
/// Nothing at `target` changes until [`commit_staged`]; dropping the temp
/// file instead removes it.
pub(crate) fn stage_bytes(target: &Path, bytes: &[u8]) -> Result<NamedTempFile> {
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    // Leading '.' and trailing '~' keep strays out of shard discovery.
    let mut tmp = tempfile::Builder::new()
        .prefix(".csearch-")
        .suffix("~")
        .tempfile_in(dir)
        .map_err(|e| CsearchError::io(dir, e))?;
    tmp.write_all(bytes).map_err(|e| CsearchError::io(tmp.path(), e))?;
    tmp.as_file()
        .sync_all()
        .map_err(|e| CsearchError::io(tmp.path(), e))?;
    Ok(tmp)
}

/// Atomically rename a staged temp file over `target`.
pub(crate) fn commit_staged(tmp: NamedTempFile, target: &Path) -> Result<()> {
    tmp.persist(target)
        .map_err(|e| CsearchError::io(target, e.error))?;
    Ok(())
}

/// Serialize `builder` and atomically replace `target` with it.
pub fn write_index_file(target: &Path, builder: &TrigramIndexBuilder) -> Result<()> {
    let bytes = write_index(builder)?;
    let tmp = stage_bytes(target, &bytes)?;
    commit_staged(tmp, target)
}
