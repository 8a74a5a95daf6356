//! The seam between the shard writer and the index engine.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use csearch_core::trigram::TrigramIndexBuilder;
use tracing::debug;

use crate::error::{CsearchError, Result};
use crate::index::write_index_file;

/// Storage for one open shard at a time.
pub trait ShardStore {
    /// Open a new, empty shard that will be written to `target`.
    fn create(&mut self, target: &Path) -> Result<()>;

    /// Index one file into the open shard, returning the bytes consumed.
    fn add_file(&mut self, path: &Path) -> io::Result<u64>;

    /// Persist the open shard and close it.
    fn flush(&mut self) -> Result<()>;
}

/// [`ShardStore`] backed by [`TrigramIndexBuilder`].
///
/// Every shard records the run's roots, so any shard merged into the
/// master carries them along.
#[derive(Debug, Default)]
pub struct TrigramShardStore {
    roots: Vec<String>,
    open: Option<(PathBuf, TrigramIndexBuilder)>,
}

impl TrigramShardStore {
    pub fn new(roots: Vec<String>) -> Self {
        TrigramShardStore { roots, open: None }
    }
}

impl ShardStore for TrigramShardStore {
    fn create(&mut self, target: &Path) -> Result<()> {
        // Claim the name now so an unwritable location fails before any work.
        File::create(target).map_err(|e| CsearchError::io(target, e))?;
        let mut builder = TrigramIndexBuilder::new();
        for root in &self.roots {
            builder.add_root(root);
        }
        self.open = Some((target.to_path_buf(), builder));
        Ok(())
    }

    fn add_file(&mut self, path: &Path) -> io::Result<u64> {
        let Some((_, builder)) = self.open.as_mut() else {
            return Err(io::Error::other("no shard open"));
        };
        let name = path
            .to_str()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "path is not UTF-8"))?;
        let content = fs::read(path)?;
        if builder.add_file(name, &content).map_err(io::Error::other)?.is_none() {
            debug!(path = %path.display(), "skipped binary or oversized file");
        }
        Ok(content.len() as u64)
    }

    fn flush(&mut self) -> Result<()> {
        let Some((target, builder)) = self.open.take() else {
            return Ok(());
        };
        debug!(
            shard = %target.display(),
            files = builder.file_count(),
            trigrams = builder.trigram_count(),
            "flushing shard"
        );
        write_index_file(&target, &builder)
    }
}
