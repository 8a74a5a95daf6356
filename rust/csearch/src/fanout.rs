//! Shard search fan-out: run one shard pipeline (open, query, filter,
//! report) per index shard, either one after another or in parallel.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{CsearchError, Result};
use crate::index::ShardReader;
use crate::paths::is_skipped_name;
use crate::plan::SearchPlan;
use crate::report::Reporter;

/// Sequential and concurrent modes are exclusive; exactly one runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FanoutMode {
    /// Walk the index directory recursively and search shards in order.
    #[default]
    Sequential,
    /// Search the top-level shards of the index directory in parallel.
    Concurrent,
}

/// The shard files one search runs over.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShardSet {
    shards: Vec<PathBuf>,
}

impl ShardSet {
    /// Find shards at `location`: the file itself, or the shards in a directory.
    ///
    /// Directories, zero-byte files and hidden or temporary names (staging
    /// shards, merge temp files) inside a directory are skipped.
    pub fn discover(location: &Path, mode: FanoutMode) -> Result<Self> {
        let meta = fs::metadata(location).map_err(|e| CsearchError::io(location, e))?;
        if !meta.is_dir() {
            let shards = if meta.len() > 0 {
                vec![location.to_path_buf()]
            } else {
                Vec::new()
            };
            return Ok(ShardSet { shards });
        }

        let mut walker = WalkDir::new(location).min_depth(1).sort_by_file_name();
        if mode == FanoutMode::Concurrent {
            walker = walker.max_depth(1);
        }
        let shards = walker
            .into_iter()
            .filter_entry(|entry| !is_skipped_name(entry.file_name()))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    warn!(error = %err, "skipping unreadable index entry");
                    None
                }
            })
            .filter(|entry| {
                entry.file_type().is_file() && entry.metadata().map_or(false, |m| m.len() > 0)
            })
            .map(walkdir::DirEntry::into_path)
            .collect();
        Ok(ShardSet { shards })
    }

    pub fn from_paths(shards: Vec<PathBuf>) -> Self {
        ShardSet { shards }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.shards
    }

    pub fn len(&self) -> usize {
        self.shards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.is_empty()
    }
}

/// Search every shard and wait for all of them.
///
/// A shard that fails to open or query is logged and skipped. Returns how
/// many shards were searched successfully.
pub fn search_shards<W: Write + Send>(
    shards: &ShardSet,
    plan: &SearchPlan,
    reporter: &Reporter<W>,
    mode: FanoutMode,
) -> usize {
    let run = |shard: &PathBuf| match search_shard(shard, plan, reporter) {
        Ok(()) => true,
        Err(err) => {
            warn!(shard = %shard.display(), error = %err, "shard search failed");
            false
        }
    };
    match mode {
        FanoutMode::Sequential => shards.shards.iter().filter(|s| run(s)).count(),
        FanoutMode::Concurrent => shards.shards.par_iter().filter(|s| run(s)).count(),
    }
}

fn search_shard<W: Write + Send>(
    shard: &Path,
    plan: &SearchPlan,
    reporter: &Reporter<W>,
) -> Result<()> {
    let reader = ShardReader::open(shard)?;
    let ids = reader.posting_query(plan.query())?;
    debug!(shard = %shard.display(), candidates = ids.len(), "post query identified possible files");

    let mut accepted = 0usize;
    for id in ids {
        let Some(name) = reader.name(id) else {
            warn!(shard = %shard.display(), id, "file id without a name");
            continue;
        };
        if !plan.accepts_name(name) {
            continue;
        }
        accepted += 1;
        if let Err(err) = reporter.report_file(Path::new(name), plan.matcher()) {
            warn!(path = name, error = %err, "cannot search file");
        }
    }
    debug!(shard = %shard.display(), accepted, "file name filter applied");
    Ok(())
}
