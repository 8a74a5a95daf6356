//! The `cindex` pipeline: collect roots, write shards, merge each one.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{CsearchError, Result};
use crate::index::ShardReader;
use crate::merge::{MergeController, MergePolicy};
use crate::paths::{collect_roots, walk_files};
use crate::shard_writer::ShardWriter;
use crate::store::TrigramShardStore;

#[derive(Debug, Clone)]
pub struct IndexOptions {
    pub master: PathBuf,
    pub shard_threshold: u64,
    /// Discard the existing index instead of merging into it.
    pub reset: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IndexSummary {
    pub roots: Vec<PathBuf>,
    pub files: u64,
    pub bytes: u64,
    pub shards: usize,
    /// True when the run deleted the master instead of writing one.
    pub removed: bool,
}

/// Roots recorded in the master, or none if there is no master yet.
pub fn list_roots(master: &Path) -> Result<Vec<String>> {
    if !master.exists() {
        debug!(master = %master.display(), "no index");
        return Ok(Vec::new());
    }
    let reader = ShardReader::open(master)?;
    Ok(reader.paths()?.into_iter().map(str::to_string).collect())
}

/// Index `args` into the master.
///
/// With no arguments the roots already recorded in the master are indexed
/// again; with no arguments and `reset` the master is removed.
pub fn run_index<P: AsRef<Path>>(args: &[P], opts: &IndexOptions) -> Result<IndexSummary> {
    let merger = MergeController::new(&opts.master);
    let mut summary = IndexSummary::default();

    if args.is_empty() && opts.reset {
        summary.removed = merger.remove_master()?;
        return Ok(summary);
    }

    let roots = if args.is_empty() {
        let recorded = list_roots(&opts.master)?;
        info!(count = recorded.len(), "re-indexing recorded roots");
        collect_roots(recorded)
    } else {
        collect_roots(args)
    };
    let root_names: Vec<String> = roots
        .iter()
        .filter_map(|root| match root.to_str() {
            Some(name) => Some(name.to_string()),
            None => {
                warn!(path = %root.display(), "dropping root that is not UTF-8");
                None
            }
        })
        .collect();
    if root_names.is_empty() {
        info!("nothing to index");
        return Ok(summary);
    }

    if let Some(parent) = opts.master.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| CsearchError::io(parent, e))?;
    }
    let reset = opts.reset || !opts.master.exists();

    let store = TrigramShardStore::new(root_names.clone());
    let mut writer = ShardWriter::new(store, &opts.master, opts.shard_threshold);
    let absorb = |shard: PathBuf, summary: &mut IndexSummary| -> Result<()> {
        let policy = match (summary.shards, reset) {
            (0, true) => MergePolicy::Replace,
            (0, false) => MergePolicy::OverrideRoots,
            _ => MergePolicy::OverridePaths,
        };
        merger.absorb(&shard, policy)?;
        summary.shards += 1;
        Ok(())
    };

    for name in &root_names {
        let root = Path::new(name);
        info!(root = %root.display(), "index");
        for file in walk_files(root) {
            if let Some(shard) = writer.add_file(&file)? {
                absorb(shard, &mut summary)?;
            }
        }
    }
    if let Some(shard) = writer.finish_session()? {
        absorb(shard, &mut summary)?;
    }

    summary.files = writer.files_added();
    summary.bytes = writer.bytes_added();
    if summary.shards == 0 && reset {
        // A reset that found nothing leaves no index behind.
        summary.removed = merger.remove_master()?;
    }
    summary.roots = root_names.into_iter().map(PathBuf::from).collect();
    info!(
        files = summary.files,
        bytes = summary.bytes,
        shards = summary.shards,
        "done"
    );
    Ok(summary)
}
