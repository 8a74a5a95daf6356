//! Merge controller: folds finished shards into the master index.
//!
//! The master is only ever replaced by a rename, either of the shard itself
//! or of a fully written and synced temp file in the master's directory.
//! Readers see the old master or the new one, never a mix.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use csearch_core::trigram::{self, merge_indexes, write_index};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{CsearchError, Result};
use crate::index::{commit_staged, stage_bytes, ShardReader};

/// How a shard relates to the master it is absorbed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// The shard becomes the master outright (reset runs).
    Replace,
    /// Master files under the shard's roots are re-indexed by it.
    OverrideRoots,
    /// Only master files the shard also contains are replaced.
    OverridePaths,
}

/// A merge written to disk but not yet visible at the master path.
#[must_use = "a staged merge does nothing until committed"]
pub struct StagedMerge {
    shard: PathBuf,
    master: PathBuf,
    merged: Option<NamedTempFile>,
}

impl StagedMerge {
    /// Rename the result over the master and delete the consumed shard.
    pub fn commit(self) -> Result<()> {
        match self.merged {
            Some(tmp) => {
                commit_staged(tmp, &self.master)?;
                fs::remove_file(&self.shard).map_err(|e| CsearchError::io(&self.shard, e))?;
            }
            None => {
                fs::rename(&self.shard, &self.master)
                    .map_err(|e| CsearchError::io(&self.master, e))?;
            }
        }
        debug!(master = %self.master.display(), "master replaced");
        Ok(())
    }
}

pub struct MergeController {
    master: PathBuf,
}

impl MergeController {
    pub fn new(master: impl Into<PathBuf>) -> Self {
        MergeController {
            master: master.into(),
        }
    }

    pub fn master(&self) -> &Path {
        &self.master
    }

    /// Merge `shard` into the master and commit.
    pub fn absorb(&self, shard: &Path, policy: MergePolicy) -> Result<()> {
        info!(shard = %shard.display(), master = %self.master.display(), ?policy, "merge");
        self.stage(shard, policy)?.commit()
    }

    /// Prepare the merge of `shard` without touching the master.
    ///
    /// Without an existing master, or under [`MergePolicy::Replace`], the
    /// shard is renamed into place on commit.
    pub fn stage(&self, shard: &Path, policy: MergePolicy) -> Result<StagedMerge> {
        let core_policy = match policy {
            MergePolicy::Replace => None,
            MergePolicy::OverrideRoots => Some(trigram::MergePolicy::OverrideRoots),
            MergePolicy::OverridePaths => Some(trigram::MergePolicy::OverridePaths),
        };
        let merged = match core_policy {
            Some(core_policy) if self.master.exists() => {
                let newer = ShardReader::open(shard)?;
                let older = ShardReader::open(&self.master)?;
                let builder = merge_indexes(&newer.view(), &older.view(), core_policy)?;
                debug!(
                    files = builder.file_count(),
                    trigrams = builder.trigram_count(),
                    "merged index"
                );
                Some(stage_bytes(&self.master, &write_index(&builder)?)?)
            }
            _ => None,
        };
        Ok(StagedMerge {
            shard: shard.to_path_buf(),
            master: self.master.clone(),
            merged,
        })
    }

    /// Delete the master. Returns whether one existed.
    pub fn remove_master(&self) -> Result<bool> {
        match fs::remove_file(&self.master) {
            Ok(()) => {
                info!(master = %self.master.display(), "removed index");
                Ok(true)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(CsearchError::io(&self.master, err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::write_index_file;
    use csearch_core::trigram::TrigramIndexBuilder;

    fn write(path: &Path, roots: &[&str], files: &[(&str, &str)]) {
        let mut builder = TrigramIndexBuilder::new();
        for root in roots {
            builder.add_root(root);
        }
        for (name, content) in files {
            builder.add_file(name, content.as_bytes()).unwrap();
        }
        write_index_file(path, &builder).unwrap();
    }

    fn names(path: &Path) -> Vec<String> {
        let reader = ShardReader::open(path).unwrap();
        (0..reader.file_count())
            .map(|id| reader.name(id).unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_absorb_without_master_renames() {
        let dir = tempfile::tempdir().unwrap();
        let master = dir.path().join("master.idx");
        let shard = dir.path().join("master.idx.shard0~");
        write(&shard, &["/a"], &[("/a/x", "xxx")]);

        MergeController::new(&master)
            .absorb(&shard, MergePolicy::OverrideRoots)
            .unwrap();
        assert!(!shard.exists());
        assert_eq!(names(&master), vec!["/a/x"]);
    }

    #[test]
    fn test_replace_discards_old_master() {
        let dir = tempfile::tempdir().unwrap();
        let master = dir.path().join("master.idx");
        let shard = dir.path().join("master.idx.shard0~");
        write(&master, &["/old"], &[("/old/f", "old")]);
        write(&shard, &["/new"], &[("/new/f", "new")]);

        MergeController::new(&master)
            .absorb(&shard, MergePolicy::Replace)
            .unwrap();
        assert_eq!(names(&master), vec!["/new/f"]);
    }

    #[test]
    fn test_absorb_merges_and_removes_shard() {
        let dir = tempfile::tempdir().unwrap();
        let master = dir.path().join("master.idx");
        let shard = dir.path().join("master.idx.shard0~");
        write(&master, &["/a"], &[("/a/one", "111")]);
        write(&shard, &["/b"], &[("/b/two", "222")]);

        MergeController::new(&master)
            .absorb(&shard, MergePolicy::OverrideRoots)
            .unwrap();
        assert!(!shard.exists());
        assert_eq!(names(&master), vec!["/a/one", "/b/two"]);
        assert_eq!(
            ShardReader::open(&master).unwrap().paths().unwrap(),
            vec!["/a", "/b"]
        );
        // Only the master is left behind.
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_uncommitted_merge_leaves_master_intact() {
        let dir = tempfile::tempdir().unwrap();
        let master = dir.path().join("master.idx");
        let shard = dir.path().join("master.idx.shard0~");
        write(&master, &["/a"], &[("/a/one", "111")]);
        write(&shard, &["/b"], &[("/b/two", "222")]);
        let before = fs::read(&master).unwrap();

        let staged = MergeController::new(&master)
            .stage(&shard, MergePolicy::OverrideRoots)
            .unwrap();
        // Simulated crash: the staged result is never committed.
        drop(staged);

        assert_eq!(fs::read(&master).unwrap(), before);
        assert!(shard.exists());
    }

    #[test]
    fn test_corrupt_master_fails_merge_and_keeps_master() {
        let dir = tempfile::tempdir().unwrap();
        let master = dir.path().join("master.idx");
        let shard = dir.path().join("master.idx.shard0~");
        fs::write(&master, b"definitely not an index").unwrap();
        write(&shard, &["/b"], &[("/b/two", "222")]);

        let result = MergeController::new(&master).absorb(&shard, MergePolicy::OverridePaths);
        assert!(result.is_err());
        assert_eq!(fs::read(&master).unwrap(), b"definitely not an index");
    }

    #[test]
    fn test_remove_master() {
        let dir = tempfile::tempdir().unwrap();
        let master = dir.path().join("master.idx");
        let merger = MergeController::new(&master);
        assert!(!merger.remove_master().unwrap());
        write(&master, &[], &[]);
        assert!(merger.remove_master().unwrap());
        assert!(!master.exists());
    }
}
